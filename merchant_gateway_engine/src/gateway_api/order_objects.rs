use serde::{Deserialize, Serialize};

use crate::db_types::Satoshis;

/// An inbound order-creation request, as submitted by the merchant's shop front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub amount: Satoshis,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
}

impl CreateOrderRequest {
    pub fn new(amount: i64) -> Self {
        Self { amount: Satoshis::from(amount), signature: None, id: None, data: None }
    }

    pub fn with_id<S: Into<String>>(mut self, id: S) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_signature<S: Into<String>>(mut self, signature: S) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn with_data<S: Into<String>>(mut self, data: S) -> Self {
        self.data = Some(data.into());
        self
    }
}

/// The body of a status transition report from the blockchain monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: String,
    #[serde(default)]
    pub tid: Option<String>,
}
