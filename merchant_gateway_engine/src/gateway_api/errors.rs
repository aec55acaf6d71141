use thiserror::Error;

use crate::{
    db_types::{OrderId, Satoshis},
    traits::{GatewayStoreError, KeychainError, OrderManagementError},
};

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("The order id is missing or empty")]
    InvalidOrderId,
    #[error("The order signature is invalid")]
    InvalidSignature,
    #[error("Order amounts cannot be negative. Got {0}")]
    InvalidAmount(Satoshis),
    #[error("Gateway {0} does not exist")]
    GatewayNotFound(i64),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Gateway store error. {0}")]
    StoreError(GatewayStoreError),
    #[error("Keychain allocation failed. {0}")]
    KeychainError(#[from] KeychainError),
    #[error("Order management error. {0}")]
    OrderError(OrderManagementError),
}

impl GatewayError {
    /// Errors the caller caused by sending a bad request, as opposed to lookups that failed or backend trouble.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::InvalidOrderId | Self::InvalidSignature | Self::InvalidAmount(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::GatewayNotFound(_) | Self::OrderNotFound(_))
    }
}

impl From<GatewayStoreError> for GatewayError {
    fn from(e: GatewayStoreError) -> Self {
        match e {
            GatewayStoreError::GatewayNotFound(id) => Self::GatewayNotFound(id),
            GatewayStoreError::KeychainError(e) => Self::KeychainError(e),
            e => Self::StoreError(e),
        }
    }
}

impl From<OrderManagementError> for GatewayError {
    fn from(e: OrderManagementError) -> Self {
        match e {
            OrderManagementError::OrderNotFound(id) => Self::OrderNotFound(id),
            e => Self::OrderError(e),
        }
    }
}
