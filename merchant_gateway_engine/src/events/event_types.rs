use serde::Serialize;

use crate::db_types::{Gateway, Order};

/// Published whenever the external order state machine reports a status transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderStatusChangedEvent {
    pub gateway: Gateway,
    pub order: Order,
}

impl OrderStatusChangedEvent {
    pub fn new(gateway: Gateway, order: Order) -> Self {
        Self { gateway, order }
    }
}
