use thiserror::Error;

use crate::db_types::{CallbackResponse, Gateway, NewOrder, Order, OrderId, OrderStatus};

#[derive(Debug, Clone, Error)]
pub enum OrderManagementError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} already exists")]
    OrderAlreadyExists(OrderId),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Stored order is invalid. {0}")]
    InvalidRecord(String),
    #[error("This order factory cannot build orders of class '{0}'")]
    UnsupportedOrderClass(String),
}

impl From<sqlx::Error> for OrderManagementError {
    fn from(e: sqlx::Error) -> Self {
        OrderManagementError::DatabaseError(e.to_string())
    }
}

/// The order factory and order persistence collaborator.
///
/// The gateway core only ever touches a narrow slice of an order: it creates it, reads it back to build callbacks, and
/// records the outcome of the most recent callback.
#[allow(async_fn_in_trait)]
pub trait OrderManagement: Clone {
    /// Builds and persists a concrete order for `gateway`. `gateway.order_class` selects the kind of order.
    async fn create_order(&self, gateway: &Gateway, order: NewOrder) -> Result<Order, OrderManagementError>;

    async fn fetch_order(&self, gateway_id: i64, order_id: &OrderId) -> Result<Option<Order>, OrderManagementError>;

    /// Records a status transition reported by the blockchain monitor. Returns the updated order.
    async fn update_order_status(
        &self,
        gateway_id: i64,
        order_id: &OrderId,
        status: OrderStatus,
        tid: Option<String>,
    ) -> Result<Order, OrderManagementError>;

    /// Overwrites the order's last recorded callback response.
    async fn save_callback_response(
        &self,
        order: &Order,
        response: &CallbackResponse,
    ) -> Result<(), OrderManagementError>;
}
