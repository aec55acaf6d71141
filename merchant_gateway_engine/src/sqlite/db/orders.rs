use log::{debug, trace};
use sqlx::{sqlite::SqliteRow, FromRow, Row, SqliteConnection};

use crate::{
    db_types::{CallbackResponse, NewOrder, Order, OrderId, OrderStatus, Satoshis},
    traits::OrderManagementError,
};

impl FromRow<'_, SqliteRow> for Order {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let status: i64 = row.try_get("status")?;
        let status = OrderStatus::try_from(status).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let callback_response: Option<String> = row.try_get("callback_response")?;
        let callback_response = callback_response
            .map(|s| serde_json::from_str::<CallbackResponse>(&s))
            .transpose()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let order_id: String = row.try_get("order_id")?;
        let amount: i64 = row.try_get("amount")?;
        Ok(Self {
            gateway_id: row.try_get("gateway_id")?,
            id: OrderId::from(order_id),
            amount: Satoshis::from(amount),
            keychain_id: row.try_get("keychain_id")?,
            data: row.try_get("data")?,
            status,
            tid: row.try_get("tid")?,
            address: row.try_get("address")?,
            callback_response,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Inserts a new order. Orders are unique per gateway, both by order id and by keychain id.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderManagementError> {
    let order_id = order.id.clone();
    let result = sqlx::query_as(
        r#"
            INSERT INTO orders (
                gateway_id,
                order_id,
                amount,
                keychain_id,
                data
            ) VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(order.gateway_id)
    .bind(order.id.as_str())
    .bind(order.amount.value())
    .bind(order.keychain_id)
    .bind(order.data)
    .fetch_one(conn)
    .await;
    match result {
        Ok(order) => {
            let order: Order = order;
            debug!("📝️ Order [{}] inserted for gateway #{} at keychain id {}", order.id, order.gateway_id, order.keychain_id);
            Ok(order)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            if e.message().contains("keychain_id") {
                Err(OrderManagementError::InvalidRecord(format!("Keychain id for order {order_id} is already in use")))
            } else {
                Err(OrderManagementError::OrderAlreadyExists(order_id))
            }
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_order(
    gateway_id: i64,
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE gateway_id = $1 AND order_id = $2")
        .bind(gateway_id)
        .bind(order_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Sets the order status. A `None` transaction id leaves the stored one in place.
pub async fn update_order_status(
    gateway_id: i64,
    order_id: &OrderId,
    status: OrderStatus,
    tid: Option<String>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        "UPDATE orders SET status = $1, tid = COALESCE($2, tid), updated_at = CURRENT_TIMESTAMP WHERE gateway_id = $3 \
         AND order_id = $4 RETURNING *",
    )
    .bind(status.code())
    .bind(tid)
    .bind(gateway_id)
    .bind(order_id.as_str())
    .fetch_optional(conn)
    .await?;
    trace!("📝️ Order [{order_id}] status set to {status}");
    Ok(order)
}

/// Overwrites the stored callback response. Returns `false` if the order does not exist.
pub async fn update_callback_response(
    order: &Order,
    response: &CallbackResponse,
    conn: &mut SqliteConnection,
) -> Result<bool, OrderManagementError> {
    let json = serde_json::to_string(response).map_err(|e| OrderManagementError::InvalidRecord(e.to_string()))?;
    let result = sqlx::query(
        "UPDATE orders SET callback_response = $1, updated_at = CURRENT_TIMESTAMP WHERE gateway_id = $2 AND order_id \
         = $3",
    )
    .bind(json)
    .bind(order.gateway_id)
    .bind(order.id.as_str())
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}
