use log::{debug, trace};
use mpg_common::Secret;
use sqlx::{sqlite::SqliteRow, FromRow, Row, SqliteConnection};

use crate::{
    db_types::{Gateway, NewGateway},
    traits::{GatewayStoreError, KeychainError},
};

impl FromRow<'_, SqliteRow> for Gateway {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let secret: Option<String> = row.try_get("secret")?;
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            pubkey: row.try_get("pubkey")?,
            confirmations_required: row.try_get("confirmations_required")?,
            order_class: row.try_get("order_class")?,
            secret: secret.map(Secret::new),
            check_signature: row.try_get("check_signature")?,
            check_signature_callback: row.try_get("check_signature_callback")?,
            callback_url: row.try_get("callback_url")?,
            test_mode: row.try_get("test_mode")?,
            last_keychain_id: row.try_get("last_keychain_id")?,
        })
    }
}

pub async fn insert_gateway(gateway: NewGateway, conn: &mut SqliteConnection) -> Result<Gateway, GatewayStoreError> {
    let name = gateway.name.clone();
    let result = sqlx::query_as(
        r#"
            INSERT INTO gateways (
                name,
                pubkey,
                confirmations_required,
                order_class,
                secret,
                check_signature,
                check_signature_callback,
                callback_url,
                test_mode
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *;
        "#,
    )
    .bind(gateway.name)
    .bind(gateway.pubkey)
    .bind(gateway.confirmations_required)
    .bind(gateway.order_class)
    .bind(gateway.secret.map(|s| s.reveal().clone()))
    .bind(gateway.check_signature)
    .bind(gateway.check_signature_callback)
    .bind(gateway.callback_url)
    .bind(gateway.test_mode)
    .fetch_one(conn)
    .await;
    match result {
        Ok(gateway) => {
            let gateway: Gateway = gateway;
            debug!("🗃️ Gateway '{}' created with id {}", gateway.name, gateway.id);
            Ok(gateway)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(GatewayStoreError::DuplicateGateway(name)),
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_gateway_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Gateway>, sqlx::Error> {
    let gateway = sqlx::query_as("SELECT * FROM gateways WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(gateway)
}

pub async fn fetch_gateway_by_name(name: &str, conn: &mut SqliteConnection) -> Result<Option<Gateway>, sqlx::Error> {
    let gateway = sqlx::query_as("SELECT * FROM gateways WHERE name = $1").bind(name).fetch_optional(conn).await?;
    Ok(gateway)
}

pub async fn fetch_gateways(conn: &mut SqliteConnection) -> Result<Vec<Gateway>, sqlx::Error> {
    let gateways = sqlx::query_as("SELECT * FROM gateways ORDER BY id").fetch_all(conn).await?;
    Ok(gateways)
}

/// The gateway's counter, looked up the same way as [`increment_keychain_id`]: by id, then by name.
pub async fn current_keychain_id(gateway: &Gateway, conn: &mut SqliteConnection) -> Result<i64, KeychainError> {
    let by_id: Option<i64> = sqlx::query_scalar("SELECT last_keychain_id FROM gateways WHERE id = $1")
        .bind(gateway.id)
        .fetch_optional(&mut *conn)
        .await?;
    if let Some(id) = by_id {
        return Ok(id);
    }
    let by_name: Option<i64> = sqlx::query_scalar("SELECT last_keychain_id FROM gateways WHERE name = $1")
        .bind(gateway.name.as_str())
        .fetch_optional(conn)
        .await?;
    by_name.ok_or(KeychainError::GatewayNotFound(gateway.id))
}

/// Increments the gateway's counter in a single statement and returns its value from before the increment.
///
/// SQLite evaluates `RETURNING` against the updated row, hence the `- 1`. If no row has the gateway's id (a record
/// that was built by hand, say), the unique name is tried instead.
pub async fn increment_keychain_id(gateway: &Gateway, conn: &mut SqliteConnection) -> Result<i64, KeychainError> {
    let by_id: Option<i64> = sqlx::query_scalar(
        "UPDATE gateways SET last_keychain_id = last_keychain_id + 1, updated_at = CURRENT_TIMESTAMP WHERE id = $1 \
         RETURNING last_keychain_id - 1",
    )
    .bind(gateway.id)
    .fetch_optional(&mut *conn)
    .await?;
    if let Some(id) = by_id {
        trace!("🗃️ Gateway #{} allocated keychain id {id}", gateway.id);
        return Ok(id);
    }
    let by_name: Option<i64> = sqlx::query_scalar(
        "UPDATE gateways SET last_keychain_id = last_keychain_id + 1, updated_at = CURRENT_TIMESTAMP WHERE name = $1 \
         RETURNING last_keychain_id - 1",
    )
    .bind(gateway.name.as_str())
    .fetch_optional(conn)
    .await?;
    match by_name {
        Some(id) => {
            trace!("🗃️ Gateway '{}' allocated keychain id {id}", gateway.name);
            Ok(id)
        },
        None => Err(KeychainError::GatewayNotFound(gateway.id)),
    }
}
