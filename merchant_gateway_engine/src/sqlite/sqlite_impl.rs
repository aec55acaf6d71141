//! `SqliteDatabase` is the database-backed gateway store, keychain allocator and order factory.
//!
//! It implements [`GatewayStore`], [`KeychainAllocator`] and [`OrderManagement`], so a single instance can serve as
//! both halves of a [`crate::GatewayApi`].
use std::fmt::Debug;

use log::*;
use sqlx::{migrate, SqlitePool};

use super::db::{db_url, gateways, new_pool, orders};
use crate::{
    db_types::{CallbackResponse, Gateway, NewGateway, NewOrder, Order, OrderId, OrderStatus},
    traits::{
        GatewayStore,
        GatewayStoreError,
        KeychainAllocator,
        KeychainError,
        OrderManagement,
        OrderManagementError,
    },
};

/// The order classes this factory knows how to build.
pub const SUPPORTED_ORDER_CLASSES: [&str; 1] = ["Order"];

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using `MPG_DATABASE_URL` or the default database location.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Registers a new gateway. Its keychain counter starts at zero.
    pub async fn create_gateway(&self, gateway: NewGateway) -> Result<Gateway, GatewayStoreError> {
        if gateway.confirmations_required < 0 {
            return Err(GatewayStoreError::ConfigurationError(format!(
                "Gateway '{}' requires a negative number of confirmations",
                gateway.name
            )));
        }
        let mut conn = self.pool.acquire().await?;
        let gateway = gateways::insert_gateway(gateway, &mut conn).await?;
        info!("🗃️ Gateway '{}' registered with id {}", gateway.name, gateway.id);
        Ok(gateway)
    }
}

impl GatewayStore for SqliteDatabase {
    async fn find_by_id(&self, id: i64) -> Result<Gateway, GatewayStoreError> {
        let mut conn = self.pool.acquire().await?;
        gateways::fetch_gateway_by_id(id, &mut conn).await?.ok_or(GatewayStoreError::GatewayNotFound(id))
    }

    async fn find_by_name(&self, name: &str) -> Result<Gateway, GatewayStoreError> {
        let mut conn = self.pool.acquire().await?;
        gateways::fetch_gateway_by_name(name, &mut conn)
            .await?
            .ok_or_else(|| GatewayStoreError::GatewayNameNotFound(name.to_string()))
    }

    async fn fetch_gateways(&self) -> Result<Vec<Gateway>, GatewayStoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = gateways::fetch_gateways(&mut conn).await?;
        Ok(result)
    }
}

impl KeychainAllocator for SqliteDatabase {
    async fn current_id(&self, gateway: &Gateway) -> Result<i64, KeychainError> {
        let mut conn = self.pool.acquire().await?;
        gateways::current_keychain_id(gateway, &mut conn).await
    }

    async fn next_id(&self, gateway: &Gateway) -> Result<i64, KeychainError> {
        let mut conn = self.pool.acquire().await?;
        gateways::increment_keychain_id(gateway, &mut conn).await
    }
}

impl OrderManagement for SqliteDatabase {
    async fn create_order(&self, gateway: &Gateway, order: NewOrder) -> Result<Order, OrderManagementError> {
        if !SUPPORTED_ORDER_CLASSES.iter().any(|c| c.eq_ignore_ascii_case(gateway.order_class.as_str())) {
            return Err(OrderManagementError::UnsupportedOrderClass(gateway.order_class.clone()));
        }
        let mut conn = self.pool.acquire().await?;
        orders::insert_order(order, &mut conn).await
    }

    async fn fetch_order(&self, gateway_id: i64, order_id: &OrderId) -> Result<Option<Order>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(gateway_id, order_id, &mut conn).await?;
        Ok(order)
    }

    async fn update_order_status(
        &self,
        gateway_id: i64,
        order_id: &OrderId,
        status: OrderStatus,
        tid: Option<String>,
    ) -> Result<Order, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        orders::update_order_status(gateway_id, order_id, status, tid, &mut conn)
            .await?
            .ok_or_else(|| OrderManagementError::OrderNotFound(order_id.clone()))
    }

    async fn save_callback_response(
        &self,
        order: &Order,
        response: &CallbackResponse,
    ) -> Result<(), OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        if orders::update_callback_response(order, response, &mut conn).await? {
            trace!("🗃️ Callback response {} saved for order [{}]", response.code, order.id);
            Ok(())
        } else {
            Err(OrderManagementError::OrderNotFound(order.id.clone()))
        }
    }
}
