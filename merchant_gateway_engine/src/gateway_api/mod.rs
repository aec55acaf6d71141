//! # Merchant gateway public API
//!
//! * [`GatewayApi`] authorises order requests against the gateway's signature policy, allocates keychain ids, hands
//!   new orders to the order factory and announces status changes.
//! * [`CallbackDispatcher`] delivers those status changes to the merchant's callback URL.
//!
//! Both are generic over the backend traits in [`crate::traits`], so the gateway definitions can come from a config
//! file or the database without any change to the code that uses them:
//!
//! ```rust,ignore
//! use merchant_gateway_engine::{events::EventProducers, CreateOrderRequest, GatewayApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/merchant_gateway.db", 5).await?;
//! // SqliteDatabase is both a GatewayBackend and an OrderManagement implementation
//! let api = GatewayApi::new(db.clone(), db, EventProducers::default());
//! let order = api.create_order(1, CreateOrderRequest::new(1500).with_id("1").with_signature(sig)).await?;
//! ```
mod api;
mod callbacks;
mod errors;
mod http_client;
mod order_objects;

pub use api::{authorize_order_request, GatewayApi};
pub use callbacks::{
    build_callback_url,
    CallbackDispatcher,
    CallbackOutcome,
    RetryPolicy,
    DEFAULT_MAX_RETRIES,
    DEFAULT_RETRY_DELAY,
};
pub use errors::GatewayError;
pub use http_client::{ReqwestCallbackClient, DEFAULT_CALLBACK_TIMEOUT};
pub use order_objects::{CreateOrderRequest, OrderStatusUpdate};
