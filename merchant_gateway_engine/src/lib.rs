//! Merchant Gateway Engine
//!
//! The engine is the authorisation and notification core of the merchant payment gateway. It
//! 1. authenticates inbound order requests against each gateway's HMAC signature policy,
//! 2. hands out a gap-free, strictly increasing keychain id per gateway, from which the receiving address for each
//!    order is derived elsewhere, and
//! 3. notifies the merchant's callback URL of order status changes, retrying failed deliveries a fixed number of times.
//!
//! Gateway definitions and keychain counters live in one of two interchangeable backends (see [`mod@traits`]):
//! * [`ConfigGatewayStore`] reads the gateways from a TOML file at start-up and keeps one counter file per gateway,
//!   via [`FileKeychainAllocator`].
//! * [`SqliteDatabase`] keeps both in the `gateways` table.
//!
//! The public API lives in [`mod@gateway_api`]. Status changes are announced through the pub-sub machinery in
//! [`mod@events`], which is where the [`CallbackDispatcher`] is normally hooked in.
mod config_store;
mod gateway_api;
mod keychain;

pub mod db_types;
pub mod events;
pub mod helpers;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use config_store::ConfigGatewayStore;
pub use gateway_api::{
    authorize_order_request,
    build_callback_url,
    CallbackDispatcher,
    CallbackOutcome,
    CreateOrderRequest,
    GatewayApi,
    GatewayError,
    OrderStatusUpdate,
    ReqwestCallbackClient,
    RetryPolicy,
    DEFAULT_CALLBACK_TIMEOUT,
    DEFAULT_MAX_RETRIES,
    DEFAULT_RETRY_DELAY,
};
pub use keychain::FileKeychainAllocator;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    CallbackClient,
    CallbackClientError,
    GatewayBackend,
    GatewayStore,
    GatewayStoreError,
    KeychainAllocator,
    KeychainError,
    OrderManagement,
    OrderManagementError,
};
