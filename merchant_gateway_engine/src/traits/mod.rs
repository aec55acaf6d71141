//! # Backend contracts
//!
//! The gateway orchestration code never talks to a storage engine directly. Instead, it depends on the traits in this
//! module, and a backend is picked when the [`crate::GatewayApi`] is constructed.
//!
//! * [`GatewayStore`] looks up gateway definitions by id or name.
//! * [`KeychainAllocator`] hands out the per-gateway keychain ids. Allocations must be atomic at the storage layer.
//! * [`GatewayBackend`] is the union of the two. The config file store and the SQLite database both implement it.
//! * [`OrderManagement`] is the order factory and order persistence collaborator.
//! * [`CallbackClient`] performs the outbound HTTP request for a callback.
mod callback_client;
mod gateway_store;
mod keychain_allocator;
mod order_management;

pub use callback_client::{CallbackClient, CallbackClientError};
pub use gateway_store::{GatewayStore, GatewayStoreError};
pub use keychain_allocator::{KeychainAllocator, KeychainError};
pub use order_management::{OrderManagement, OrderManagementError};

/// Everything the gateway orchestration needs from a storage backend.
pub trait GatewayBackend: GatewayStore + KeychainAllocator {}

impl<T> GatewayBackend for T where T: GatewayStore + KeychainAllocator {}
