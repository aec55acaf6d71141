//! SQLite storage for gateways, keychain counters and orders.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::{SqliteDatabase, SUPPORTED_ORDER_CLASSES};
