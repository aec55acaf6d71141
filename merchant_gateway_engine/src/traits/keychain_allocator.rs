use thiserror::Error;

use crate::db_types::Gateway;

#[derive(Debug, Clone, Error)]
pub enum KeychainError {
    #[error("Could not access the keychain counter for '{name}'. {reason}")]
    IoError { name: String, reason: String },
    #[error("The keychain counter for '{name}' is corrupt. Found '{value}'")]
    CorruptCounter { name: String, value: String },
    #[error("'{0}' cannot be used as a keychain counter name")]
    InvalidName(String),
    #[error("Gateway {0} has no keychain counter")]
    GatewayNotFound(i64),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for KeychainError {
    fn from(e: sqlx::Error) -> Self {
        KeychainError::DatabaseError(e.to_string())
    }
}

/// A durable, gap-free counter per gateway.
///
/// The stored counter is always the *next* id to hand out. A fresh gateway starts at zero.
#[allow(async_fn_in_trait)]
pub trait KeychainAllocator: Clone {
    /// The value the next call to [`Self::next_id`] will return.
    async fn current_id(&self, gateway: &Gateway) -> Result<i64, KeychainError>;

    /// Atomically increments the stored counter and returns its value from *before* the increment.
    ///
    /// Concurrent calls for the same gateway never return the same id.
    async fn next_id(&self, gateway: &Gateway) -> Result<i64, KeychainError>;
}
