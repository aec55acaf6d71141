use thiserror::Error;

use crate::{db_types::Gateway, traits::KeychainError};

#[derive(Debug, Clone, Error)]
pub enum GatewayStoreError {
    #[error("Gateway {0} does not exist")]
    GatewayNotFound(i64),
    #[error("There is no gateway named '{0}'")]
    GatewayNameNotFound(String),
    #[error("A gateway named '{0}' already exists")]
    DuplicateGateway(String),
    #[error("Invalid gateway configuration. {0}")]
    ConfigurationError(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Could not read the keychain counter. {0}")]
    KeychainError(#[from] KeychainError),
}

impl GatewayStoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::GatewayNotFound(_) | Self::GatewayNameNotFound(_))
    }
}

impl From<sqlx::Error> for GatewayStoreError {
    fn from(e: sqlx::Error) -> Self {
        GatewayStoreError::DatabaseError(e.to_string())
    }
}

/// Read access to gateway definitions.
///
/// Implementations must return identical field values for equivalent definitions, including `last_keychain_id`, so
/// that callers never need to know which backend is in use.
#[allow(async_fn_in_trait)]
pub trait GatewayStore: Clone {
    /// Fetches the gateway with the given id. Unknown ids return [`GatewayStoreError::GatewayNotFound`].
    async fn find_by_id(&self, id: i64) -> Result<Gateway, GatewayStoreError>;

    /// Fetches the gateway with the given (unique) name.
    async fn find_by_name(&self, name: &str) -> Result<Gateway, GatewayStoreError>;

    /// All known gateways, ordered by id.
    async fn fetch_gateways(&self) -> Result<Vec<Gateway>, GatewayStoreError>;
}
