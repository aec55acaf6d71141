use thiserror::Error;

use crate::db_types::CallbackResponse;

#[derive(Debug, Clone, Error)]
pub enum CallbackClientError {
    #[error("Could not initialize the callback client. {0}")]
    Initialization(String),
    #[error("Callback request failed. {0}")]
    Transport(String),
}

/// Sends the HTTP GET for a callback.
///
/// Any HTTP status, successful or not, is an `Ok` response. Only failures to get a response at all (connection
/// refused, timeouts, invalid URLs) are errors.
#[allow(async_fn_in_trait)]
pub trait CallbackClient: Clone {
    async fn get(&self, url: &str) -> Result<CallbackResponse, CallbackClientError>;
}
