use std::time::Duration;

use log::*;

use crate::{
    db_types::CallbackResponse,
    traits::{CallbackClient, CallbackClientError},
};

pub const DEFAULT_CALLBACK_TIMEOUT: Duration = Duration::from_secs(10);

/// A [`CallbackClient`] that sends real HTTP requests. Each attempt is bounded by the configured timeout.
#[derive(Clone, Debug)]
pub struct ReqwestCallbackClient {
    client: reqwest::Client,
}

impl ReqwestCallbackClient {
    pub fn new(timeout: Duration) -> Result<Self, CallbackClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CallbackClientError::Initialization(e.to_string()))?;
        debug!("📞️ Callback client ready with a {timeout:?} timeout");
        Ok(Self { client })
    }
}

impl CallbackClient for ReqwestCallbackClient {
    async fn get(&self, url: &str) -> Result<CallbackResponse, CallbackClientError> {
        let response = self.client.get(url).send().await.map_err(|e| CallbackClientError::Transport(e.to_string()))?;
        let code = response.status().as_u16().to_string();
        let body = response.text().await.map_err(|e| CallbackClientError::Transport(e.to_string()))?;
        trace!("📞️ {url} responded with {code}");
        Ok(CallbackResponse::new(code, body))
    }
}
