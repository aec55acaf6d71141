//! Merchant callbacks.
//!
//! When an order changes status, the merchant's `callback_url` receives a GET request carrying the order's HTTP
//! parameters, the merchant's `data` (when there is any) and a `signature` (when the gateway signs its callbacks).
//! Anything other than a `200` response is retried after a fixed pause, up to [`RetryPolicy::max_retries`] times. The
//! response to the final attempt is stored on the order. Delivery failures are never returned as errors; they are
//! logged and recorded.
use std::time::Duration;

use log::*;
use url::Url;

use crate::{
    db_types::{CallbackResponse, Gateway, Order},
    helpers::callback_signature,
    traits::{CallbackClient, OrderManagement},
};

pub const DEFAULT_MAX_RETRIES: u32 = 10;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Fixed pause between consecutive attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: DEFAULT_MAX_RETRIES, delay: DEFAULT_RETRY_DELAY }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self { delay, ..Default::default() }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    Delivered { attempts: u32 },
    Exhausted { attempts: u32 },
    NoCallbackUrl,
}

impl CallbackOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::Delivered { attempts } | Self::Exhausted { attempts } => *attempts,
            Self::NoCallbackUrl => 0,
        }
    }
}

/// Builds the callback URL for `order`.
///
/// The order's own parameters come first, followed by `data` if the order carries any, and finally the `signature`,
/// `HMAC(HMAC(order.id))`, if the gateway signs its callbacks. Any query string already on `base` is kept.
pub fn build_callback_url(base: &str, gateway: &Gateway, order: &Order) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base)?;
    {
        let mut query = url.query_pairs_mut();
        for (key, value) in order.http_params() {
            query.append_pair(key, &value);
        }
        if let Some(data) = order.data() {
            query.append_pair("data", data);
        }
        if gateway.signs_callbacks() {
            if let Some(secret) = gateway.secret.as_ref() {
                query.append_pair("signature", &callback_signature(order.id.as_str(), secret));
            }
        }
    }
    Ok(url)
}

#[derive(Clone)]
pub struct CallbackDispatcher<O, C> {
    orders: O,
    client: C,
    policy: RetryPolicy,
}

impl<O, C> CallbackDispatcher<O, C>
where
    O: OrderManagement,
    C: CallbackClient,
{
    pub fn new(orders: O, client: C, policy: RetryPolicy) -> Self {
        Self { orders, client, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Delivers the callback for `order`, retrying per the policy, and records the final response on the order.
    ///
    /// Every call runs the full attempt sequence again. Whether a given status has already been announced is for the
    /// caller to decide.
    pub async fn dispatch(&self, gateway: &Gateway, order: &Order) -> CallbackOutcome {
        let Some(base) = gateway.callback_url() else {
            debug!("📞️ Gateway '{}' has no callback URL. Order [{}] is not announced", gateway.name, order.id);
            return CallbackOutcome::NoCallbackUrl;
        };
        let max_attempts = self.policy.max_attempts();
        let mut current = order.clone();
        let mut attempts = 0;
        let (outcome, response) = loop {
            attempts += 1;
            current = self.refresh(current).await;
            let response = self.attempt(base, gateway, &current).await;
            if response.is_success() {
                info!("📞️ Callback for order [{}] delivered on attempt {attempts}", current.id);
                break (CallbackOutcome::Delivered { attempts }, response);
            }
            if attempts >= max_attempts {
                warn!(
                    "📞️ Giving up on the callback for order [{}] after {attempts} attempts. Last response: {} {}",
                    current.id, response.code, response.body
                );
                break (CallbackOutcome::Exhausted { attempts }, response);
            }
            debug!(
                "📞️ Callback attempt {attempts}/{max_attempts} for order [{}] got '{}'. Retrying in {:?}",
                current.id, response.code, self.policy.delay
            );
            tokio::time::sleep(self.policy.delay).await;
        };
        if let Err(e) = self.orders.save_callback_response(&current, &response).await {
            error!("📞️ Could not record the callback response for order [{}]. {e}", current.id);
        }
        outcome
    }

    /// The latest stored version of the order, so that each attempt reports the current state.
    async fn refresh(&self, order: Order) -> Order {
        match self.orders.fetch_order(order.gateway_id, &order.id).await {
            Ok(Some(latest)) => latest,
            Ok(None) => {
                warn!("📞️ Order [{}] has disappeared from storage. Using the last known version", order.id);
                order
            },
            Err(e) => {
                warn!("📞️ Could not reload order [{}]. Using the last known version. {e}", order.id);
                order
            },
        }
    }

    async fn attempt(&self, base: &str, gateway: &Gateway, order: &Order) -> CallbackResponse {
        let url = match build_callback_url(base, gateway, order) {
            Ok(url) => url,
            Err(e) => {
                warn!("📞️ Gateway '{}' has an invalid callback URL. {e}", gateway.name);
                return CallbackResponse::transport_failure(format!("Invalid callback URL. {e}"));
            },
        };
        trace!("📞️ GET {url}");
        match self.client.get(url.as_str()).await {
            Ok(response) => response,
            Err(e) => CallbackResponse::transport_failure(e.to_string()),
        }
    }
}
