use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use mpg_common::Satoshis;
use mpg_common::Secret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

fn default_true() -> bool {
    true
}

//--------------------------------------       Gateway       ---------------------------------------------------------
/// A merchant integration. Owns the signing secret, the signature policy flags and the keychain counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Gateway {
    pub id: i64,
    pub name: String,
    /// Extended public key handed to the address derivation collaborator.
    pub pubkey: String,
    pub confirmations_required: i64,
    /// Tells the order factory which concrete order type to build.
    pub order_class: String,
    #[serde(skip_serializing)]
    pub secret: Option<Secret<String>>,
    /// Enforce signatures on order creation.
    pub check_signature: bool,
    /// Sign outbound callbacks. Only takes effect when the gateway has a secret.
    pub check_signature_callback: bool,
    pub callback_url: Option<String>,
    pub test_mode: bool,
    /// The next keychain id to hand out.
    pub last_keychain_id: i64,
}

impl Gateway {
    pub fn from_new(id: i64, gateway: NewGateway, last_keychain_id: i64) -> Self {
        Self {
            id,
            name: gateway.name,
            pubkey: gateway.pubkey,
            confirmations_required: gateway.confirmations_required,
            order_class: gateway.order_class,
            secret: gateway.secret,
            check_signature: gateway.check_signature,
            check_signature_callback: gateway.check_signature_callback,
            callback_url: gateway.callback_url,
            test_mode: gateway.test_mode,
            last_keychain_id,
        }
    }

    pub fn has_secret(&self) -> bool {
        self.secret.as_ref().is_some_and(|s| !s.is_blank())
    }

    pub fn signs_callbacks(&self) -> bool {
        self.check_signature_callback && self.has_secret()
    }

    pub fn callback_url(&self) -> Option<&str> {
        self.callback_url.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

//--------------------------------------     NewGateway      ---------------------------------------------------------
/// A gateway definition, either read from the gateways config file or submitted to the database backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewGateway {
    pub name: String,
    pub pubkey: String,
    pub confirmations_required: i64,
    pub order_class: String,
    #[serde(default)]
    pub secret: Option<Secret<String>>,
    #[serde(default)]
    pub check_signature: bool,
    #[serde(default = "default_true")]
    pub check_signature_callback: bool,
    #[serde(default)]
    pub callback_url: Option<String>,
    #[serde(default = "default_true")]
    pub test_mode: bool,
}

impl NewGateway {
    pub fn new<S: Into<String>>(name: S, pubkey: S, order_class: S) -> Self {
        Self {
            name: name.into(),
            pubkey: pubkey.into(),
            confirmations_required: 0,
            order_class: order_class.into(),
            secret: None,
            check_signature: false,
            check_signature_callback: true,
            callback_url: None,
            test_mode: true,
        }
    }

    pub fn with_secret(mut self, secret: &str) -> Self {
        self.secret = Some(Secret::from(secret));
        self
    }

    pub fn with_signature_checks(mut self, enabled: bool) -> Self {
        self.check_signature = enabled;
        self
    }

    pub fn with_callback_signatures(mut self, enabled: bool) -> Self {
        self.check_signature_callback = enabled;
        self
    }

    pub fn with_callback_url(mut self, url: &str) -> Self {
        self.callback_url = Some(url.to_string());
        self
    }

    pub fn with_confirmations_required(mut self, confirmations: i64) -> Self {
        self.confirmations_required = confirmations;
        self
    }

    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }
}

//--------------------------------------       OrderId       ---------------------------------------------------------
/// The caller-supplied order identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    /// Used when an unsigned gateway receives an order without an id.
    pub fn for_keychain_id(gateway_id: i64, keychain_id: i64) -> Self {
        Self(format!("{gateway_id}-{keychain_id}"))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OrderId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for OrderId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

//--------------------------------------     OrderStatus     ---------------------------------------------------------
/// Order status, as driven by the blockchain monitor. The numeric codes are what merchants receive in callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// No payment has been seen yet.
    New,
    /// A payment was seen but it does not have enough confirmations yet.
    Unconfirmed,
    Paid,
    Underpaid,
    Overpaid,
    Expired,
    Canceled,
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct OrderStatusConversionError(String);

impl OrderStatus {
    pub fn code(&self) -> i64 {
        match self {
            OrderStatus::New => 0,
            OrderStatus::Unconfirmed => 1,
            OrderStatus::Paid => 2,
            OrderStatus::Underpaid => 3,
            OrderStatus::Overpaid => 4,
            OrderStatus::Expired => 5,
            OrderStatus::Canceled => 6,
        }
    }
}

impl TryFrom<i64> for OrderStatus {
    type Error = OrderStatusConversionError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::New),
            1 => Ok(Self::Unconfirmed),
            2 => Ok(Self::Paid),
            3 => Ok(Self::Underpaid),
            4 => Ok(Self::Overpaid),
            5 => Ok(Self::Expired),
            6 => Ok(Self::Canceled),
            _ => Err(OrderStatusConversionError(value.to_string())),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = OrderStatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<i64>() {
            return Self::try_from(code);
        }
        match s.to_ascii_lowercase().as_str() {
            "new" => Ok(Self::New),
            "unconfirmed" => Ok(Self::Unconfirmed),
            "paid" => Ok(Self::Paid),
            "underpaid" => Ok(Self::Underpaid),
            "overpaid" => Ok(Self::Overpaid),
            "expired" => Ok(Self::Expired),
            "canceled" | "cancelled" => Ok(Self::Canceled),
            _ => Err(OrderStatusConversionError(s.to_string())),
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OrderStatus::New => "New",
            OrderStatus::Unconfirmed => "Unconfirmed",
            OrderStatus::Paid => "Paid",
            OrderStatus::Underpaid => "Underpaid",
            OrderStatus::Overpaid => "Overpaid",
            OrderStatus::Expired => "Expired",
            OrderStatus::Canceled => "Canceled",
        };
        f.write_str(name)
    }
}

//--------------------------------------  CallbackResponse   ---------------------------------------------------------
/// The status code and body of the most recent callback attempt for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackResponse {
    pub code: String,
    pub body: String,
}

impl CallbackResponse {
    pub fn new<S: Into<String>>(code: S, body: S) -> Self {
        Self { code: code.into(), body: body.into() }
    }

    /// A transport failure has no status code; the error text is kept as the body.
    pub fn transport_failure<S: Into<String>>(error: S) -> Self {
        Self { code: String::new(), body: error.into() }
    }

    pub fn is_success(&self) -> bool {
        self.code == "200"
    }
}

//--------------------------------------      NewOrder       ---------------------------------------------------------
/// What the order factory is given once an order request has been authorised and a keychain id allocated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub gateway_id: i64,
    pub id: OrderId,
    pub amount: Satoshis,
    pub keychain_id: i64,
    pub data: Option<String>,
}

impl NewOrder {
    pub fn new(gateway_id: i64, id: OrderId, amount: Satoshis, keychain_id: i64) -> Self {
        Self { gateway_id, id, amount, keychain_id, data: None }
    }

    pub fn with_data<S: Into<String>>(mut self, data: S) -> Self {
        self.data = Some(data.into());
        self
    }
}

//--------------------------------------        Order        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub gateway_id: i64,
    pub id: OrderId,
    pub amount: Satoshis,
    pub keychain_id: i64,
    /// Opaque merchant data, echoed back verbatim in callbacks.
    pub data: Option<String>,
    pub status: OrderStatus,
    pub tid: Option<String>,
    pub address: Option<String>,
    pub callback_response: Option<CallbackResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn from_new(order: NewOrder) -> Self {
        let now = Utc::now();
        Self {
            gateway_id: order.gateway_id,
            id: order.id,
            amount: order.amount,
            keychain_id: order.keychain_id,
            data: order.data,
            status: OrderStatus::New,
            tid: None,
            address: None,
            callback_response: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The order's own query string serialization, in the order merchants expect it.
    /// Missing `address` and `tid` values are sent as empty strings.
    pub fn http_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("id", self.id.to_string()),
            ("amount", self.amount.to_string()),
            ("status", self.status.code().to_string()),
            ("address", self.address.clone().unwrap_or_default()),
            ("tid", self.tid.clone().unwrap_or_default()),
            ("keychain_id", self.keychain_id.to_string()),
        ]
    }

    /// `Some` only for non-empty merchant data.
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref().filter(|d| !d.is_empty())
    }
}
