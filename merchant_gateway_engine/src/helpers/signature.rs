//! HMAC-SHA1 signatures shared between the gateway owner and the merchant.
//!
//! Inbound order requests carry `sign(order_id, secret)`. Outbound callbacks carry
//! `sign(sign(order_id, secret), secret)`, so a callback signature can never be replayed as an order signature.
//!
//! Signatures are lowercase hex strings. Verification accepts either case.
use hmac::{Hmac, Mac};
use log::trace;
use mpg_common::Secret;
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

fn keyed_mac(secret: &Secret<String>) -> HmacSha1 {
    HmacSha1::new_from_slice(secret.reveal().as_bytes()).expect("HMAC accepts keys of any length")
}

/// Returns the hex encoded HMAC of `payload`, keyed by `secret`.
pub fn sign(payload: &str, secret: &Secret<String>) -> String {
    let mut mac = keyed_mac(secret);
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Checks `signature` against the HMAC of `payload`.
///
/// A missing or blank secret, or a signature that isn't valid hex, is always a failed verification.
pub fn verify(payload: &str, signature: &str, secret: Option<&Secret<String>>) -> bool {
    let Some(secret) = secret.filter(|s| !s.is_blank()) else {
        trace!("🔐️ No usable secret. Signature rejected");
        return false;
    };
    let Ok(signature) = hex::decode(signature.trim()) else {
        trace!("🔐️ Signature is not valid hex");
        return false;
    };
    let mut mac = keyed_mac(secret);
    mac.update(payload.as_bytes());
    mac.verify_slice(&signature).is_ok()
}

/// The signature appended to outbound callbacks for the order with the given id.
pub fn callback_signature(order_id: &str, secret: &Secret<String>) -> String {
    sign(&sign(order_id, secret), secret)
}
