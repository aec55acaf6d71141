mod signature;

pub use signature::{callback_signature, sign, verify};
