mod helpers;
mod satoshis;
mod secret;

pub mod op;

pub use helpers::{env_flag, parse_boolean_flag};
pub use satoshis::{Satoshis, SatoshisConversionError};
pub use secret::Secret;
