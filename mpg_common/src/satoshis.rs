use std::{
    fmt::Display,
    ops::{Add, AddAssign, Sub},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

//--------------------------------------      Satoshis       ---------------------------------------------------------
/// An order amount, in the smallest indivisible unit of the settlement currency.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Satoshis(i64);

op!(binary Satoshis, Add, add);
op!(binary Satoshis, Sub, sub);
op!(inplace Satoshis, AddAssign, add_assign);

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as an amount: {0}")]
pub struct SatoshisConversionError(String);

impl From<i64> for Satoshis {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Satoshis {
    type Error = SatoshisConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        i64::try_from(value).map(Self).map_err(|_| SatoshisConversionError(format!("{value} is too large")))
    }
}

impl FromStr for Satoshis {
    type Err = SatoshisConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().parse::<i64>().map_err(|e| SatoshisConversionError(format!("{s}: {e}")))?;
        if value < 0 {
            return Err(SatoshisConversionError(format!("{s} is negative")));
        }
        Ok(Self(value))
    }
}

impl Display for Satoshis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Satoshis {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_amounts() {
        assert_eq!("1".parse::<Satoshis>().unwrap(), Satoshis::from(1));
        assert_eq!(" 2500 ".parse::<Satoshis>().unwrap().value(), 2500);
        assert!("-1".parse::<Satoshis>().is_err());
        assert!("1.5".parse::<Satoshis>().is_err());
        assert!(Satoshis::try_from(u64::MAX).is_err());
    }

    #[test]
    fn arithmetic_and_display() {
        let mut total = Satoshis::from(100) + Satoshis::from(50) - Satoshis::from(25);
        total += Satoshis::from(1);
        assert_eq!(total.to_string(), "126");
        assert!(Satoshis::default().is_zero());
    }
}
