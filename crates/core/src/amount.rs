//! Amount - Positive decimal wrapper for transfer amounts
//!
//! Transfer amounts MUST be strictly positive and never go through
//! binary floating point. This is enforced at the type level.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum number of fractional digits accepted for any currency.
pub const MAX_SCALE: u32 = 8;

/// Errors that can occur when working with amounts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("invalid amount format: {0}")]
    InvalidFormat(String),

    #[error("amount must be positive: {0}")]
    NotPositive(Decimal),

    #[error("amount has {scale} fractional digits, at most {max} allowed")]
    TooPrecise { scale: u32, max: u32 },
}

/// A strictly positive decimal amount for transfers.
///
/// # Invariant
/// The inner value is always > 0 and has at most [`MAX_SCALE`] fractional digits.
///
/// # Example
/// ```
/// use dbank_core::Amount;
///
/// let amount: Amount = "40.00".parse().unwrap();
/// assert_eq!(amount.to_string(), "40.00");
///
/// assert!("0".parse::<Amount>().is_err());
/// assert!("-1".parse::<Amount>().is_err());
/// assert!("abc".parse::<Amount>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Create a new Amount from a Decimal.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive(value));
        }
        if value.scale() > MAX_SCALE {
            return Err(AmountError::TooPrecise {
                scale: value.scale(),
                max: MAX_SCALE,
            });
        }
        Ok(Self(value))
    }

    /// Get the inner Decimal value
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim())
            .map_err(|e| AmountError::InvalidFormat(format!("{s:?}: {e}")))?;
        Self::new(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_positive() {
        let amount = Amount::new(dec!(100.25)).unwrap();
        assert_eq!(amount.value(), dec!(100.25));
    }

    #[test]
    fn test_amount_zero_rejected() {
        assert!(matches!(
            Amount::new(Decimal::ZERO),
            Err(AmountError::NotPositive(_))
        ));
    }

    #[test]
    fn test_amount_negative_rejected() {
        assert!(matches!(
            "-0.01".parse::<Amount>(),
            Err(AmountError::NotPositive(_))
        ));
    }

    #[test]
    fn test_amount_malformed_rejected() {
        assert!(matches!(
            "12,50".parse::<Amount>(),
            Err(AmountError::InvalidFormat(_))
        ));
        assert!(matches!("".parse::<Amount>(), Err(AmountError::InvalidFormat(_))));
    }

    #[test]
    fn test_amount_scale_limit() {
        assert!("0.00000001".parse::<Amount>().is_ok());
        assert!(matches!(
            "0.000000001".parse::<Amount>(),
            Err(AmountError::TooPrecise { scale: 9, max: 8 })
        ));
    }

    #[test]
    fn test_amount_keeps_scale() {
        let amount: Amount = "40.00".parse().unwrap();
        assert_eq!(amount.to_string(), "40.00");
    }
}
