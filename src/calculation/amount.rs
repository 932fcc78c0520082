//! Monetary amount coercion and currency rounding.
//!
//! Inputs arrive either as exact decimals or as numeric strings. Both are
//! turned into [`Decimal`] values without passing through binary floats,
//! and outputs are rounded half-up to whole cents.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{PayrollError, PayrollResult};

/// Number of fractional digits kept on every monetary output.
pub const CURRENCY_SCALE: u32 = 2;

/// Largest number of integer digits a monetary amount may carry.
///
/// Together with [`CURRENCY_SCALE`] this matches a `DECIMAL(15, 2)` column.
pub const MAX_INTEGER_DIGITS: u32 = 13;

/// A monetary input as supplied by a caller.
///
/// JSON numbers and well-formed numeric strings deserialize straight into
/// [`Amount::Exact`]. Other strings are kept verbatim in [`Amount::Text`]
/// and numbers a [`Decimal`] cannot hold land in [`Amount::Number`]; both
/// are rejected with [`PayrollError::InvalidAmount`] when coerced.
///
/// # Example
///
/// ```
/// use salarium::calculation::Amount;
/// use rust_decimal::Decimal;
///
/// let amount: Amount = serde_json::from_str("\"1250.50\"").unwrap();
/// assert_eq!(amount.to_decimal().unwrap(), Decimal::new(125050, 2));
///
/// let bad: Amount = serde_json::from_str("\"12,5\"").unwrap();
/// assert!(bad.to_decimal().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    /// An exact decimal value.
    Exact(Decimal),
    /// Raw text that still has to be parsed.
    Text(String),
    /// A JSON number outside the decimal range.
    Number(serde_json::Number),
}

impl Amount {
    /// Coerces this amount to an exact decimal.
    ///
    /// Blank text counts as zero. Scientific notation such as `"1e3"` is
    /// accepted.
    ///
    /// # Errors
    ///
    /// Returns [`PayrollError::InvalidAmount`] when the text is not a number
    /// or the value has more than [`MAX_INTEGER_DIGITS`] integer digits.
    pub fn to_decimal(&self) -> PayrollResult<Decimal> {
        let value = match self {
            Amount::Exact(value) => *value,
            Amount::Text(text) => parse_decimal(text)?,
            Amount::Number(number) => parse_decimal(&number.to_string())?,
        };
        check_amount(value)
    }
}

impl Default for Amount {
    fn default() -> Self {
        Amount::Exact(Decimal::ZERO)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::Exact(value)
    }
}

impl From<&str> for Amount {
    fn from(value: &str) -> Self {
        Amount::Text(value.to_string())
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Amount::Exact(Decimal::from(value))
    }
}

/// Coerces an optional amount, treating `None` as zero.
///
/// # Examples
///
/// ```
/// use salarium::calculation::{coerce_amount, Amount};
/// use rust_decimal::Decimal;
///
/// assert_eq!(coerce_amount(None).unwrap(), Decimal::ZERO);
/// assert_eq!(coerce_amount(Some(&Amount::from("0.5"))).unwrap(), Decimal::new(5, 1));
/// ```
pub fn coerce_amount(amount: Option<&Amount>) -> PayrollResult<Decimal> {
    amount.map_or(Ok(Decimal::ZERO), Amount::to_decimal)
}

fn parse_decimal(text: &str) -> PayrollResult<Decimal> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Decimal::ZERO);
    }

    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|e| PayrollError::InvalidAmount {
            value: text.to_string(),
            message: e.to_string(),
        })
}

/// Rejects values with more than [`MAX_INTEGER_DIGITS`] integer digits.
///
/// # Examples
///
/// ```
/// use salarium::calculation::check_amount;
/// use rust_decimal::Decimal;
///
/// assert!(check_amount(Decimal::new(999_999_999_999_999, 2)).is_ok());
/// assert!(check_amount(Decimal::from(10_000_000_000_000i64)).is_err());
/// ```
pub fn check_amount(value: Decimal) -> PayrollResult<Decimal> {
    let limit = Decimal::from(10i64.pow(MAX_INTEGER_DIGITS));
    if value.abs() < limit {
        Ok(value)
    } else {
        Err(PayrollError::InvalidAmount {
            value: value.to_string(),
            message: format!("more than {} integer digits", MAX_INTEGER_DIGITS),
        })
    }
}

/// Rounds a value half-up (ties away from zero) to whole cents.
///
/// The result always carries exactly two fractional digits, so `12000`
/// becomes `12000.00`.
///
/// # Examples
///
/// ```
/// use salarium::calculation::round_currency;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let rounded = round_currency(Decimal::from_str("0.005").unwrap());
/// assert_eq!(rounded.to_string(), "0.01");
///
/// let padded = round_currency(Decimal::from(12000));
/// assert_eq!(padded.to_string(), "12000.00");
/// ```
pub fn round_currency(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(CURRENCY_SCALE);
    rounded
}
