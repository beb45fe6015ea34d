//! Amount type
//!
//! Domain primitive for monetary amounts with business rule validation.
//! All amounts are validated at construction time, ensuring invalid values
//! cannot exist in the system. Persistence uses integer minor units (cents).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum allowed amount (1 trillion in the shop currency)
const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// Maximum decimal places (cents)
const MAX_SCALE: u32 = 2;

/// Amount represents a validated, strictly positive monetary value.
///
/// # Invariants
/// - Value is always positive (> 0)
/// - Maximum 2 decimal places
/// - Maximum value is 1 trillion
///
/// # Example
/// ```
/// use rust_decimal::Decimal;
/// use shop_ledger::domain::Amount;
///
/// let amount = Amount::new(Decimal::new(1999, 2)).unwrap();
/// assert_eq!(amount.cents(), 1999);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

/// Errors that can occur when creating an Amount
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount must be positive (got {0})")]
    NotPositive(Decimal),

    #[error("Amount has too many decimal places (max {MAX_SCALE}, got {0})")]
    TooManyDecimals(u32),

    #[error("Amount exceeds maximum allowed value ({MAX_AMOUNT})")]
    Overflow,

    #[error("Invalid amount format: {0}")]
    ParseError(String),
}

impl Amount {
    /// Create a new Amount with validation.
    ///
    /// # Errors
    /// - `AmountError::NotPositive` if value <= 0
    /// - `AmountError::TooManyDecimals` if more than 2 decimal places
    /// - `AmountError::Overflow` if value > 1 trillion
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive(value));
        }

        // Trailing zeros ("10.500") are not extra precision.
        let value = value.normalize();
        if value.scale() > MAX_SCALE {
            return Err(AmountError::TooManyDecimals(value.scale()));
        }

        if value > Decimal::from(MAX_AMOUNT) {
            return Err(AmountError::Overflow);
        }

        Ok(Self(value))
    }

    /// Create an Amount from minor units.
    pub fn from_cents(cents: i64) -> Result<Self, AmountError> {
        Self::new(Decimal::new(cents, MAX_SCALE))
    }

    /// Get the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Value in minor units. Exact because the scale is capped at 2.
    pub fn cents(&self) -> i64 {
        let mut scaled = self.0;
        scaled.rescale(MAX_SCALE);
        // |mantissa| <= 1e14, always within i64.
        scaled.mantissa() as i64
    }

    /// Multiply by a unit count, e.g. a unit price by a sold quantity.
    pub fn times(&self, quantity: i64) -> Result<Amount, AmountError> {
        let total = self
            .0
            .checked_mul(Decimal::from(quantity))
            .ok_or(AmountError::Overflow)?;
        Amount::new(total)
    }
}

/// Convert stored minor units back into a two-place Decimal.
///
/// Aggregates (sums, margins) can legitimately be zero or negative, so
/// they are plain Decimals rather than [`Amount`]s.
pub fn money_from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, MAX_SCALE)
}

/// [`money_from_cents`] for price-times-count totals, which outgrow `i64`.
pub fn money_from_wide_cents(cents: i128) -> Result<Decimal, AmountError> {
    Decimal::try_from_i128_with_scale(cents, MAX_SCALE).map_err(|_| AmountError::Overflow)
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s.trim())
            .map_err(|e| AmountError::ParseError(e.to_string()))?;
        Amount::new(decimal)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}
