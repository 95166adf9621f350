//! Line-item quantity.
//!
//! A [`Quantity`] is always a whole number of at least one. Two ways exist to
//! build one from client input, and they deliberately disagree:
//!
//! - [`Quantity::from_json`] is strict: adding to or updating a single line
//!   item rejects anything that is not an integer ≥ 1.
//! - [`Quantity::clamped_from_json`] never fails: bulk cart replacement reads
//!   the leading integer and falls back to 1 for zero, negative or
//!   non-numeric input.

use core::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::lenient;

/// Errors produced when a quantity is rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// The input is not a whole number.
    #[error("quantity must be an integer")]
    NotAnInteger,
    /// The input is a whole number below one.
    #[error("quantity must be at least 1 (got {0})")]
    TooSmall(i64),
    /// The input (or the result of an increment) exceeds the storable range.
    #[error("quantity must be at most 2147483647")]
    TooLarge,
}

/// A positive line-item quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i32")]
pub struct Quantity(i32);

impl Quantity {
    /// The quantity used when a client does not ask for one.
    pub const ONE: Self = Self(1);

    /// Largest storable quantity (the database column is a 32-bit integer).
    pub const MAX: i32 = i32::MAX;

    /// Build a quantity from an integer.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::TooSmall`] below one and
    /// [`QuantityError::TooLarge`] beyond [`Quantity::MAX`].
    pub fn new(value: i64) -> Result<Self, QuantityError> {
        if value < 1 {
            return Err(QuantityError::TooSmall(value));
        }
        i32::try_from(value)
            .map(Self)
            .map_err(|_| QuantityError::TooLarge)
    }

    /// Strictly parse a quantity from a JSON value.
    ///
    /// Integers, floats without a fractional part (`2.0`) and strings holding
    /// such a number (`"3"`) are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::NotAnInteger`] for fractional, non-numeric or
    /// non-scalar input, and the range errors of [`Quantity::new`].
    pub fn from_json(value: &Value) -> Result<Self, QuantityError> {
        let number = match value {
            Value::Number(n) => n
                .as_i64()
                .map_or_else(|| n.as_f64().ok_or(QuantityError::NotAnInteger).and_then(whole), Ok)?,
            Value::String(s) => {
                let trimmed = s.trim();
                match trimmed.parse::<i64>() {
                    Ok(n) => n,
                    Err(_) => trimmed
                        .parse::<f64>()
                        .map_err(|_| QuantityError::NotAnInteger)
                        .and_then(whole)?,
                }
            }
            _ => return Err(QuantityError::NotAnInteger),
        };
        Self::new(number)
    }

    /// Leniently read a quantity, falling back to one.
    ///
    /// Missing, non-numeric, zero and negative input all become
    /// [`Quantity::ONE`]; oversized input saturates at [`Quantity::MAX`].
    #[must_use]
    pub fn clamped_from_json(value: Option<&Value>) -> Self {
        let parsed = value.and_then(lenient::json_int).unwrap_or(1);
        if parsed < 1 {
            return Self::ONE;
        }
        Self(i32::try_from(parsed).unwrap_or(Self::MAX))
    }

    /// Add two quantities.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::TooLarge`] if the sum exceeds [`Quantity::MAX`].
    pub fn checked_add(self, other: Self) -> Result<Self, QuantityError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(QuantityError::TooLarge)
    }

    /// Add two quantities, saturating at [`Quantity::MAX`].
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// The quantity as a plain integer.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

/// Accept a float only when it has no fractional part.
fn whole(f: f64) -> Result<i64, QuantityError> {
    if !f.is_finite() || f.fract() != 0.0 {
        return Err(QuantityError::NotAnInteger);
    }
    if f > i64::MAX as f64 || f < i64::MIN as f64 {
        return Err(QuantityError::TooLarge);
    }
    #[allow(clippy::cast_possible_truncation)] // checked whole and in range above
    Ok(f as i64)
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<i32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(i64::from(value))
    }
}

impl From<Quantity> for i32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}
