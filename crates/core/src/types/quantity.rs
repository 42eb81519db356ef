//! Line quantities.
//!
//! Fish is sold in 250 g portions, so a quantity counts portions rather than
//! grams. A quantity is never zero: removing a line deletes it.

use core::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Grams in one portion.
pub const PORTION_GRAMS: u32 = 250;

/// Errors that can occur when building a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// Zero or negative quantity.
    #[error("quantity must be at least 1")]
    NotPositive,
}

/// A positive number of 250 g portions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// A single portion.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Build a quantity from a raw count.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::NotPositive`] for zero.
    pub fn new(count: u32) -> Result<Self, QuantityError> {
        NonZeroU32::new(count)
            .map(Self)
            .ok_or(QuantityError::NotPositive)
    }

    /// The raw portion count.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// Total weight in grams.
    #[must_use]
    pub fn grams(self) -> u64 {
        u64::from(self.get()) * u64::from(PORTION_GRAMS)
    }

    /// Add portions, saturating at `u32::MAX`.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0.get()))
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        let count = u32::try_from(value).map_err(|_| QuantityError::NotPositive)?;
        Self::new(count)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.get()
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grams = self.grams();
        if grams % 1000 == 0 {
            write!(f, "{} kg", grams / 1000)
        } else {
            write!(f, "{grams} g")
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_rejected() {
        assert_eq!(Quantity::new(0), Err(QuantityError::NotPositive));
    }

    #[test]
    fn test_negative_json_is_rejected() {
        assert!(serde_json::from_str::<Quantity>("-2").is_err());
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert_eq!(serde_json::from_str::<Quantity>("3").unwrap().get(), 3);
    }

    #[test]
    fn test_display_in_weight() {
        assert_eq!(Quantity::new(1).unwrap().to_string(), "250 g");
        assert_eq!(Quantity::new(4).unwrap().to_string(), "1 kg");
        assert_eq!(Quantity::new(6).unwrap().to_string(), "1500 g");
    }
}
