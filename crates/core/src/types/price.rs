//! Type-safe price representation using decimal arithmetic.
//!
//! The catalog backend stores prices as plain JSON numbers in Colombian
//! pesos (COP). [`Price`] keeps them as [`Decimal`] in memory so that
//! comparisons between a draft and its snapshot are exact.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize};

/// Errors that can occur when parsing a [`Price`] from operator input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is not a number.
    #[error("price must be a number, got {0:?}")]
    NotANumber(String),
    /// The input is below zero.
    #[error("price cannot be negative")]
    Negative,
}

/// A non-negative price in COP.
///
/// ## Examples
///
/// ```
/// use chatshop_core::Price;
///
/// let price = Price::parse("1200").unwrap();
/// assert_eq!(price.display_cop(), "$1.200");
///
/// assert!(Price::parse("-5").is_err());
/// assert!(Price::parse("abc").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// A price of zero, used when a new variant is created without one.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if the amount is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount.normalize()))
    }

    /// Create a price from a whole number of pesos.
    #[must_use]
    pub fn from_pesos(pesos: u64) -> Self {
        Self(Decimal::from(pesos))
    }

    /// Parse a price from operator input, ignoring surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a decimal number or is negative.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let trimmed = s.trim();
        let amount: Decimal = trimmed
            .parse()
            .map_err(|_| PriceError::NotANumber(trimmed.to_owned()))?;
        Self::new(amount)
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Format for display in the es-CO convention (`$1.234.567,5`).
    #[must_use]
    pub fn display_cop(&self) -> String {
        let rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            .normalize();
        let text = rounded.to_string();
        let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), ""));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        if fraction.is_empty() {
            format!("${grouped}")
        } else {
            format!("${grouped},{fraction}")
        }
    }
}

// Backend values go through the same non-negative check as operator input
impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = rust_decimal::serde::float::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert_eq!(Price::parse("500").unwrap(), Price::from_pesos(500));
        assert_eq!(Price::parse(" 1200 ").unwrap(), Price::from_pesos(1200));
        assert_eq!(Price::parse("0").unwrap(), Price::ZERO);
    }

    #[test]
    fn test_parse_normalizes_trailing_zeros() {
        assert_eq!(Price::parse("1200.00").unwrap(), Price::from_pesos(1200));
    }

    #[test]
    fn test_parse_negative() {
        assert_eq!(Price::parse("-1"), Err(PriceError::Negative));
    }

    #[test]
    fn test_parse_not_a_number() {
        assert!(matches!(
            Price::parse("twelve"),
            Err(PriceError::NotANumber(_))
        ));
        assert!(matches!(Price::parse(""), Err(PriceError::NotANumber(_))));
    }

    #[test]
    fn test_display_cop_groups_thousands() {
        assert_eq!(Price::from_pesos(0).display_cop(), "$0");
        assert_eq!(Price::from_pesos(999).display_cop(), "$999");
        assert_eq!(Price::from_pesos(1000).display_cop(), "$1.000");
        assert_eq!(Price::from_pesos(1_234_567).display_cop(), "$1.234.567");
        assert_eq!(Price::parse("1500.5").unwrap().display_cop(), "$1.500,5");
    }

    #[test]
    fn test_serializes_as_json_number() {
        let json = serde_json::to_string(&Price::from_pesos(1200)).unwrap();
        assert_eq!(json, "1200.0");

        let parsed: Price = serde_json::from_str("1200").unwrap();
        assert_eq!(parsed, Price::from_pesos(1200));
    }

    #[test]
    fn test_negative_backend_price_is_rejected() {
        let err = serde_json::from_str::<Price>("-500").unwrap_err();
        assert!(err.to_string().contains("price cannot be negative"));

        let parsed: Price = serde_json::from_str("1500.50").unwrap();
        assert_eq!(parsed.display_cop(), "$1.500,5");
    }
}
