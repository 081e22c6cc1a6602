//! Integer price representation in minor currency units.
//!
//! Prices are stored, compared and summed as whole minor units (cents).
//! `rust_decimal` is only used at the edges: parsing a major-unit amount typed
//! by a seller (`"19.99"`) and rendering one for display.

use std::iter::Sum;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Errors that can occur when parsing a major-unit amount into a [`Price`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceParseError {
    /// The input is empty or whitespace.
    #[error("price cannot be empty")]
    Empty,
    /// The input is not a decimal number.
    #[error("price must be a number")]
    NotANumber,
    /// The input has more than two decimal places.
    #[error("price cannot have more than two decimal places")]
    TooPrecise,
    /// The input does not fit in minor units.
    #[error("price is too large")]
    Overflow,
}

/// A price in minor currency units.
///
/// ```
/// use bazaar_core::Price;
///
/// let unit = Price::parse_major("19.99").unwrap();
/// assert_eq!(unit.minor_units(), 1999);
/// assert_eq!(unit.times(3), Price::from_minor_units(5997));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// Create a price from minor units (e.g. cents).
    #[must_use]
    pub const fn from_minor_units(amount: i64) -> Self {
        Self(amount)
    }

    /// Get the amount in minor units.
    #[must_use]
    pub const fn minor_units(self) -> i64 {
        self.0
    }

    /// Line total for `quantity` units. Saturates instead of wrapping.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(i64::from(quantity)))
    }

    /// Whether the price is strictly positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// The amount in major units as an exact decimal.
    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Parse a major-unit amount such as `"19.99"` or `"250"`.
    ///
    /// # Errors
    ///
    /// Returns an error for empty input, non-numeric input, more than two
    /// decimal places, or amounts that overflow minor units.
    pub fn parse_major(input: &str) -> Result<Self, PriceParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(PriceParseError::Empty);
        }

        let amount = Decimal::from_str(trimmed).map_err(|_| PriceParseError::NotANumber)?;
        let amount = amount.normalize();
        if amount.scale() > 2 {
            return Err(PriceParseError::TooPrecise);
        }

        let minor = amount
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or(PriceParseError::Overflow)?;
        minor.to_i64().map(Self).ok_or(PriceParseError::Overflow)
    }

    /// Format for display, e.g. `$19.99`.
    #[must_use]
    pub fn display(self, currency: CurrencyCode) -> String {
        format!("{}{:.2}", currency.symbol(), self.to_decimal())
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.fold(0_i64, |acc, p| acc.saturating_add(p.0)))
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        crate::types::lenient::deserialize_i64(deserializer).map(Self)
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    ARS,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::ARS | Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }
}

impl FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ARS" => Ok(Self::ARS),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_major() {
        assert_eq!(Price::parse_major("19.99").unwrap().minor_units(), 1999);
        assert_eq!(Price::parse_major("250").unwrap().minor_units(), 25000);
        assert_eq!(Price::parse_major(" 0.5 ").unwrap().minor_units(), 50);
        assert_eq!(Price::parse_major("3.10").unwrap().minor_units(), 310);
    }

    #[test]
    fn test_parse_major_rejects_bad_input() {
        assert_eq!(Price::parse_major(""), Err(PriceParseError::Empty));
        assert_eq!(Price::parse_major("abc"), Err(PriceParseError::NotANumber));
        assert_eq!(Price::parse_major("1.999"), Err(PriceParseError::TooPrecise));
    }

    #[test]
    fn test_sum_is_exact() {
        // 0.10 + 0.20 repeated would drift in floating point.
        let total: Price = std::iter::repeat_n(Price::from_minor_units(10), 1000)
            .chain(std::iter::repeat_n(Price::from_minor_units(20), 1000))
            .sum();
        assert_eq!(total.minor_units(), 30_000);
    }

    #[test]
    fn test_display() {
        let price = Price::from_minor_units(129_950);
        assert_eq!(price.display(CurrencyCode::ARS), "$1299.50");
        assert_eq!(Price::from_minor_units(5).display(CurrencyCode::EUR), "€0.05");
    }

    #[test]
    fn test_deserialize_from_string_price() {
        let price: Price = serde_json::from_str("\"4500\"").unwrap();
        assert_eq!(price.minor_units(), 4500);
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("usd".parse::<CurrencyCode>().unwrap(), CurrencyCode::USD);
        assert!("XYZ".parse::<CurrencyCode>().is_err());
    }
}
