//! Currency codes and decimal-to-minor-unit conversion.
//!
//! Prices travel through the system as [`Decimal`] amounts in the currency's
//! standard unit (pesos, dollars). Payment providers expect integer amounts in
//! the smallest unit (centavos, cents), produced by [`to_minor_units`].

use core::fmt;
use core::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Convert a standard-unit amount to smallest-unit integer.
///
/// Rounds half away from zero, so `4.505` becomes `451`. Returns `None` on
/// overflow.
///
/// ```
/// use leureluxe_core::to_minor_units;
/// use rust_decimal::Decimal;
///
/// assert_eq!(to_minor_units(Decimal::new(1999, 2)), Some(1999));
/// assert_eq!(to_minor_units(Decimal::new(4505, 3)), Some(451));
/// ```
#[must_use]
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// ISO 4217 currency codes accepted at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyCode {
    #[default]
    PHP,
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Lowercase code as payment providers expect it.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PHP => "php",
            Self::USD => "usd",
            Self::EUR => "eur",
            Self::GBP => "gbp",
            Self::CAD => "cad",
            Self::AUD => "aud",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "php" => Ok(Self::PHP),
            "usd" => Ok(Self::USD),
            "eur" => Ok(Self::EUR),
            "gbp" => Ok(Self::GBP),
            "cad" => Ok(Self::CAD),
            "aud" => Ok(Self::AUD),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minor_units_whole() {
        assert_eq!(to_minor_units(Decimal::from(500)), Some(50_000));
    }

    #[test]
    fn test_minor_units_rounds_half_away_from_zero() {
        assert_eq!(to_minor_units(Decimal::new(12_345, 4)), Some(123));
        assert_eq!(to_minor_units(Decimal::new(1_235, 3)), Some(124));
    }

    #[test]
    fn test_minor_units_overflow() {
        assert_eq!(to_minor_units(Decimal::MAX), None);
    }

    #[test]
    fn test_currency_parse_case_insensitive() {
        assert_eq!("PHP".parse::<CurrencyCode>(), Ok(CurrencyCode::PHP));
        assert_eq!(" usd ".parse::<CurrencyCode>(), Ok(CurrencyCode::USD));
        assert!("xyz".parse::<CurrencyCode>().is_err());
    }

    #[test]
    fn test_currency_default_is_php() {
        assert_eq!(CurrencyCode::default().as_str(), "php");
    }
}
