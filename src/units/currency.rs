//! Conversion between decimal currency amounts and integer base units

use bigdecimal::num_bigint::BigInt;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::types::*;

/// Currency denominations; base units are wei
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Wei,
    Gwei,
    Ether,
}

impl Unit {
    /// Number of decimal places between this unit and wei
    pub fn decimals(&self) -> u32 {
        match self {
            Unit::Wei => 0,
            Unit::Gwei => 9,
            Unit::Ether => 18,
        }
    }

    /// Wei in one of this unit
    fn scale(&self) -> BigDecimal {
        BigDecimal::new(BigInt::from(1), -i64::from(self.decimals()))
    }
}

/// Parse a decimal amount of `unit` into wei
///
/// Fails on negative amounts, on amounts finer than one wei and on values
/// that do not fit a [`Balance`].
pub fn to_wei(amount: &str, unit: Unit) -> TokenResult<Balance> {
    let value = BigDecimal::from_str(amount.trim())
        .map_err(|e| TokenError::Validation(format!("Invalid amount '{}': {}", amount, e)))?;

    if value < BigDecimal::from(0) {
        return Err(TokenError::Validation(format!(
            "Amount cannot be negative: {}",
            amount
        )));
    }

    let wei = value * unit.scale();
    if !wei.is_integer() {
        return Err(TokenError::Validation(format!(
            "Amount '{}' is finer than one wei",
            amount
        )));
    }

    let (digits, _) = wei.with_scale(0).into_bigint_and_exponent();
    digits
        .to_string()
        .parse::<Balance>()
        .map_err(|_| TokenError::Overflow(format!("'{}' {:?} in wei", amount, unit)))
}

/// Express a wei amount in `unit`, exactly
pub fn from_wei(wei: Balance, unit: Unit) -> BigDecimal {
    BigDecimal::new(BigInt::from(wei), i64::from(unit.decimals()))
}

/// Render a wei amount in `unit` in plain notation without trailing zeros,
/// e.g. "0.001"
pub fn format_units(wei: Balance, unit: Unit) -> String {
    let value = from_wei(wei, unit).normalized();
    let (_, exponent) = value.as_bigint_and_exponent();
    if exponent < 0 {
        value.with_scale(0).to_plain_string()
    } else {
        value.to_plain_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_wei() {
        assert_eq!(to_wei("0.001", Unit::Ether).unwrap(), 1_000_000_000_000_000);
        assert_eq!(to_wei("1", Unit::Gwei).unwrap(), 1_000_000_000);
        assert_eq!(to_wei("42", Unit::Wei).unwrap(), 42);
        assert_eq!(to_wei(" 2.5 ", Unit::Ether).unwrap(), 2_500_000_000_000_000_000);
    }

    #[test]
    fn test_to_wei_rejects_invalid_amounts() {
        assert!(matches!(to_wei("-1", Unit::Ether), Err(TokenError::Validation(_))));
        assert!(matches!(to_wei("0.5", Unit::Wei), Err(TokenError::Validation(_))));
        assert!(matches!(to_wei("abc", Unit::Ether), Err(TokenError::Validation(_))));
        assert!(matches!(
            to_wei("1e40", Unit::Ether),
            Err(TokenError::Overflow(_))
        ));
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(1_000_000_000_000_000, Unit::Ether), "0.001");
        assert_eq!(format_units(1_000_000_000_000_000_000, Unit::Ether), "1");
        assert_eq!(format_units(3_000_000_000_000_000_000_000, Unit::Ether), "3000");
        assert_eq!(format_units(0, Unit::Ether), "0");
        assert_eq!(format_units(15, Unit::Wei), "15");
    }

    #[test]
    fn test_format_units_never_uses_exponents() {
        assert_eq!(format_units(1, Unit::Ether), "0.000000000000000001");
        assert_eq!(format_units(1_000_000_000, Unit::Ether), "0.000000001");
        assert_eq!(format_units(1, Unit::Gwei), "0.000000001");
        assert_eq!(format_units(1_000_000_000, Unit::Gwei), "1");
        assert_eq!(format_units(Balance::MAX, Unit::Wei), Balance::MAX.to_string());
        assert_eq!(
            from_wei(1, Unit::Ether).to_plain_string(),
            "0.000000000000000001"
        );
    }

    #[test]
    fn test_from_wei_is_exact() {
        assert_eq!(
            from_wei(10_000_000_000_000_000, Unit::Ether),
            BigDecimal::from_str("0.01").unwrap()
        );
        assert_eq!(from_wei(0, Unit::Gwei), BigDecimal::from(0));
        assert_eq!(
            from_wei(Balance::MAX, Unit::Wei),
            BigDecimal::from_str(&Balance::MAX.to_string()).unwrap()
        );
    }
}
