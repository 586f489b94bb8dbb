//! Conversion between base units (wei) and display decimals.

use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

/// Fractional digits of every native EVM currency.
pub const NATIVE_DECIMALS: u32 = 18;

/// 10^18.
pub const WEI_PER_UNIT: u128 = 1_000_000_000_000_000_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UnitsError {
    #[error("amount is empty")]
    Empty,

    #[error("not a decimal number: {0}")]
    NotANumber(String),

    #[error("amount must be greater than zero")]
    NotPositive,

    #[error("too many decimal places ({0}, max 18)")]
    TooPrecise(u32),

    #[error("amount out of range")]
    Overflow,
}

/// Convert a wei amount to display units.
pub fn wei_to_decimal(wei: u128) -> Result<Decimal, UnitsError> {
    let wei = i128::try_from(wei).map_err(|_| UnitsError::Overflow)?;
    Decimal::try_from_i128_with_scale(wei, NATIVE_DECIMALS)
        .map(|d| d.normalize())
        .map_err(|_| UnitsError::Overflow)
}

/// Convert a non-negative display amount to wei.
///
/// Exact: the mantissa is rescaled with integer arithmetic.
pub fn decimal_to_wei(amount: Decimal) -> Result<u128, UnitsError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(UnitsError::NotPositive);
    }
    let scale = amount.scale();
    if scale > NATIVE_DECIMALS {
        return Err(UnitsError::TooPrecise(scale));
    }
    let mantissa = amount.mantissa().unsigned_abs();
    10u128
        .checked_pow(NATIVE_DECIMALS - scale)
        .and_then(|factor| mantissa.checked_mul(factor))
        .ok_or(UnitsError::Overflow)
}

/// Parse user-entered amount text into a positive display amount.
pub fn parse_amount(text: &str) -> Result<Decimal, UnitsError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(UnitsError::Empty);
    }
    let amount =
        Decimal::from_str(text).map_err(|_| UnitsError::NotANumber(text.to_string()))?;
    if amount.is_sign_negative() || amount.is_zero() {
        return Err(UnitsError::NotPositive);
    }
    if amount.scale() > NATIVE_DECIMALS {
        return Err(UnitsError::TooPrecise(amount.scale()));
    }
    Ok(amount)
}

/// Format a display amount with a fixed number of decimals (for UIs).
pub fn format_amount(amount: Decimal, places: u32) -> String {
    format!("{:.*}", places as usize, amount.round_dp(places))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wei_to_decimal() {
        assert_eq!(wei_to_decimal(0).unwrap(), Decimal::ZERO);
        assert_eq!(wei_to_decimal(WEI_PER_UNIT).unwrap(), Decimal::ONE);
        assert_eq!(
            wei_to_decimal(1_500_000_000_000_000_000).unwrap(),
            Decimal::new(15, 1)
        );
        assert_eq!(wei_to_decimal(1).unwrap().to_string(), "0.000000000000000001");
        assert_eq!(wei_to_decimal(u128::MAX), Err(UnitsError::Overflow));
    }

    #[test]
    fn test_decimal_to_wei() {
        assert_eq!(decimal_to_wei(Decimal::new(15, 1)).unwrap(), 1_500_000_000_000_000_000);
        assert_eq!(decimal_to_wei(Decimal::ONE).unwrap(), WEI_PER_UNIT);
        assert_eq!(decimal_to_wei(Decimal::ZERO).unwrap(), 0);
        assert_eq!(decimal_to_wei(Decimal::new(-1, 0)), Err(UnitsError::NotPositive));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1.5").unwrap(), Decimal::new(15, 1));
        assert_eq!(parse_amount(" 0.001 ").unwrap(), Decimal::new(1, 3));
        assert_eq!(parse_amount(""), Err(UnitsError::Empty));
        assert_eq!(parse_amount("0"), Err(UnitsError::NotPositive));
        assert_eq!(parse_amount("-2"), Err(UnitsError::NotPositive));
        assert!(matches!(parse_amount("abc"), Err(UnitsError::NotANumber(_))));
        assert_eq!(
            parse_amount("0.0000000000000000001"),
            Err(UnitsError::TooPrecise(19))
        );
    }

    #[test]
    fn test_parse_then_convert_smallest_unit() {
        let amount = parse_amount("0.000000000000000001").unwrap();
        assert_eq!(decimal_to_wei(amount).unwrap(), 1);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(Decimal::new(15, 1), 4), "1.5000");
        assert_eq!(format_amount(Decimal::new(123456789, 8), 4), "1.2346");
        assert_eq!(format_amount(Decimal::ZERO, 4), "0.0000");
    }
}
