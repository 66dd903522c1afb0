//! Decimal amounts <-> integer base units

use alloy::primitives::U256;
use chainbot_error::{Error, Result};

fn scale(decimals: u8) -> Option<U256> {
    U256::from(10u64).checked_pow(U256::from(decimals))
}

/// Parse a non-negative decimal string ("1.5") into base units at `decimals`.
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256> {
    let amount = amount.trim();
    let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(Error::invalid_argument(format!("'{}' is not a number", amount)));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(Error::invalid_argument(format!(
            "'{}' is not a non-negative decimal number",
            amount
        )));
    }

    let fraction = fraction.trim_end_matches('0');
    if fraction.len() > decimals as usize {
        return Err(Error::invalid_argument(format!(
            "'{}' has more than {} decimal places",
            amount, decimals
        )));
    }

    let overflow = || Error::invalid_argument(format!("'{}' does not fit in uint256", amount));
    let digits = |s: &str| -> Result<U256> {
        if s.is_empty() {
            return Ok(U256::ZERO);
        }
        U256::from_str_radix(s, 10).map_err(|_| overflow())
    };

    let padded = format!("{:0<width$}", fraction, width = decimals as usize);
    digits(whole)?
        .checked_mul(scale(decimals).ok_or_else(overflow)?)
        .and_then(|v| v.checked_add(digits(&padded).ok()?))
        .ok_or_else(overflow)
}

/// Render base units as a decimal string without trailing zeros.
pub fn format_amount(value: U256, decimals: u8) -> Result<String> {
    let unit = scale(decimals).ok_or_else(|| {
        Error::invalid_argument(format!("{} decimals is out of range", decimals))
    })?;
    let whole = value / unit;
    let remainder = value % unit;
    if remainder.is_zero() {
        return Ok(whole.to_string());
    }

    let fraction = format!("{:0>width$}", remainder.to_string(), width = decimals as usize);
    Ok(format!("{}.{}", whole, fraction.trim_end_matches('0')))
}

/// Render `mantissa * 10^exponent` exactly, as Pyth prices are published.
pub fn format_scaled(mantissa: &str, exponent: i32) -> Result<String> {
    let (negative, digits) = match mantissa.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, mantissa),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::parse_failed(format!("'{}' is not an integer", mantissa)));
    }
    let digits = digits.trim_start_matches('0');
    let digits = if digits.is_empty() { "0" } else { digits };

    let unsigned = if exponent >= 0 {
        if digits == "0" {
            "0".to_string()
        } else {
            format!("{}{}", digits, "0".repeat(exponent as usize))
        }
    } else {
        let places = exponent.unsigned_abs() as usize;
        let padded = format!("{:0>width$}", digits, width = places + 1);
        let (whole, fraction) = padded.split_at(padded.len() - places);
        let fraction = fraction.trim_end_matches('0');
        if fraction.is_empty() {
            whole.to_string()
        } else {
            format!("{}.{}", whole, fraction)
        }
    };

    if negative && unsigned != "0" {
        Ok(format!("-{}", unsigned))
    } else {
        Ok(unsigned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(
            parse_amount("1.5", 18).unwrap(),
            U256::from(1_500_000_000_000_000_000u128)
        );
        assert_eq!(parse_amount("0.000001", 6).unwrap(), U256::from(1u8));
        assert_eq!(parse_amount(".25", 2).unwrap(), U256::from(25u8));
        assert_eq!(parse_amount("2.", 2).unwrap(), U256::from(200u8));
        assert_eq!(parse_amount("1.50", 1).unwrap(), U256::from(15u8));
    }

    #[test]
    fn test_parse_amount_beyond_u128() {
        // 2^128 base units, written at 0 and at 18 decimals
        let big = "340282366920938463463374607431768211456";
        assert_eq!(parse_amount(big, 0).unwrap(), U256::from(2u8).pow(U256::from(128u8)));
        assert_eq!(
            parse_amount("340282366920938463463.374607431768211456", 18).unwrap(),
            U256::from(2u8).pow(U256::from(128u8))
        );
    }

    #[test]
    fn test_parse_amount_rejects() {
        assert!(parse_amount("", 18).is_err());
        assert!(parse_amount(".", 18).is_err());
        assert!(parse_amount("-1", 18).is_err());
        assert!(parse_amount("1e18", 18).is_err());
        assert!(parse_amount("0.0000001", 6).is_err());
        // 2^256
        let too_big =
            "115792089237316195423570985008687907853269984665640564039457584007913129639936";
        assert!(parse_amount(too_big, 0).is_err());
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(
            format_amount(U256::from(1_500_000_000_000_000_000u128), 18).unwrap(),
            "1.5"
        );
        assert_eq!(format_amount(U256::ZERO, 18).unwrap(), "0");
        assert_eq!(format_amount(U256::from(1u8), 6).unwrap(), "0.000001");
        assert_eq!(format_amount(U256::from(42u8), 0).unwrap(), "42");
        assert_eq!(format_amount(U256::from(2_000_000u32), 6).unwrap(), "2");
        assert_eq!(
            format_amount(U256::MAX, 0).unwrap(),
            "115792089237316195423570985008687907853269984665640564039457584007913129639935"
        );
        assert!(format_amount(U256::from(1u8), 78).is_err());
    }

    #[test]
    fn test_format_scaled() {
        assert_eq!(format_scaled("6712345678901", -8).unwrap(), "67123.45678901");
        assert_eq!(format_scaled("100000000", -8).unwrap(), "1");
        assert_eq!(format_scaled("5", -3).unwrap(), "0.005");
        assert_eq!(format_scaled("12", 2).unwrap(), "1200");
        assert_eq!(format_scaled("-150", -2).unwrap(), "-1.5");
        assert!(format_scaled("1.5", -2).is_err());
    }
}
