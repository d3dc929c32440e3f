// 2.5: conversions between the decimal and integer domains.
// token amounts <-> integer units, prices <-> X96, exact X96 <-> decimal text.

use super::decimal::parse_decimal;
use super::int::I256;
use super::{NumericError, Q96};
use crate::types::{Rounding, Side};
use primitive_types::{U256, U512};
use rust_decimal::Decimal;

// largest mantissa a Decimal can carry
const DECIMAL_MANTISSA_LIMIT: u128 = 1 << 96;
const MAX_DECIMAL_SCALE: u32 = 28;
const X96_FRACTION_DIGITS: usize = 96;

fn pow10_512(exponent: u32) -> Option<U512> {
    U512::from(10u64).checked_pow(U512::from(exponent))
}

fn low_256(value: U512) -> Option<U256> {
    U256::try_from(value).ok()
}

fn div_rounded(numerator: U512, denominator: U512, rounding: Rounding, negative: bool) -> U512 {
    let (quotient, remainder) = numerator.div_mod(denominator);
    let bump = !remainder.is_zero()
        && match rounding {
            Rounding::Down => false,
            Rounding::Up => true,
            Rounding::Ceil => !negative,
            Rounding::Floor => negative,
        };
    if bump {
        quotient + U512::one()
    } else {
        quotient
    }
}

/// Splits decimal text into sign, integer digits and fraction digits.
/// Scientific notation is expanded through `Decimal` first.
fn split_digits(value: &str) -> Result<(bool, String, String), NumericError> {
    let invalid = || NumericError::InvalidNumeric(value.to_string());
    let trimmed = value.trim();
    let plain = if trimmed.contains(['e', 'E']) {
        parse_decimal(trimmed)?.to_string()
    } else {
        trimmed.to_string()
    };

    let (negative, unsigned) = match plain.strip_prefix('-') {
        Some(rest) => (true, rest.to_string()),
        None => (false, plain.strip_prefix('+').unwrap_or(&plain).to_string()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i.to_string(), f.to_string()),
        None => (unsigned.clone(), String::new()),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    let digits_ok = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !digits_ok(&int_part) || !digits_ok(&frac_part) {
        return Err(invalid());
    }
    let int_part = if int_part.is_empty() { "0".to_string() } else { int_part };
    Ok((negative, int_part, frac_part))
}

/// Raw integer text as it comes from the chain (X96 prices, rates, growth accumulators).
pub fn parse_int(value: &str) -> Result<I256, NumericError> {
    value
        .parse::<I256>()
        .map_err(|_| NumericError::InvalidNumeric(value.to_string()))
}

pub fn parse_uint(value: &str) -> Result<U256, NumericError> {
    parse_int(value)?
        .to_u256()
        .ok_or_else(|| NumericError::Negative(value.to_string()))
}

/// Decimal text to integer units, truncating digits beyond `decimals`.
/// `parse_units("2.4", 6) == 2_400_000`.
pub fn parse_units(value: &str, decimals: u32) -> Result<U256, NumericError> {
    let signed = parse_signed_units(value, decimals)?;
    signed
        .to_u256()
        .ok_or_else(|| NumericError::Negative(value.to_string()))
}

pub fn parse_signed_units(value: &str, decimals: u32) -> Result<I256, NumericError> {
    let (negative, int_part, frac_part) = split_digits(value)?;
    let mut frac: String = frac_part.chars().take(decimals as usize).collect();
    while frac.len() < decimals as usize {
        frac.push('0');
    }
    let digits = format!("{int_part}{frac}");
    let magnitude = U256::from_dec_str(&digits)
        .map_err(|_| NumericError::OutOfRange(value.to_string()))?;
    if magnitude.bit(255) {
        return Err(NumericError::OutOfRange(value.to_string()));
    }
    Ok(I256::from_magnitude(negative && !magnitude.is_zero(), magnitude))
}

/// Exact ratio to the closest `Decimal` that fits, truncated toward zero.
pub fn ratio_to_decimal(
    negative: bool,
    numerator: U512,
    denominator: U512,
) -> Result<Decimal, NumericError> {
    if denominator.is_zero() {
        return Err(NumericError::OutOfRange("division by zero".to_string()));
    }
    for scale in (0..=MAX_DECIMAL_SCALE).rev() {
        let Some(factor) = pow10_512(scale) else { continue };
        let Some(scaled) = numerator.checked_mul(factor) else { continue };
        let mantissa = scaled / denominator;
        if mantissa < U512::from(DECIMAL_MANTISSA_LIMIT) {
            let mantissa = mantissa.low_u128() as i128;
            let signed = if negative { -mantissa } else { mantissa };
            return Decimal::try_from_i128_with_scale(signed, scale)
                .map(|d| d.normalize())
                .map_err(|e| NumericError::OutOfRange(e.to_string()));
        }
    }
    Err(NumericError::OutOfRange(format!("{numerator} / {denominator}")))
}

/// Integer units back to a decimal amount: `format_units(2_400_000, 6) == 2.4`.
pub fn format_units(value: U256, decimals: u32) -> Result<Decimal, NumericError> {
    let denominator =
        pow10_512(decimals).ok_or_else(|| NumericError::OutOfRange(format!("10^{decimals}")))?;
    ratio_to_decimal(false, U512::from(value), denominator)
}

/// Exact decimal text of `value / 2^96`. 2^-96 has a finite decimal expansion
/// (96 digits) so nothing is lost.
pub fn format_from_x96(value: I256) -> String {
    // value / 2^96 = value * 5^96 / 10^96
    let five_pow = U512::from(5u64).pow(U512::from(X96_FRACTION_DIGITS));
    let scaled = U512::from(value.unsigned_abs()) * five_pow;
    let digits = scaled.to_string();
    let padded = if digits.len() <= X96_FRACTION_DIGITS {
        format!("{}{}", "0".repeat(X96_FRACTION_DIGITS + 1 - digits.len()), digits)
    } else {
        digits
    };
    let (int_part, frac_part) = padded.split_at(padded.len() - X96_FRACTION_DIGITS);
    let frac_part = frac_part.trim_end_matches('0');
    let sign = if value.is_negative() { "-" } else { "" };
    if frac_part.is_empty() {
        format!("{sign}{int_part}")
    } else {
        format!("{sign}{int_part}.{frac_part}")
    }
}

/// `value * 2^96`, truncated toward zero. Exact for anything produced by
/// [`format_from_x96`].
pub fn parse_to_x96(value: &str) -> Result<I256, NumericError> {
    let out_of_range = || NumericError::OutOfRange(value.to_string());
    let (negative, int_part, frac_part) = split_digits(value)?;
    // digits past 96 are below 2^-96 once scaled
    let frac: String = frac_part.chars().take(X96_FRACTION_DIGITS).collect();
    let k = frac.len() as u32;

    // (int * 10^k + frac) * 2^96 / 10^k == n * 2^(96 - k) / 5^k
    let n = U512::from_dec_str(&format!("{int_part}{frac}")).map_err(|_| out_of_range())?;
    let shifted = n.checked_mul(U512::one() << (96 - k) as usize).ok_or_else(out_of_range)?;
    let five_pow = U512::from(5u64).pow(U512::from(k));
    let magnitude = low_256(shifted / five_pow).ok_or_else(out_of_range)?;
    if magnitude.bit(255) {
        return Err(out_of_range());
    }
    Ok(I256::from_magnitude(negative, magnitude))
}

/// `value / 2^96` as a `Decimal` (truncated to what fits in 28 digits).
pub fn x96_to_decimal(value: I256) -> Result<Decimal, NumericError> {
    ratio_to_decimal(
        value.is_negative(),
        U512::from(value.unsigned_abs()),
        U512::from(Q96),
    )
}

fn decimal_parts(value: Decimal) -> (bool, U512, u32) {
    let mantissa = value.mantissa();
    (
        mantissa < 0,
        U512::from(mantissa.unsigned_abs()),
        value.scale(),
    )
}

/// Human price to the contract's X96 price: `price * 10^quote / 10^base * 2^96`.
pub fn compute_price_x96(
    price: Decimal,
    base_decimals: u32,
    quote_decimals: u32,
    rounding: Rounding,
) -> Result<I256, NumericError> {
    let out_of_range = || NumericError::OutOfRange(price.to_string());
    let (negative, mantissa, scale) = decimal_parts(price);
    let numerator = mantissa
        .checked_mul(pow10_512(quote_decimals).ok_or_else(out_of_range)?)
        .and_then(|v| v.checked_mul(U512::from(Q96)))
        .ok_or_else(out_of_range)?;
    let denominator = pow10_512(scale + base_decimals).ok_or_else(out_of_range)?;
    let magnitude = div_rounded(numerator, denominator, rounding, negative);
    let magnitude = low_256(magnitude).ok_or_else(out_of_range)?;
    Ok(I256::from_magnitude(negative, magnitude))
}

/// X96 price as it goes into a transaction: rounded against the taker,
/// up for LONG and down for SHORT.
pub fn compute_price_x96_for_side(
    price: Decimal,
    base_decimals: u32,
    quote_decimals: u32,
    side: Side,
) -> Result<I256, NumericError> {
    let rounding = match side {
        Side::Long => Rounding::Ceil,
        Side::Short => Rounding::Down,
    };
    compute_price_x96(price, base_decimals, quote_decimals, rounding)
}

/// Contract X96 price to a human price: `price_x96 / 2^96 * 10^base / 10^quote`.
pub fn calculate_price(
    price_x96: I256,
    base_decimals: u32,
    quote_decimals: u32,
) -> Result<Decimal, NumericError> {
    let out_of_range = || NumericError::OutOfRange(price_x96.to_string());
    let numerator = U512::from(price_x96.unsigned_abs())
        .checked_mul(pow10_512(base_decimals).ok_or_else(out_of_range)?)
        .ok_or_else(out_of_range)?;
    let denominator = U512::from(Q96)
        .checked_mul(pow10_512(quote_decimals).ok_or_else(out_of_range)?)
        .ok_or_else(out_of_range)?;
    ratio_to_decimal(price_x96.is_negative(), numerator, denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn units_round_trip() {
        assert_eq!(parse_units("2.4", 6).unwrap(), U256::from(2_400_000u64));
        assert_eq!(parse_units("1", 18).unwrap(), U256::exp10(18));
        // extra digits are truncated
        assert_eq!(parse_units("0.1234567", 6).unwrap(), U256::from(123_456u64));
        assert_eq!(parse_units(".5", 1).unwrap(), U256::from(5u64));
        assert_eq!(format_units(U256::from(2_400_000u64), 6).unwrap(), dec!(2.4));
    }

    #[test]
    fn units_reject_garbage() {
        assert!(parse_units("abc", 6).is_err());
        assert!(parse_units("", 6).is_err());
        assert!(matches!(parse_units("-1", 6), Err(NumericError::Negative(_))));
        assert_eq!(parse_signed_units("-1.5", 1).unwrap(), I256::from(-15i64));
        assert_eq!(parse_units("1e3", 0).unwrap(), U256::from(1000u64));
    }

    #[test]
    fn x96_text_is_exact() {
        assert_eq!(format_from_x96(I256::from(Q96)), "1");
        assert_eq!(format_from_x96(I256::from(Q96 >> 1)), "0.5");
        assert_eq!(format_from_x96(I256::from(-(1i64 << 30)) * I256::from(Q96)), "-1073741824");
        assert_eq!(format_from_x96(I256::ZERO), "0");

        let odd = I256::from(12345u64);
        let text = format_from_x96(odd);
        assert_eq!(parse_to_x96(&text).unwrap(), odd);
        assert_eq!(parse_to_x96("1.5").unwrap(), I256::from(Q96 + (Q96 >> 1)));
    }

    #[test]
    fn price_x96_conversions() {
        let x96 = compute_price_x96(dec!(2000), 6, 6, Rounding::Down).unwrap();
        assert_eq!(x96, I256::from(2000u64) * I256::from(Q96));
        assert_eq!(calculate_price(x96, 6, 6).unwrap(), dec!(2000));

        // $2000 with 18-decimal base and 6-decimal quote is not exact in X96,
        // so down and ceil bracket the price
        let down = compute_price_x96(dec!(2000), 18, 6, Rounding::Down).unwrap();
        let up = compute_price_x96(dec!(2000), 18, 6, Rounding::Ceil).unwrap();
        assert_eq!(up - down, I256::ONE);
        assert!(calculate_price(down, 18, 6).unwrap() < dec!(2000));
        assert!(calculate_price(up, 18, 6).unwrap() >= dec!(2000));

        // one X96 unit of price with equal decimals is exactly 1
        assert_eq!(calculate_price(I256::from(Q96), 0, 0).unwrap(), Decimal::ONE);
        // 1<<96 with 18/6 decimals is 1e12
        assert_eq!(
            calculate_price(I256::from(Q96), 18, 6).unwrap(),
            dec!(1_000_000_000_000)
        );
    }

    #[test]
    fn side_rounding_of_price_x96() {
        let long = compute_price_x96_for_side(dec!(1.1), 0, 0, Side::Long).unwrap();
        let short = compute_price_x96_for_side(dec!(1.1), 0, 0, Side::Short).unwrap();
        assert_eq!(long - short, I256::ONE);
    }

    #[test]
    fn ratio_fits_decimal() {
        let third = ratio_to_decimal(false, U512::from(1u64), U512::from(3u64)).unwrap();
        assert_eq!(third, dec!(0.3333333333333333333333333333));
        assert!(ratio_to_decimal(false, U512::one(), U512::zero()).is_err());
    }
}
