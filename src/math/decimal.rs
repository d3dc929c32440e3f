// 2.2: decimal domain. user-facing amounts, rates, percentages.
// every helper takes text and degrades to 0 / false on non-numeric input,
// a zero divisor, or overflow, so a chain of formulas ends at zero instead of failing.

use super::NumericError;
use crate::types::Rounding;
use rust_decimal::prelude::*;
use rust_decimal::MathematicalOps;

/// Explicit conversion from text. Accepts plain and scientific notation.
pub fn parse_decimal(value: &str) -> Result<Decimal, NumericError> {
    let trimmed = value.trim();
    Decimal::from_str_exact(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .or_else(|_| Decimal::from_str(trimmed))
        .map_err(|_| NumericError::InvalidNumeric(value.to_string()))
}

pub fn is_numeric(value: &str) -> bool {
    parse_decimal(value).is_ok()
}

fn binary(a: &str, b: &str, op: impl Fn(Decimal, Decimal) -> Option<Decimal>) -> Decimal {
    match (parse_decimal(a), parse_decimal(b)) {
        (Ok(a), Ok(b)) => op(a, b).map(|v| v.normalize()).unwrap_or(Decimal::ZERO),
        _ => Decimal::ZERO,
    }
}

fn compare(a: &str, b: &str, op: impl Fn(Decimal, Decimal) -> bool) -> bool {
    match (parse_decimal(a), parse_decimal(b)) {
        (Ok(a), Ok(b)) => op(a, b),
        _ => false,
    }
}

pub fn plus(a: &str, b: &str) -> Decimal {
    binary(a, b, |a, b| a.checked_add(b))
}

pub fn minus(a: &str, b: &str) -> Decimal {
    binary(a, b, |a, b| a.checked_sub(b))
}

pub fn multiplied_by(a: &str, b: &str) -> Decimal {
    binary(a, b, |a, b| a.checked_mul(b))
}

pub fn div(a: &str, b: &str) -> Decimal {
    binary(a, b, |a, b| a.checked_div(b))
}

pub fn modulo(a: &str, b: &str) -> Decimal {
    binary(a, b, |a, b| a.checked_rem(b))
}

pub fn abs(value: &str) -> Decimal {
    parse_decimal(value).map(|v| v.abs()).unwrap_or(Decimal::ZERO)
}

pub fn neg(value: &str) -> Decimal {
    parse_decimal(value).map(|v| -v).unwrap_or(Decimal::ZERO)
}

pub fn trunc(value: &str) -> Decimal {
    parse_decimal(value).map(|v| v.trunc()).unwrap_or(Decimal::ZERO)
}

pub fn is_greater_than(a: &str, b: &str) -> bool {
    compare(a, b, |a, b| a > b)
}

pub fn is_greater_than_or_equal(a: &str, b: &str) -> bool {
    compare(a, b, |a, b| a >= b)
}

pub fn is_less_than(a: &str, b: &str) -> bool {
    compare(a, b, |a, b| a < b)
}

pub fn is_less_than_or_equal(a: &str, b: &str) -> bool {
    compare(a, b, |a, b| a <= b)
}

pub fn is_equal_to(a: &str, b: &str) -> bool {
    compare(a, b, |a, b| a == b)
}

pub fn is_zero(value: &str) -> bool {
    parse_decimal(value).map(|v| v.is_zero()).unwrap_or(false)
}

pub fn is_positive(value: &str) -> bool {
    parse_decimal(value).map(|v| v > Decimal::ZERO).unwrap_or(false)
}

pub fn is_negative(value: &str) -> bool {
    parse_decimal(value).map(|v| v < Decimal::ZERO).unwrap_or(false)
}

// 2.3: typed mul-div used by the risk formulas. a * b / c rounded to `precision`
// decimal places in the requested direction. zero on a zero divisor or overflow.
pub fn mul_div_decimal(
    a: Decimal,
    b: Decimal,
    c: Decimal,
    rounding: Rounding,
    precision: u32,
) -> Decimal {
    a.checked_mul(b)
        .and_then(|product| product.checked_div(c))
        .map(|q| q.round_dp_with_strategy(precision, rounding.strategy()))
        .unwrap_or(Decimal::ZERO)
}

pub fn mul_div(a: &str, b: &str, c: &str, rounding: Rounding, precision: u32) -> Decimal {
    match (parse_decimal(a), parse_decimal(b), parse_decimal(c)) {
        (Ok(a), Ok(b), Ok(c)) => mul_div_decimal(a, b, c, rounding, precision),
        _ => Decimal::ZERO,
    }
}

pub fn ceil_div(a: &str, b: &str, precision: u32) -> Decimal {
    mul_div(a, "1", b, Rounding::Up, precision)
}

pub fn floor_div(a: &str, b: &str, precision: u32) -> Decimal {
    mul_div(a, "1", b, Rounding::Down, precision)
}

pub fn to_decimal_places(value: Decimal, precision: u32, rounding: Rounding) -> Decimal {
    value.round_dp_with_strategy(precision, rounding.strategy())
}

/// 10^exponent, `None` once it leaves the 28-digit range.
pub fn pow10(exponent: u32) -> Option<Decimal> {
    Decimal::TEN.checked_powu(exponent as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn arithmetic_on_text() {
        assert_eq!(plus("1.5", "2.25"), dec!(3.75));
        assert_eq!(minus("1", "3"), dec!(-2));
        assert_eq!(multiplied_by("2000", "10"), dec!(20000));
        assert_eq!(div("1", "4"), dec!(0.25));
        assert_eq!(modulo("10", "3"), dec!(1));
        assert_eq!(abs("-4.2"), dec!(4.2));
        assert_eq!(neg("4.2"), dec!(-4.2));
        assert_eq!(trunc("-4.7"), dec!(-4));
    }

    #[test]
    fn non_numeric_input_degrades_to_zero() {
        assert_eq!(plus("abc", "1"), Decimal::ZERO);
        assert_eq!(div("1", ""), Decimal::ZERO);
        assert_eq!(mul_div("x", "1", "1", Rounding::Down, 0), Decimal::ZERO);
        assert!(!is_greater_than("NaN", "0"));
        assert!(!is_positive("undefined"));
        assert!(!is_zero("zero"));
    }

    #[test]
    fn division_by_zero_is_a_sentinel() {
        assert_eq!(div("1", "0"), Decimal::ZERO);
        assert_eq!(ceil_div("5", "0", 0), Decimal::ZERO);
    }

    #[test]
    fn scientific_notation_parses() {
        assert_eq!(parse_decimal("1e3").unwrap(), dec!(1000));
        assert_eq!(parse_decimal(" 2.5 ").unwrap(), dec!(2.5));
        assert!(parse_decimal("1.2.3").is_err());
    }

    #[test]
    fn directional_mul_div() {
        // 10 / 3 = 3.333..
        assert_eq!(mul_div("10", "1", "3", Rounding::Down, 0), dec!(3));
        assert_eq!(mul_div("10", "1", "3", Rounding::Up, 0), dec!(4));
        assert_eq!(mul_div("-10", "1", "3", Rounding::Up, 0), dec!(-4));
        assert_eq!(mul_div("-10", "1", "3", Rounding::Ceil, 0), dec!(-3));
        assert_eq!(mul_div("-10", "1", "3", Rounding::Floor, 0), dec!(-4));
        assert_eq!(mul_div("10", "1", "3", Rounding::Down, 2), dec!(3.33));
        assert_eq!(ceil_div("10", "3", 1), dec!(3.4));
        assert_eq!(floor_div("10", "3", 1), dec!(3.3));
    }

    #[test]
    fn comparisons() {
        assert!(is_greater_than("2", "1"));
        assert!(is_greater_than_or_equal("2", "2"));
        assert!(is_less_than("-1", "0"));
        assert!(is_less_than_or_equal("0", "0"));
        assert!(is_equal_to("1.0", "1"));
        assert!(is_negative("-0.1"));
        assert!(is_zero("0.000"));
    }

    #[test]
    fn powers_of_ten() {
        assert_eq!(pow10(6), Some(dec!(1_000_000)));
        assert_eq!(pow10(0), Some(Decimal::ONE));
        assert_eq!(pow10(40), None);
    }
}
