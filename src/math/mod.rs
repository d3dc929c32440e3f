//! Fixed-point arithmetic shared by the curve engine and the risk calculator.
//!
//! Two numeric domains that never mix without an explicit conversion:
//!
//! * decimal ([`decimal`]): `rust_decimal::Decimal` for user-facing amounts
//!   and rates. Helpers return a zero / false sentinel instead of failing.
//! * integer ([`int`]): 256-bit values, either plain token units (`U256`) or
//!   prices and premium rates scaled by 2^96 ([`I256`]).
//!
//! [`x96`] holds the conversions between the two.

pub mod decimal;
pub mod int;
pub mod x96;

pub use decimal::*;
pub use int::{big_int_mul_div, big_int_mul_div2, mul_div_u256, I256};
pub use primitive_types::U256;
pub use x96::*;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub const Q32: U256 = U256([1 << 32, 0, 0, 0]);
pub const Q64: U256 = U256([0, 1, 0, 0]);
pub const Q96: U256 = U256([0, 1 << 32, 0, 0]);
pub const Q152: U256 = U256([0, 0, 1 << 24, 0]);

/// Fee and liquidation rates are expressed in 1e-8 units on-chain.
pub const BASIS_POINTS_DIVISOR: u64 = 100_000_000;

/// Size decimals of the base token.
pub const DEFAULT_PRECISION: u32 = 18;
/// Decimals of the quote (USD) token.
pub const DEFAULT_QUOTE_PRECISION: u32 = 6;

pub fn q96() -> I256 {
    I256::from(Q96)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NumericError {
    #[error("invalid numeric value: '{0}'")]
    InvalidNumeric(String),

    #[error("value out of range: {0}")]
    OutOfRange(String),

    #[error("negative value where an unsigned quantity is required: '{0}'")]
    Negative(String),
}

// 2.4: rates travel on-chain multiplied by 1e8 and are shown divided back.
// empty input means "not set" and maps to zero.
pub fn parse_rate(value: &str) -> Decimal {
    if value.trim().is_empty() {
        return Decimal::ZERO;
    }
    multiplied_by(value, &BASIS_POINTS_DIVISOR.to_string())
}

pub fn format_rate(value: &str) -> Decimal {
    if value.trim().is_empty() {
        return Decimal::ZERO;
    }
    div(value, &BASIS_POINTS_DIVISOR.to_string())
}

/// Basis points divisor as a decimal, for the risk formulas.
pub fn basis_points_divisor() -> Decimal {
    dec!(100_000_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn q_constants_are_powers_of_two() {
        assert_eq!(Q32, U256::one() << 32);
        assert_eq!(Q64, U256::one() << 64);
        assert_eq!(Q96, U256::one() << 96);
        assert_eq!(Q152, U256::one() << 152);
        assert_eq!(Q96.to_string(), "79228162514264337593543950336");
    }

    #[test]
    fn rate_scaling() {
        assert_eq!(parse_rate("0.0005"), dec!(50000));
        assert_eq!(format_rate("50000"), dec!(0.0005));
        assert_eq!(parse_rate(""), Decimal::ZERO);
        assert_eq!(format_rate("bogus"), Decimal::ZERO);
    }
}
