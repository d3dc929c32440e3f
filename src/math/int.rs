//! Integer domain: 256-bit values scaled by 2^96 (prices, premium rates) or
//! plain integer units (sizes, liquidity).
//!
//! Unsigned quantities use `U256` directly. Signed ones use [`I256`], a two's
//! complement wrapper whose add/sub/mul/neg wrap modulo 2^256 like the EVM.
//! Products are widened to 512 bits inside [`mul_div`] so `x * y` never
//! overflows before the division.

use crate::types::Rounding;
use primitive_types::{U256, U512};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;

const SIGN_BIT: U256 = U256([0, 0, 0, 1 << 63]);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct I256(U256);

impl I256 {
    pub const ZERO: I256 = I256(U256([0, 0, 0, 0]));
    pub const ONE: I256 = I256(U256([1, 0, 0, 0]));
    pub const MINUS_ONE: I256 = I256(U256([u64::MAX, u64::MAX, u64::MAX, u64::MAX]));

    /// Reinterprets raw two's complement bits.
    pub fn from_raw(bits: U256) -> Self {
        Self(bits)
    }

    pub fn into_raw(self) -> U256 {
        self.0
    }

    pub fn from_magnitude(negative: bool, magnitude: U256) -> Self {
        let value = Self(magnitude);
        if negative {
            -value
        } else {
            value
        }
    }

    pub fn is_negative(&self) -> bool {
        self.0.bit(255)
    }

    pub fn is_positive(&self) -> bool {
        !self.is_negative() && !self.is_zero()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn unsigned_abs(&self) -> U256 {
        if self.is_negative() {
            (-*self).0
        } else {
            self.0
        }
    }

    /// `None` for negative values.
    pub fn to_u256(&self) -> Option<U256> {
        if self.is_negative() {
            None
        } else {
            Some(self.0)
        }
    }

    /// Truncating division (toward zero, like the EVM `sdiv`). `None` on a zero divisor.
    pub fn checked_div(self, rhs: I256) -> Option<I256> {
        if rhs.is_zero() {
            return None;
        }
        let negative = self.is_negative() != rhs.is_negative();
        let quotient = self.unsigned_abs() / rhs.unsigned_abs();
        Some(Self::from_magnitude(negative, quotient))
    }

    pub fn max(self, other: I256) -> I256 {
        if self >= other {
            self
        } else {
            other
        }
    }
}

impl From<U256> for I256 {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl From<u64> for I256 {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl From<u128> for I256 {
    fn from(value: u128) -> Self {
        Self(U256::from(value))
    }
}

impl From<i64> for I256 {
    fn from(value: i64) -> Self {
        Self::from_magnitude(value < 0, U256::from(value.unsigned_abs()))
    }
}

impl From<i128> for I256 {
    fn from(value: i128) -> Self {
        Self::from_magnitude(value < 0, U256::from(value.unsigned_abs()))
    }
}

impl Neg for I256 {
    type Output = I256;

    fn neg(self) -> I256 {
        let (value, _) = (!self.0).overflowing_add(U256::one());
        I256(value)
    }
}

impl Add for I256 {
    type Output = I256;

    fn add(self, rhs: I256) -> I256 {
        I256(self.0.overflowing_add(rhs.0).0)
    }
}

impl Sub for I256 {
    type Output = I256;

    fn sub(self, rhs: I256) -> I256 {
        I256(self.0.overflowing_sub(rhs.0).0)
    }
}

impl Mul for I256 {
    type Output = I256;

    fn mul(self, rhs: I256) -> I256 {
        I256(self.0.overflowing_mul(rhs.0).0)
    }
}

impl AddAssign for I256 {
    fn add_assign(&mut self, rhs: I256) {
        *self = *self + rhs;
    }
}

impl SubAssign for I256 {
    fn sub_assign(&mut self, rhs: I256) {
        *self = *self - rhs;
    }
}

impl Ord for I256 {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.0 ^ SIGN_BIT).cmp(&(other.0 ^ SIGN_BIT))
    }
}

impl PartialOrd for I256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for I256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            write!(f, "-{}", self.unsigned_abs())
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl fmt::Debug for I256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "I256({self})")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not an integer: '{0}'")]
pub struct ParseIntError(pub String);

impl FromStr for I256 {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseIntError(s.to_string()));
        }
        let magnitude = U256::from_dec_str(digits).map_err(|_| ParseIntError(s.to_string()))?;
        Ok(Self::from_magnitude(negative, magnitude))
    }
}

impl Serialize for I256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for I256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

fn low_256(value: U512) -> U256 {
    let U512(words) = value;
    U256([words[0], words[1], words[2], words[3]])
}

// 2.1: x * y / denominator with a 512-bit product. the quotient wraps to 256 bits
// if it does not fit. None only for a zero denominator.
pub fn mul_div_u256(x: U256, y: U256, denominator: U256, rounding: Rounding) -> Option<U256> {
    if denominator.is_zero() {
        return None;
    }
    let (quotient, remainder) = x.full_mul(y).div_mod(U512::from(denominator));
    let bump = !remainder.is_zero() && matches!(rounding, Rounding::Up | Rounding::Ceil);
    let quotient = low_256(quotient);
    Some(if bump {
        quotient.overflowing_add(U256::one()).0
    } else {
        quotient
    })
}

pub fn mul_div(x: I256, y: I256, denominator: I256, rounding: Rounding) -> Option<I256> {
    if denominator.is_zero() {
        return None;
    }
    let negative = x.is_negative() ^ y.is_negative() ^ denominator.is_negative();
    let (quotient, remainder) = x
        .unsigned_abs()
        .full_mul(y.unsigned_abs())
        .div_mod(U512::from(denominator.unsigned_abs()));
    let bump = !remainder.is_zero()
        && match rounding {
            Rounding::Down => false,
            Rounding::Up => true,
            Rounding::Ceil => !negative,
            Rounding::Floor => negative,
        };
    let mut magnitude = low_256(quotient);
    if bump {
        magnitude = magnitude.overflowing_add(U256::one()).0;
    }
    Some(I256::from_magnitude(negative, magnitude))
}

/// `floor(x * y / denominator)`, plus one when `ceil` is set and the division
/// leaves a remainder. A zero denominator yields zero.
pub fn big_int_mul_div(x: I256, y: I256, denominator: I256, ceil: bool) -> I256 {
    let rounding = if ceil { Rounding::Ceil } else { Rounding::Floor };
    mul_div(x, y, denominator, rounding).unwrap_or(I256::ZERO)
}

/// Floor and ceil of `x * y / denominator` from one division: `(down, up)`.
pub fn big_int_mul_div2(x: I256, y: I256, denominator: I256) -> (I256, I256) {
    let down = big_int_mul_div(x, y, denominator, false);
    let up = big_int_mul_div(x, y, denominator, true);
    (down, up)
}
