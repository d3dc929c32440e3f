// 1.0: the primitives every other module leans on. side of a trade/position and rounding direction.
// prices and sizes themselves live in math/ since they come in two numeric domains.

use rust_decimal::RoundingStrategy;
use serde::{Deserialize, Serialize};
use std::fmt;

// Long = profit when price goes up. Short = profit when price goes down.
// encoded as 1 / 2 on the wire and on-chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Side {
    Long = 1,
    Short = 2,
}

impl Side {
    pub fn flip(&self) -> Self {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }

    pub fn is_long(&self) -> bool {
        matches!(self, Side::Long)
    }
}

impl TryFrom<u8> for Side {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Side::Long),
            2 => Ok(Side::Short),
            other => Err(format!("invalid side {other}, expected 1 (long) or 2 (short)")),
        }
    }
}

impl From<Side> for u8 {
    fn from(side: Side) -> Self {
        side as u8
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "LONG"),
            Side::Short => write!(f, "SHORT"),
        }
    }
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "long" | "1" => Ok(Side::Long),
            "short" | "2" => Ok(Side::Short),
            other => Err(format!("unknown side '{other}'")),
        }
    }
}

// 1.1: rounding direction. the contract always rounds in favour of the pool,
// so every mul-div says which way it goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rounding {
    /// toward zero (truncate)
    #[default]
    Down,
    /// away from zero
    Up,
    /// toward +inf
    Ceil,
    /// toward -inf
    Floor,
}

impl Rounding {
    pub fn strategy(&self) -> RoundingStrategy {
        match self {
            Rounding::Down => RoundingStrategy::ToZero,
            Rounding::Up => RoundingStrategy::AwayFromZero,
            Rounding::Ceil => RoundingStrategy::ToPositiveInfinity,
            Rounding::Floor => RoundingStrategy::ToNegativeInfinity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_flip() {
        assert_eq!(Side::Long.flip(), Side::Short);
        assert_eq!(Side::Short.flip(), Side::Long);
    }

    #[test]
    fn side_wire_encoding() {
        assert_eq!(u8::from(Side::Long), 1);
        assert_eq!(Side::try_from(2u8).unwrap(), Side::Short);
        assert!(Side::try_from(3u8).is_err());

        let json = serde_json::to_string(&Side::Short).unwrap();
        assert_eq!(json, "2");
        let back: Side = serde_json::from_str("1").unwrap();
        assert_eq!(back, Side::Long);
    }

    #[test]
    fn side_from_cli_text() {
        assert_eq!("LONG".parse::<Side>().unwrap(), Side::Long);
        assert_eq!("short".parse::<Side>().unwrap(), Side::Short);
        assert!("up".parse::<Side>().is_err());
    }
}
