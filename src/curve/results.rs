// 4.0.2: result types and errors for curve simulation.

use crate::math::{NumericError, I256, U256};
use crate::snapshot::SnapshotError;
use crate::vertex::MarketState;

/// Outcome of one simulated trade against a cloned market state.
#[derive(Debug, Clone)]
pub struct PriceStateUpdate {
    /// size-weighted execution price, X96
    pub trade_price_x96: I256,
    /// proposed state after the trade; the input state is untouched
    pub state: MarketState,
    /// size filled by moving along curve segments
    pub size_consumed: U256,
    /// size parked in or drained from liquidation buffers
    pub total_buffer_used: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CurveError {
    #[error("size delta must be positive")]
    InvalidSize,

    #[error("insufficient liquidity: {size_left} left unfilled beyond the curve")]
    InsufficientLiquidity { size_left: U256 },

    #[error("trade price below zero")]
    NegativeTradePrice,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("Curve error: {0}")]
    Curve(#[from] CurveError),

    #[error("Numeric error: {0}")]
    Numeric(#[from] NumericError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}

impl PricingError {
    /// Legacy text form handed to order submission: `-1` for a negative
    /// trade price, `0` for everything else.
    pub fn sentinel(&self) -> &'static str {
        match self {
            PricingError::Curve(CurveError::NegativeTradePrice) => "-1",
            _ => "0",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels() {
        assert_eq!(PricingError::from(CurveError::NegativeTradePrice).sentinel(), "-1");
        let insufficient = CurveError::InsufficientLiquidity {
            size_left: U256::from(5u64),
        };
        assert_eq!(PricingError::from(insufficient).sentinel(), "0");
        assert_eq!(
            PricingError::from(NumericError::InvalidNumeric("x".into())).sentinel(),
            "0"
        );
    }
}
