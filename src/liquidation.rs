//! Liquidation price.
//!
//! Two formulations of the same price: a decimal closed form over human
//! amounts, and the contract's X96 form over raw integer units that also
//! folds in the pending funding fee.

use rust_decimal::Decimal;

use crate::math::int::mul_div;
use crate::math::{q96, I256, U256, BASIS_POINTS_DIVISOR};
use crate::types::{Rounding, Side};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RiskError {
    #[error("liquidation price undefined: {0}")]
    Undefined(&'static str),

    #[error("arithmetic overflow or division by zero")]
    Arithmetic,
}

// 5.5: price at which net margin is exactly eaten by liquidation and trading fees.
//   LONG:  ((value * liq_rate + exec_fee - net_margin) / size + entry) / (1 - trading_rate)
//   SHORT: (entry - (value * liq_rate + exec_fee - net_margin) / size) / (1 + trading_rate)
pub fn calculate_liq_price(
    side: Side,
    net_margin: Decimal,
    size: Decimal,
    entry_price: Decimal,
    liquidation_execution_fee: Decimal,
    liquidation_fee_rate: Decimal,
    trading_fee_rate: Decimal,
) -> Result<Decimal, RiskError> {
    if net_margin <= Decimal::ZERO {
        return Err(RiskError::Undefined("net margin must be positive"));
    }
    if size <= Decimal::ZERO {
        return Err(RiskError::Undefined("size must be positive"));
    }

    let per_unit = || -> Option<Decimal> {
        entry_price
            .checked_mul(size)?
            .checked_mul(liquidation_fee_rate)?
            .checked_add(liquidation_execution_fee)?
            .checked_sub(net_margin)?
            .checked_div(size)
    };
    let price = match side {
        Side::Long => per_unit()
            .and_then(|shortfall| shortfall.checked_add(entry_price))
            .and_then(|p| p.checked_div(Decimal::ONE - trading_fee_rate)),
        Side::Short => per_unit()
            .and_then(|shortfall| entry_price.checked_sub(shortfall))
            .and_then(|p| p.checked_div(Decimal::ONE + trading_fee_rate)),
    };
    price.ok_or(RiskError::Arithmetic)
}

/// Raw fee schedule as the contract stores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawFeeRates {
    /// 1e-8 units
    pub liquidation_fee_rate: u64,
    /// 1e-8 units
    pub trading_fee_rate: u64,
    /// quote units
    pub liquidation_execution_fee: U256,
}

// 5.6: X96 liquidation price. funding credits add to margin, debits subtract;
// the result of a debit may go negative and is used as is.
pub fn calculate_liquidation_price_x96(
    side: Side,
    position_margin: I256,
    position_size: U256,
    position_liquidity: U256,
    funding_fee: I256,
    fees: &RawFeeRates,
) -> I256 {
    let margin_after = if funding_fee.is_positive() {
        position_margin + funding_fee
    } else {
        position_margin - I256::from(funding_fee.unsigned_abs())
    };

    let divisor = I256::from(BASIS_POINTS_DIVISOR);
    let liquidation_fee_rate = I256::from(fees.liquidation_fee_rate);
    let trading_fee_rate = I256::from(fees.trading_fee_rate);
    let execution_fee = I256::from(fees.liquidation_execution_fee);
    let liquidity = I256::from(position_liquidity);
    let size = I256::from(position_size);

    let (numerator, denominator) = match side {
        Side::Long => {
            let mut numerator = liquidity * (divisor + liquidation_fee_rate);
            if margin_after >= execution_fee {
                numerator -= (margin_after - execution_fee) * divisor;
            } else {
                numerator += (execution_fee - margin_after) * divisor;
            }
            (numerator, size * (divisor - trading_fee_rate))
        }
        Side::Short => {
            let mut numerator = liquidity * (divisor - liquidation_fee_rate);
            if margin_after >= execution_fee {
                numerator += (margin_after - execution_fee) * divisor;
            } else {
                numerator -= (execution_fee - margin_after) * divisor;
            }
            (numerator, size * (divisor + trading_fee_rate))
        }
    };

    mul_div(numerator, q96(), denominator, Rounding::Down).unwrap_or(I256::ZERO)
}
