// 5.0: a trader position and its P&L. the free functions are the formulas,
// `Position` bundles the fields callers usually carry around.
// 5.1 pnl, 5.2 take-profit / stop-loss trigger price.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::funding::calculate_funding_fee;
use crate::liquidation::{calculate_liq_price, RiskError};
use crate::margin::{calculate_leverage, calculate_maintenance_margin, calculate_margin_rate, FeeRates};
use crate::math::int::mul_div;
use crate::math::{parse_units, q96, I256, NumericError, U256};
use crate::types::{Rounding, Side};

/// Lowest entry price the contract accepts.
pub const MIN_ENTRY_PRICE_X96: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub side: Side,
    pub size: Decimal,
    pub entry_price: Decimal,
    pub margin: Decimal,
    /// growth accumulator recorded at the last settlement
    #[serde(default)]
    pub funding_rate_growth_x96: I256,
}

impl Position {
    pub fn new(side: Side, size: Decimal, entry_price: Decimal, margin: Decimal) -> Self {
        Self {
            side,
            size,
            entry_price,
            margin,
            funding_rate_growth_x96: I256::ZERO,
        }
    }

    pub fn value(&self) -> Decimal {
        self.size.checked_mul(self.entry_price).unwrap_or(Decimal::ZERO)
    }

    pub fn unrealized_pnl(&self, price: Decimal) -> Decimal {
        calculate_unrealized_pnl(self.side, self.size, self.entry_price, price)
    }

    pub fn maintenance_margin(&self, price: Decimal, fees: &FeeRates) -> Decimal {
        calculate_maintenance_margin(
            self.entry_price,
            self.size,
            price,
            fees.liquidation_fee_rate,
            fees.trading_fee_rate,
            fees.liquidation_execution_fee,
        )
    }

    pub fn margin_rate(&self, price: Decimal, fees: &FeeRates) -> Decimal {
        calculate_margin_rate(self.entry_price, self.size, price, fees, self.margin)
    }

    pub fn leverage(&self) -> Decimal {
        calculate_leverage(self.margin, self.value())
    }

    pub fn liquidation_price(&self, fees: &FeeRates) -> Result<Decimal, RiskError> {
        calculate_liq_price(
            self.side,
            self.margin,
            self.size,
            self.entry_price,
            fees.liquidation_execution_fee,
            fees.liquidation_fee_rate,
            fees.trading_fee_rate,
        )
    }

    /// Funding owed or earned since the last settlement, in raw quote units.
    pub fn funding_fee(
        &self,
        global_funding_rate_growth_x96: I256,
        base_decimals: u32,
    ) -> Result<I256, NumericError> {
        let size = parse_units(&self.size.to_string(), base_decimals)?;
        Ok(calculate_funding_fee(
            global_funding_rate_growth_x96,
            self.funding_rate_growth_x96,
            size,
        ))
    }
}

// 5.1: LONG gains when price rises above entry, SHORT when it falls below.
pub fn calculate_unrealized_pnl(
    side: Side,
    size: Decimal,
    entry_price: Decimal,
    price: Decimal,
) -> Decimal {
    let pnl = match side {
        Side::Long => price.checked_sub(entry_price),
        Side::Short => entry_price.checked_sub(price),
    };
    pnl.and_then(|per_unit| size.checked_mul(per_unit))
        .unwrap_or(Decimal::ZERO)
}

/// X96 variant over raw units: losses round up in magnitude, gains down.
pub fn calculate_unrealized_pnl_by_price_x96(
    side: Side,
    size: U256,
    entry_price_x96: I256,
    price_x96: I256,
) -> I256 {
    let size = I256::from(size);
    let losing = match side {
        Side::Long => entry_price_x96 > price_x96,
        Side::Short => entry_price_x96 < price_x96,
    };
    let delta = if entry_price_x96 > price_x96 {
        entry_price_x96 - price_x96
    } else {
        price_x96 - entry_price_x96
    };
    if losing {
        -mul_div(size, delta, q96(), Rounding::Up).unwrap_or(I256::ZERO)
    } else {
        mul_div(size, delta, q96(), Rounding::Down).unwrap_or(I256::ZERO)
    }
}

// 5.2: trigger price for a target P&L amount: entry +/- amount / size.
// `price` is a P&L amount here, not a price level.
pub fn calculate_take_profit_stop_loss_price(
    is_greater_than: bool,
    size: Decimal,
    entry_price: Decimal,
    price: Decimal,
) -> Decimal {
    let Some(per_unit) = price.checked_div(size) else {
        return Decimal::ZERO;
    };
    let trigger = if is_greater_than {
        per_unit.checked_add(entry_price)
    } else {
        entry_price.checked_sub(per_unit)
    };
    trigger.unwrap_or(Decimal::ZERO)
}
