//! Maintenance margin, margin rate and leverage.
//!
//! A position stays open while its margin covers the maintenance margin:
//! the liquidation fee on the opening value, the flat liquidation execution
//! fee, and the trading fee to close at the current price.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::math::{format_rate, parse_decimal, NumericError};

/// Fee schedule of a market as fractions (0.005 = 0.5%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRates {
    pub liquidation_fee_rate: Decimal,
    pub trading_fee_rate: Decimal,
    /// flat fee in quote units
    pub liquidation_execution_fee: Decimal,
}

impl Default for FeeRates {
    fn default() -> Self {
        Self {
            liquidation_fee_rate: dec!(0.004),
            trading_fee_rate: dec!(0.0005),
            liquidation_execution_fee: dec!(0.6),
        }
    }
}

impl FeeRates {
    /// From the on-chain representation: rates in 1e-8 units, fee as a decimal.
    pub fn from_raw(
        liquidation_fee_rate: &str,
        trading_fee_rate: &str,
        liquidation_execution_fee: &str,
    ) -> Result<Self, NumericError> {
        // validate first: format_rate maps garbage to zero
        parse_decimal(liquidation_fee_rate)?;
        parse_decimal(trading_fee_rate)?;
        Ok(Self {
            liquidation_fee_rate: format_rate(liquidation_fee_rate),
            trading_fee_rate: format_rate(trading_fee_rate),
            liquidation_execution_fee: parse_decimal(liquidation_execution_fee)?,
        })
    }
}

fn maintenance_margin(
    entry_price: Decimal,
    size: Decimal,
    price: Decimal,
    liquidation_fee_rate: Decimal,
    trading_fee_rate: Decimal,
    liquidation_execution_fee: Decimal,
) -> Option<Decimal> {
    let liquidation_fee = size
        .checked_mul(entry_price)?
        .checked_mul(liquidation_fee_rate)?
        .checked_add(liquidation_execution_fee)?;
    let trading_fee = size.checked_mul(price)?.checked_mul(trading_fee_rate)?;
    liquidation_fee.checked_add(trading_fee)
}

/// `size * entry * liquidation_fee_rate + execution_fee + size * price * trading_fee_rate`.
/// Zero on overflow.
pub fn calculate_maintenance_margin(
    entry_price: Decimal,
    size: Decimal,
    price: Decimal,
    liquidation_fee_rate: Decimal,
    trading_fee_rate: Decimal,
    liquidation_execution_fee: Decimal,
) -> Decimal {
    maintenance_margin(
        entry_price,
        size,
        price,
        liquidation_fee_rate,
        trading_fee_rate,
        liquidation_execution_fee,
    )
    .unwrap_or(Decimal::ZERO)
}

/// Maintenance margin over margin. Zero when margin is zero.
pub fn calculate_margin_rate(
    entry_price: Decimal,
    size: Decimal,
    price: Decimal,
    fees: &FeeRates,
    margin: Decimal,
) -> Decimal {
    let maintenance = calculate_maintenance_margin(
        entry_price,
        size,
        price,
        fees.liquidation_fee_rate,
        fees.trading_fee_rate,
        fees.liquidation_execution_fee,
    );
    maintenance.checked_div(margin).unwrap_or(Decimal::ZERO)
}

/// Position value over net margin. Zero when net margin is zero.
pub fn calculate_leverage(net_margin: Decimal, liquidity: Decimal) -> Decimal {
    liquidity.checked_div(net_margin).unwrap_or(Decimal::ZERO)
}
