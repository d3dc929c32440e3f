// 4.0: price-impact curve engine. simulates a trade along the premium-rate
// curve on a cloned market state and derives the size-weighted trade price.
// pure: callers keep their snapshot, the proposed state comes back in the result.

mod results;
mod step;
mod update;
mod vertices;

pub use results::{CurveError, PriceStateUpdate, PricingError};
pub use step::{calculate_a_x248_and_b_x96, simulate_move, MoveOutcome, MoveStep};
pub use update::{update_price_state, UpdatePriceStateParameter};
pub use vertices::{calculate_price_vertex, change_price_vertex};

use rust_decimal::Decimal;
use tracing::debug;

use crate::math::{
    calculate_price, parse_decimal, parse_int, parse_units, x96_to_decimal, DEFAULT_PRECISION,
};
use crate::snapshot::{normalize_market, GlobalLiquidityPositionSnapshot, PriceStateSnapshot};
use crate::types::Side;

// 4.1: quote entry point. sizes are human decimals, the index price is the raw
// X96 integer text. zero liquidity quotes zero.
pub fn calculate_market_price(
    size_delta: &str,
    global_liquidity_position: &GlobalLiquidityPositionSnapshot,
    price_state: &PriceStateSnapshot,
    side: Side,
    index_price_x96: &str,
    base_decimals: u32,
    quote_decimals: u32,
) -> Result<Decimal, PricingError> {
    if global_liquidity_position.has_no_liquidity() {
        return Ok(Decimal::ZERO);
    }

    let size_delta = parse_units(size_delta, DEFAULT_PRECISION)?;
    let index_price_x96 = parse_int(index_price_x96)?;
    let (state, config) = normalize_market(global_liquidity_position, price_state, index_price_x96)?;

    let update = update_price_state(
        &state,
        &config,
        &UpdatePriceStateParameter {
            side,
            size_delta,
            index_price_x96,
            liquidation: false,
        },
    )
    .map_err(|err| {
        debug!(%side, %size_delta, error = %err, "market price simulation failed");
        err
    })?;

    Ok(calculate_price(update.trade_price_x96, base_decimals, quote_decimals)?)
}

/// Price implied by a premium rate: `(1 + rate / 2^96) * index_price`.
pub fn compute_price_by_premium_rate_x96(premium_rate_x96: &str, index_price: &str) -> Decimal {
    let ratio = parse_int(premium_rate_x96).and_then(x96_to_decimal);
    let (Ok(ratio), Ok(index_price)) = (ratio, parse_decimal(index_price)) else {
        return Decimal::ZERO;
    };
    Decimal::ONE
        .checked_add(ratio)
        .and_then(|factor| factor.checked_mul(index_price))
        .unwrap_or(Decimal::ZERO)
}
