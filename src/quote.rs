// 7.0: quotes for order preparation. wraps the curve price in a slippage band
// and, for decreases, works out how much margin comes back with the size.
// 7.1 increase, 7.2 decrease.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::debug;

use crate::curve::{calculate_market_price, PricingError};
use crate::math::{compute_price_x96_for_side, parse_units, NumericError, I256, U256, DEFAULT_PRECISION};
use crate::position::{calculate_unrealized_pnl, Position};
use crate::snapshot::MarketSnapshot;
use crate::types::Side;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuoteError {
    #[error("Pricing error: {0}")]
    Pricing(#[from] PricingError),

    #[error("Numeric error: {0}")]
    Numeric(#[from] NumericError),

    #[error("slippage must be in [0, 100), got {0}")]
    InvalidSlippage(Decimal),

    #[error("decrease of {requested} exceeds position size {size}")]
    SizeExceedsPosition { requested: Decimal, size: Decimal },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceRange {
    pub min_price: Decimal,
    pub max_price: Decimal,
}

impl PriceRange {
    /// Worst price the taker on `side` accepts when opening: buyers cap from
    /// above, sellers from below.
    pub fn acceptable_for(&self, side: Side) -> Decimal {
        match side {
            Side::Long => self.max_price,
            Side::Short => self.min_price,
        }
    }
}

/// `price * (1 -/+ slippage / 100)`.
pub fn price_ranges_by_tolerance(
    price: Decimal,
    slippage_percent: Decimal,
) -> Result<PriceRange, QuoteError> {
    if slippage_percent < Decimal::ZERO || slippage_percent >= dec!(100) {
        return Err(QuoteError::InvalidSlippage(slippage_percent));
    }
    let tolerance = slippage_percent / dec!(100);
    let overflow = || NumericError::OutOfRange(price.to_string());
    Ok(PriceRange {
        min_price: price
            .checked_mul(Decimal::ONE - tolerance)
            .ok_or_else(overflow)?,
        max_price: price
            .checked_mul(Decimal::ONE + tolerance)
            .ok_or_else(overflow)?,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncreaseQuote {
    pub side: Side,
    pub trade_price: Decimal,
    pub acceptable_price: Decimal,
    pub acceptable_price_x96: I256,
    /// raw size units
    pub size_delta: U256,
}

// 7.1: quote opening or adding `size_delta` on `side` against the snapshot curve.
pub fn increase_position_quote(
    snapshot: &MarketSnapshot,
    side: Side,
    size_delta: Decimal,
    slippage_percent: Decimal,
) -> Result<IncreaseQuote, QuoteError> {
    let trade_price = calculate_market_price(
        &size_delta.to_string(),
        &snapshot.global_liquidity_position,
        &snapshot.price_state,
        side,
        &snapshot.index_price_x96,
        snapshot.base_decimals,
        snapshot.quote_decimals,
    )?;
    let acceptable_price =
        price_ranges_by_tolerance(trade_price, slippage_percent)?.acceptable_for(side);
    let acceptable_price_x96 = compute_price_x96_for_side(
        acceptable_price,
        snapshot.base_decimals,
        snapshot.quote_decimals,
        side,
    )?;

    debug!(%side, %size_delta, %trade_price, %acceptable_price, "increase quote");
    Ok(IncreaseQuote {
        side,
        trade_price,
        acceptable_price,
        acceptable_price_x96,
        size_delta: parse_units(&size_delta.to_string(), DEFAULT_PRECISION)?,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecreaseQuote {
    pub trade_price: Decimal,
    pub acceptable_price: Decimal,
    pub acceptable_price_x96: I256,
    /// share of the position being closed
    pub lighten_ratio: Decimal,
    /// margin released with the size; zero on a full close, the contract
    /// returns everything then
    pub margin_delta: Decimal,
}

// 7.2: closing a LONG sells into the curve, so the trade runs on the opposite
// side and against that side's index bound.
pub fn decrease_position_quote(
    snapshot: &MarketSnapshot,
    position: &Position,
    size_delta: Decimal,
    slippage_percent: Decimal,
) -> Result<DecreaseQuote, QuoteError> {
    if size_delta > position.size {
        return Err(QuoteError::SizeExceedsPosition {
            requested: size_delta,
            size: position.size,
        });
    }

    let trade_side = position.side.flip();
    let index_price_x96 = snapshot.index_price_x96_for_side(trade_side)?;
    let trade_price = calculate_market_price(
        &size_delta.to_string(),
        &snapshot.global_liquidity_position,
        &snapshot.price_state,
        trade_side,
        &index_price_x96.to_string(),
        snapshot.base_decimals,
        snapshot.quote_decimals,
    )?;

    let range = price_ranges_by_tolerance(trade_price, slippage_percent)?;
    let acceptable_price = range.acceptable_for(trade_side);
    let acceptable_price_x96 = compute_price_x96_for_side(
        acceptable_price,
        snapshot.base_decimals,
        snapshot.quote_decimals,
        trade_side,
    )?;

    let lighten_ratio = if trade_price <= Decimal::ZERO || size_delta <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        size_delta.checked_div(position.size).unwrap_or(Decimal::ZERO)
    };
    let margin_delta = if lighten_ratio == Decimal::ONE {
        Decimal::ZERO
    } else {
        let pnl = calculate_unrealized_pnl(
            position.side,
            position.size,
            position.entry_price,
            trade_price,
        );
        lighten_ratio
            .checked_mul(position.margin)
            .zip(lighten_ratio.checked_mul(pnl))
            .and_then(|(margin, pnl)| margin.checked_add(pnl))
            .unwrap_or(Decimal::ZERO)
    };

    debug!(
        side = %position.side,
        %size_delta,
        %trade_price,
        %lighten_ratio,
        %margin_delta,
        "decrease quote"
    );
    Ok(DecreaseQuote {
        trade_price,
        acceptable_price,
        acceptable_price_x96,
        lighten_ratio,
        margin_delta,
    })
}
