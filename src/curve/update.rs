//! Trade simulation across the whole curve.

use tracing::{debug, trace};

use super::results::{CurveError, PriceStateUpdate};
use super::step::{simulate_move, MoveStep};
use super::vertices::change_price_vertex;
use crate::math::{big_int_mul_div, I256, U256};
use crate::types::Side;
use crate::vertex::{MarketState, PriceConfig, PriceVertex, LATEST_VERTEX, VERTEX_NUM};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdatePriceStateParameter {
    pub side: Side,
    pub size_delta: U256,
    pub index_price_x96: I256,
    /// forced close: residual size may be parked in the liquidation buffer
    pub liquidation: bool,
}

/// One pass over the curve in a single direction.
#[derive(Debug, Clone, Copy, Default)]
struct LegResult {
    trade_price_x96_times_size_total: I256,
    size_left: U256,
    total_buffer_used: U256,
}

/// Simulates `parameter` against a copy of `state` and returns the trade
/// price with the proposed state. `state` itself is never touched.
pub fn update_price_state(
    state: &MarketState,
    config: &PriceConfig,
    parameter: &UpdatePriceStateParameter,
) -> Result<PriceStateUpdate, CurveError> {
    if parameter.size_delta.is_zero() {
        return Err(CurveError::InvalidSize);
    }

    let mut working = state.clone();
    let balanced = working.global_liquidity_position.is_balanced();
    if balanced {
        working.price_state.basis_index_price_x96 = parameter.index_price_x96;
    }
    let improve_balance = parameter.side == working.global_liquidity_position.side && !balanced;
    debug!(
        side = %parameter.side,
        size_delta = %parameter.size_delta,
        improve_balance,
        liquidation = parameter.liquidation,
        "updating price state"
    );

    let first = move_along_curve(&mut working, parameter, parameter.size_delta, improve_balance)?;
    let mut total = first.trade_price_x96_times_size_total;
    let mut total_buffer_used = first.total_buffer_used;

    if !improve_balance {
        let position = &mut working.global_liquidity_position;
        position.side = parameter.side.flip();
        position.net_size = position
            .net_size
            .saturating_add(parameter.size_delta.saturating_sub(first.total_buffer_used));
        position.liquidation_buffer_net_size = position
            .liquidation_buffer_net_size
            .saturating_add(first.total_buffer_used);
    } else {
        // the leg reached or crossed vertices that still wait for recalibration
        let price_state = &working.price_state;
        if price_state.pending_vertex_index > price_state.current_vertex_index {
            let (current, pending) = (
                price_state.current_vertex_index,
                price_state.pending_vertex_index,
            );
            change_price_vertex(&mut working, config, parameter.index_price_x96, current, pending);
            working.price_state.pending_vertex_index = current;
        }

        let consumed = parameter
            .size_delta
            .saturating_sub(first.size_left)
            .saturating_sub(first.total_buffer_used);
        let position = &mut working.global_liquidity_position;
        position.net_size = position.net_size.saturating_sub(consumed);
        position.liquidation_buffer_net_size = position
            .liquidation_buffer_net_size
            .saturating_sub(first.total_buffer_used);

        if !first.size_left.is_zero() {
            // pool went through neutral; the rest opens exposure on the other side
            position.side = position.side.flip();
            working.price_state.basis_index_price_x96 = parameter.index_price_x96;
            debug!(size_left = %first.size_left, "crossing the balance point");

            let second = move_along_curve(&mut working, parameter, first.size_left, false)?;
            if total.is_zero() || second.trade_price_x96_times_size_total.is_zero() {
                return Err(CurveError::InsufficientLiquidity {
                    size_left: first.size_left,
                });
            }
            total += second.trade_price_x96_times_size_total;
            total_buffer_used = total_buffer_used.saturating_add(second.total_buffer_used);

            let position = &mut working.global_liquidity_position;
            position.net_size = first.size_left.saturating_sub(second.total_buffer_used);
            position.liquidation_buffer_net_size = second.total_buffer_used;
        }
    }

    if total.is_negative() {
        debug!(%total, "negative size-weighted trade price");
        return Err(CurveError::NegativeTradePrice);
    }

    let size_delta = I256::from(parameter.size_delta);
    let trade_price_x96 = match parameter.side {
        Side::Long => big_int_mul_div(total, I256::ONE, size_delta, true),
        Side::Short => total.checked_div(size_delta).unwrap_or(I256::ZERO),
    };

    Ok(PriceStateUpdate {
        trade_price_x96,
        state: working,
        size_consumed: parameter.size_delta.saturating_sub(total_buffer_used),
        total_buffer_used,
    })
}

fn move_along_curve(
    state: &mut MarketState,
    parameter: &UpdatePriceStateParameter,
    size_delta: U256,
    improve_balance: bool,
) -> Result<LegResult, CurveError> {
    let price_state = &mut state.price_state;
    let mut step = MoveStep {
        side: parameter.side,
        size_left: size_delta,
        index_price_x96: parameter.index_price_x96,
        basis_index_price_x96: price_state.basis_index_price_x96,
        improve_balance,
        from: PriceVertex::default(),
        current: PriceVertex::new(
            state.global_liquidity_position.net_size,
            price_state.premium_rate_x96,
        ),
        to: PriceVertex::default(),
    };
    let mut leg = LegResult::default();

    if !improve_balance {
        let liquidation_index = price_state.liquidation_vertex_index.min(LATEST_VERTEX);
        price_state.current_vertex_index = price_state.current_vertex_index.clamp(1, LATEST_VERTEX);
        let end = if parameter.liquidation {
            liquidation_index + 1
        } else {
            VERTEX_NUM
        };

        let mut i = price_state.current_vertex_index;
        while i < end && !step.size_left.is_zero() {
            step.from = price_state.price_vertices[i - 1];
            step.to = price_state.price_vertices[i];
            let outcome = simulate_move(&step);
            trace!(vertex = i, size_used = %outcome.size_used, reached = outcome.reached, "forward move");

            if outcome.size_used < step.size_left
                && !(parameter.liquidation && i == liquidation_index)
            {
                price_state.current_vertex_index = (i + 1).min(LATEST_VERTEX);
                step.current = step.to;
            }
            step.size_left -= outcome.size_used;
            leg.trade_price_x96_times_size_total +=
                outcome.trade_price_x96 * I256::from(outcome.size_used);
            price_state.premium_rate_x96 = outcome.premium_rate_after_x96;
            i += 1;
        }

        if !step.size_left.is_zero() {
            if !parameter.liquidation {
                debug!(size_left = %step.size_left, "trade exceeds curve depth");
                return Err(CurveError::InsufficientLiquidity {
                    size_left: step.size_left,
                });
            }
            let buffer = &mut price_state.liquidation_buffer_net_sizes[liquidation_index];
            *buffer = buffer.saturating_add(step.size_left);
            leg.total_buffer_used = step.size_left;
            debug!(
                vertex = liquidation_index,
                parked = %step.size_left,
                "parked residual in liquidation buffer"
            );
            step.size_left = U256::zero();
        }
    } else {
        let start = price_state.current_vertex_index.min(LATEST_VERTEX);
        for i in (0..=start).rev() {
            if step.size_left.is_zero() {
                break;
            }

            let buffered = price_state.liquidation_buffer_net_sizes[i];
            if !buffered.is_zero() {
                step.from = price_state.price_vertices[i];
                step.to = step.from;
                let outcome = simulate_move(&step);
                let size_used = buffered.min(step.size_left);
                price_state.liquidation_buffer_net_sizes[i] = buffered - size_used;
                leg.total_buffer_used = leg.total_buffer_used.saturating_add(size_used);
                step.size_left -= size_used;
                leg.trade_price_x96_times_size_total +=
                    outcome.trade_price_x96 * I256::from(size_used);
                trace!(vertex = i, %size_used, "drained liquidation buffer");
            }
            if i == 0 {
                break;
            }

            if !step.size_left.is_zero() {
                step.from = price_state.price_vertices[i];
                step.to = price_state.price_vertices[i - 1];
                let outcome = simulate_move(&step);
                trace!(vertex = i, size_used = %outcome.size_used, reached = outcome.reached, "backward move");

                if outcome.reached {
                    price_state.current_vertex_index = i - 1;
                    step.current = step.to;
                }
                step.size_left -= outcome.size_used;
                leg.trade_price_x96_times_size_total +=
                    outcome.trade_price_x96 * I256::from(outcome.size_used);
                price_state.premium_rate_x96 = outcome.premium_rate_after_x96;
            }
        }
    }

    leg.size_left = step.size_left;
    Ok(leg)
}
