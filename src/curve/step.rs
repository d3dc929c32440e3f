//! One segment move along the curve.
//!
//! A [`MoveStep`] walks from `current` toward `to` inside the segment bounded
//! by `from` and `to`. Forward moves (pool exposure grows) go up the vertex
//! order, balance-improving moves go back toward vertex 0.

use crate::math::{big_int_mul_div, big_int_mul_div2, I256, Q152, Q96, U256};
use crate::types::Side;
use crate::vertex::PriceVertex;

#[derive(Debug, Clone)]
pub struct MoveStep {
    pub side: Side,
    pub size_left: U256,
    pub index_price_x96: I256,
    pub basis_index_price_x96: I256,
    pub improve_balance: bool,
    pub from: PriceVertex,
    pub current: PriceVertex,
    pub to: PriceVertex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    /// `to` was reached with size to spare or exactly
    pub reached: bool,
    pub size_used: U256,
    pub trade_price_x96: I256,
    pub premium_rate_after_x96: I256,
}

pub fn simulate_move(step: &MoveStep) -> MoveOutcome {
    let (reached, size_used) = calculate_reached_and_size_used(step);
    let premium_rate_after_x96 = calculate_premium_rate_after_x96(step, reached, size_used);
    let premium_rate_before_x96 = step.current.premium_rate_x96;

    // basis * (before + after) / 2, both roundings; long and short take opposite ones
    let (premium_down, premium_up) = big_int_mul_div2(
        step.basis_index_price_x96,
        premium_rate_before_x96 + premium_rate_after_x96,
        I256::from(Q96 << 1),
    );

    let trade_price_x96 = match (step.side, step.improve_balance) {
        (Side::Long, true) => step.index_price_x96 - premium_down,
        (Side::Long, false) => step.index_price_x96 + premium_up,
        (Side::Short, true) => step.index_price_x96 + premium_down,
        (Side::Short, false) => step.index_price_x96 - premium_up,
    };

    MoveOutcome {
        reached,
        size_used,
        trade_price_x96,
        premium_rate_after_x96,
    }
}

fn calculate_reached_and_size_used(step: &MoveStep) -> (bool, U256) {
    let size_cost = if step.improve_balance {
        step.current.size.saturating_sub(step.to.size)
    } else {
        step.to.size.saturating_sub(step.current.size)
    };
    let reached = step.size_left >= size_cost;
    let size_used = if reached { size_cost } else { step.size_left };
    (reached, size_used)
}

fn calculate_premium_rate_after_x96(step: &MoveStep, reached: bool, size_used: U256) -> I256 {
    if reached {
        return step.to.premium_rate_x96;
    }

    // slope and intercept follow the side the pool is exposed to, not the trade
    let global_side = if step.improve_balance {
        step.side
    } else {
        step.side.flip()
    };
    let (a_x248, mut b_x96) = calculate_a_x248_and_b_x96(global_side, &step.from, &step.to);

    let size_after = if step.improve_balance {
        step.current.size.saturating_sub(size_used)
    } else {
        step.current.size.saturating_add(size_used)
    };
    if global_side == Side::Long {
        b_x96 = -b_x96;
    }
    big_int_mul_div(a_x248, I256::from(size_after), I256::from(Q152), true) + b_x96
}

/// Line through the two vertices as `rate = a * size / 2^152 + b`.
pub fn calculate_a_x248_and_b_x96(
    global_side: Side,
    from: &PriceVertex,
    to: &PriceVertex,
) -> (I256, I256) {
    let (from, to) = if from.size > to.size {
        (to, from)
    } else {
        (from, to)
    };

    let size_delta = to.size - from.size;
    if size_delta.is_zero() {
        // degenerate segment: flat at `from`
        let b_x96 = match global_side {
            Side::Short => from.premium_rate_x96,
            Side::Long => -from.premium_rate_x96,
        };
        return (I256::ZERO, b_x96);
    }
    let size_delta = I256::from(size_delta);

    let a_x248 = big_int_mul_div(
        to.premium_rate_x96 - from.premium_rate_x96,
        I256::from(Q152),
        size_delta,
        true,
    );

    let numerator_part1_x96 = from.premium_rate_x96 * I256::from(to.size);
    let numerator_part2_x96 = to.premium_rate_x96 * I256::from(from.size);
    let quotient = |n: I256| n.checked_div(size_delta).unwrap_or(I256::ZERO);

    let b_x96 = match global_side {
        Side::Short => {
            if numerator_part1_x96 >= numerator_part2_x96 {
                quotient(numerator_part1_x96 - numerator_part2_x96)
            } else {
                -quotient(numerator_part2_x96 - numerator_part1_x96)
            }
        }
        Side::Long => {
            if numerator_part2_x96 >= numerator_part1_x96 {
                quotient(numerator_part2_x96 - numerator_part1_x96)
            } else {
                -quotient(numerator_part1_x96 - numerator_part2_x96)
            }
        }
    };

    (a_x248, b_x96)
}
