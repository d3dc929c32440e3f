// 5.3: funding fees. the contract keeps a growth accumulator per side (X96,
// quote per unit size); a position owes the growth since it last settled.

use crate::math::int::mul_div;
use crate::math::{q96, I256, U256};
use crate::types::{Rounding, Side};

pub fn choose_funding_rate_growth_x96(
    long_funding_rate_growth_x96: I256,
    short_funding_rate_growth_x96: I256,
    side: Side,
) -> I256 {
    match side {
        Side::Long => long_funding_rate_growth_x96,
        Side::Short => short_funding_rate_growth_x96,
    }
}

// 5.4: (global - position) * size / 2^96. positive is received, negative paid.
// payments round up in magnitude, receipts round down.
pub fn calculate_funding_fee(
    global_funding_rate_growth_x96: I256,
    position_funding_rate_growth_x96: I256,
    position_size: U256,
) -> I256 {
    let delta = global_funding_rate_growth_x96 - position_funding_rate_growth_x96;
    let size = I256::from(position_size);
    if !delta.is_negative() {
        mul_div(delta, size, q96(), Rounding::Down).unwrap_or(I256::ZERO)
    } else {
        -mul_div(-delta, size, q96(), Rounding::Up).unwrap_or(I256::ZERO)
    }
}
