//! Vertex regeneration from the static price config.

use tracing::debug;

use crate::math::{mul_div_u256, I256, Q96, U256};
use crate::types::Rounding;
use crate::vertex::{
    MarketState, PriceConfig, PriceVertex, VertexConfig, LATEST_VERTEX, VERTEX_BASIS_POINT_DIVISOR,
};

/// Vertex coordinates for one config entry: size is `balance_rate` of the
/// liquidity expressed in base units at `index_price_x96`.
pub fn calculate_price_vertex(
    vertex_config: &VertexConfig,
    liquidity: U256,
    index_price_x96: I256,
) -> PriceVertex {
    let divisor = U256::from(VERTEX_BASIS_POINT_DIVISOR);
    let balance_x96 = Q96 * U256::from(vertex_config.balance_rate) / divisor;
    let size = index_price_x96
        .to_u256()
        .and_then(|index_price| mul_div_u256(balance_x96, liquidity, index_price, Rounding::Down))
        .unwrap_or_default();
    let premium_rate_x96 = I256::from(Q96 * U256::from(vertex_config.premium_rate) / divisor);
    PriceVertex::new(size, premium_rate_x96)
}

/// Regenerates vertices `(start_exclusive, end_inclusive]`. A vertex that
/// would not rise above its predecessor collapses onto it, and if the last
/// regenerated vertex then blocks its stored successor the range extends to
/// `LATEST_VERTEX`.
pub fn change_price_vertex(
    state: &mut MarketState,
    config: &PriceConfig,
    index_price_x96: I256,
    start_exclusive: usize,
    end_inclusive: usize,
) {
    let liquidity = state
        .global_liquidity_position
        .liquidity
        .min(config.max_price_impact_liquidity);
    let vertices = &mut state.price_state.price_vertices;

    let mut end = end_inclusive.min(LATEST_VERTEX);
    if end < LATEST_VERTEX && vertices[end].blocks(&vertices[end + 1]) {
        end = LATEST_VERTEX;
    }
    debug!(start_exclusive, end, %liquidity, "regenerating price vertices");

    let mut index = start_exclusive + 1;
    while index <= end {
        let mut vertex = calculate_price_vertex(&config.vertices[index], liquidity, index_price_x96);
        if index > 1 {
            let previous = vertices[index - 1];
            if previous.blocks(&vertex) {
                vertex = previous;
            }
        }
        vertices[index] = vertex;

        if index == end && end < LATEST_VERTEX && vertex.blocks(&vertices[index + 1]) {
            debug!(index, "vertex collapsed onto successor, extending to latest");
            end = LATEST_VERTEX;
        }
        index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;
    use crate::vertex::{GlobalLiquidityPosition, PriceState, VERTEX_NUM};

    fn config() -> PriceConfig {
        let mut vertices = [VertexConfig::default(); VERTEX_NUM];
        for (i, v) in vertices.iter_mut().enumerate().skip(1) {
            v.balance_rate = i as u64 * 6_250_000; // 1/16 per vertex
            v.premium_rate = i as u64 * 100_000; // 0.1% per vertex
        }
        PriceConfig {
            max_price_impact_liquidity: U256::from(10_000_000u64),
            liquidation_vertex_index: 7,
            vertices,
        }
    }

    fn market(liquidity: u64) -> MarketState {
        MarketState {
            price_state: PriceState::default(),
            global_liquidity_position: GlobalLiquidityPosition {
                side: Side::Long,
                net_size: U256::zero(),
                liquidation_buffer_net_size: U256::zero(),
                liquidity: U256::from(liquidity),
            },
        }
    }

    fn index_price() -> I256 {
        I256::from(Q96)
    }

    #[test]
    fn vertex_from_config() {
        let vertex = calculate_price_vertex(
            &VertexConfig {
                balance_rate: 50_000_000,
                premium_rate: 1_000_000,
            },
            U256::from(1_000_000u64),
            index_price(),
        );
        assert_eq!(vertex.size, U256::from(500_000u64));
        assert_eq!(vertex.premium_rate_x96, I256::from(Q96 / U256::from(100u64)));
    }

    #[test]
    fn non_positive_index_price_yields_zero_size() {
        let vertex = calculate_price_vertex(&config().vertices[3], U256::from(1_000u64), I256::ZERO);
        assert!(vertex.size.is_zero());
    }

    #[test]
    fn full_regeneration_is_monotonic() {
        let mut state = market(1_600_000);
        change_price_vertex(&mut state, &config(), index_price(), 0, LATEST_VERTEX);
        let vertices = &state.price_state.price_vertices;
        assert!(state.price_state.is_monotonic());
        assert_eq!(vertices[0], PriceVertex::default());
        assert_eq!(vertices[1].size, U256::from(100_000u64));
        assert_eq!(vertices[9].size, U256::from(900_000u64));
    }

    #[test]
    fn liquidity_capped_by_max_price_impact_liquidity() {
        let mut cfg = config();
        cfg.max_price_impact_liquidity = U256::from(800_000u64);
        let mut state = market(1_600_000);
        change_price_vertex(&mut state, &cfg, index_price(), 0, LATEST_VERTEX);
        assert_eq!(state.price_state.price_vertices[1].size, U256::from(50_000u64));
    }

    #[test]
    fn non_increasing_config_collapses_onto_predecessor() {
        let mut cfg = config();
        cfg.vertices[4].premium_rate = cfg.vertices[3].premium_rate;
        let mut state = market(1_600_000);
        change_price_vertex(&mut state, &cfg, index_price(), 0, LATEST_VERTEX);
        let vertices = &state.price_state.price_vertices;
        assert_eq!(vertices[4], vertices[3]);
        assert!(state.price_state.is_monotonic());
    }

    #[test]
    fn partial_regeneration_cascades_when_successor_blocks() {
        let mut state = market(1_600_000);
        change_price_vertex(&mut state, &config(), index_price(), 0, LATEST_VERTEX);

        // liquidity doubles; regenerating only (0, 2] would leave vertex 2
        // above the stale vertex 3, so the whole tail is rebuilt
        state.global_liquidity_position.liquidity = U256::from(3_200_000u64);
        change_price_vertex(&mut state, &config(), index_price(), 0, 2);
        let vertices = &state.price_state.price_vertices;
        assert_eq!(vertices[2].size, U256::from(400_000u64));
        assert_eq!(vertices[9].size, U256::from(1_800_000u64));
        assert!(state.price_state.is_monotonic());
    }

    #[test]
    fn partial_regeneration_stays_in_range_when_consistent() {
        let mut state = market(1_600_000);
        change_price_vertex(&mut state, &config(), index_price(), 0, LATEST_VERTEX);

        // smaller liquidity keeps vertex 2 below the stored vertex 3
        state.global_liquidity_position.liquidity = U256::from(1_440_000u64);
        change_price_vertex(&mut state, &config(), index_price(), 0, 2);
        let vertices = &state.price_state.price_vertices;
        assert_eq!(vertices[2].size, U256::from(180_000u64));
        assert_eq!(vertices[3].size, U256::from(300_000u64));
    }
}
