// 3.0: the premium-rate curve. ten vertices (size, premium rate) plus the pool's
// net exposure. 3.1 has the static per-market config the vertices are regenerated from.

use crate::config::ConfigError;
use crate::math::{I256, U256};
use crate::types::Side;

pub const VERTEX_NUM: usize = 10;
pub const LATEST_VERTEX: usize = VERTEX_NUM - 1;
/// Vertex balance and premium rates are expressed in 1e-8 units.
pub const VERTEX_BASIS_POINT_DIVISOR: u64 = 100_000_000;

/// A breakpoint on the curve. Vertex 0 is always (0, 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PriceVertex {
    pub size: U256,
    pub premium_rate_x96: I256,
}

impl PriceVertex {
    pub fn new(size: U256, premium_rate_x96: I256) -> Self {
        Self {
            size,
            premium_rate_x96,
        }
    }

    /// True when `self` is not strictly below `next` in both coordinates.
    pub fn blocks(&self, next: &PriceVertex) -> bool {
        self.size >= next.size || self.premium_rate_x96 >= next.premium_rate_x96
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceState {
    /// where the pool currently sits on the curve
    pub premium_rate_x96: I256,
    /// vertex the current segment leads to
    pub current_vertex_index: usize,
    /// highest vertex waiting for recalibration
    pub pending_vertex_index: usize,
    pub liquidation_vertex_index: usize,
    pub price_vertices: [PriceVertex; VERTEX_NUM],
    pub liquidation_buffer_net_sizes: [U256; VERTEX_NUM],
    /// index price when the pool was last balanced
    pub basis_index_price_x96: I256,
}

impl Default for PriceState {
    fn default() -> Self {
        Self {
            premium_rate_x96: I256::ZERO,
            current_vertex_index: 0,
            pending_vertex_index: 0,
            liquidation_vertex_index: 0,
            price_vertices: [PriceVertex::default(); VERTEX_NUM],
            liquidation_buffer_net_sizes: [U256::zero(); VERTEX_NUM],
            basis_index_price_x96: I256::ZERO,
        }
    }
}

impl PriceState {
    /// Non-decreasing sizes and rates along the vertex order.
    pub fn is_monotonic(&self) -> bool {
        self.price_vertices.windows(2).all(|pair| {
            pair[0].size <= pair[1].size && pair[0].premium_rate_x96 <= pair[1].premium_rate_x96
        })
    }

    pub fn total_buffer_net_size(&self) -> U256 {
        self.liquidation_buffer_net_sizes
            .iter()
            .fold(U256::zero(), |acc, size| acc.saturating_add(*size))
    }
}

/// The pool's aggregate position. `side` is the side the pool is exposed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalLiquidityPosition {
    pub side: Side,
    pub net_size: U256,
    pub liquidation_buffer_net_size: U256,
    pub liquidity: U256,
}

impl GlobalLiquidityPosition {
    pub fn is_balanced(&self) -> bool {
        self.net_size.is_zero() && self.liquidation_buffer_net_size.is_zero()
    }
}

/// Pool and curve together. Simulation clones this and leaves the input alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketState {
    pub price_state: PriceState,
    pub global_liquidity_position: GlobalLiquidityPosition,
}

// 3.1: static market parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VertexConfig {
    /// share of liquidity, 1e-8 units
    pub balance_rate: u64,
    /// premium over index, 1e-8 units
    pub premium_rate: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceConfig {
    pub max_price_impact_liquidity: U256,
    pub liquidation_vertex_index: usize,
    pub vertices: [VertexConfig; VERTEX_NUM],
}

impl PriceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.liquidation_vertex_index > LATEST_VERTEX {
            return Err(ConfigError::InvalidPriceConfig {
                reason: format!(
                    "liquidation vertex index {} out of range",
                    self.liquidation_vertex_index
                ),
            });
        }
        let first = self.vertices[0];
        if first.balance_rate != 0 || first.premium_rate != 0 {
            return Err(ConfigError::InvalidPriceConfig {
                reason: "vertex 0 must be (0, 0)".to_string(),
            });
        }
        for pair in self.vertices.windows(2).skip(1) {
            if pair[0].balance_rate > pair[1].balance_rate
                || pair[0].premium_rate > pair[1].premium_rate
            {
                return Err(ConfigError::InvalidPriceConfig {
                    reason: "vertex rates must be non-decreasing".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Vertex whose segment currently holds the pool's net size: 0 for a flat
/// pool, otherwise the first vertex at or beyond `net_size`.
pub fn compute_current_vertex_index(net_size: U256, vertices: &[PriceVertex]) -> usize {
    if net_size.is_zero() {
        return 0;
    }
    vertices
        .iter()
        .position(|vertex| vertex.size >= net_size)
        .unwrap_or(LATEST_VERTEX)
}
