// 6.0: market snapshot adapter. the wire snapshot carries decimal strings and raw
// chain integers; normalization turns it into the fixed-point curve model.
// 6.1 funding sample freshness, 6.2 balance rate.

use chrono::{DateTime, Timelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::math::{
    format_rate, parse_decimal, parse_int, parse_uint, parse_units, to_decimal_places, NumericError,
    I256, U256, DEFAULT_PRECISION, DEFAULT_QUOTE_PRECISION,
};
use crate::types::{Rounding, Side};
use crate::vertex::{
    compute_current_vertex_index, GlobalLiquidityPosition, MarketState, PriceConfig, PriceState,
    PriceVertex, VertexConfig, VERTEX_NUM,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("Numeric error: {0}")]
    Numeric(#[from] NumericError),

    #[error("{field}: expected {expected} entries, got {actual}")]
    VertexCount {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{field}: index {index} out of range")]
    IndexOutOfRange { field: &'static str, index: usize },
}

/// Static vertex parameters, raw 1e-8 integers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VertexConfigSnapshot {
    #[serde(default)]
    pub id: String,
    pub premium_rate: String,
    pub balance_rate: String,
}

impl VertexConfigSnapshot {
    pub fn normalize(&self) -> Result<VertexConfig, SnapshotError> {
        Ok(VertexConfig {
            balance_rate: parse_rate_units(&self.balance_rate)?,
            premium_rate: parse_rate_units(&self.premium_rate)?,
        })
    }
}

fn parse_rate_units(value: &str) -> Result<u64, NumericError> {
    let parsed = parse_uint(value)?;
    if parsed > U256::from(u64::MAX) {
        return Err(NumericError::OutOfRange(value.to_string()));
    }
    Ok(parsed.low_u64())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalLiquidityPositionSnapshot {
    #[serde(default)]
    pub entry_price_x96: String,
    /// quote units, decimal
    pub liquidity: String,
    /// base units, decimal
    pub net_size: String,
    pub side: Side,
    #[serde(default)]
    pub realized_profit_growth_x64: String,
    #[serde(default)]
    pub margin: String,
    #[serde(default)]
    pub trading_fee: String,
    pub liquidation_buffer_net_size: String,
    pub token_vertices: Vec<VertexConfigSnapshot>,
}

impl GlobalLiquidityPositionSnapshot {
    pub fn normalize(&self) -> Result<GlobalLiquidityPosition, SnapshotError> {
        Ok(GlobalLiquidityPosition {
            side: self.side,
            net_size: parse_units(&self.net_size, DEFAULT_PRECISION)?,
            liquidation_buffer_net_size: parse_units(
                &self.liquidation_buffer_net_size,
                DEFAULT_PRECISION,
            )?,
            liquidity: parse_units(&self.liquidity, DEFAULT_QUOTE_PRECISION)?,
        })
    }

    pub fn vertex_configs(&self) -> Result<[VertexConfig; VERTEX_NUM], SnapshotError> {
        check_len("tokenVertices", self.token_vertices.len())?;
        let mut vertices = [VertexConfig::default(); VERTEX_NUM];
        for (slot, vertex) in vertices.iter_mut().zip(&self.token_vertices) {
            *slot = vertex.normalize()?;
        }
        Ok(vertices)
    }

    /// Liquidity of the pool is zero: no curve, no price discovery.
    pub fn has_no_liquidity(&self) -> bool {
        parse_decimal(&self.liquidity).map_or(true, |liquidity| liquidity.is_zero())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceVertexSnapshot {
    #[serde(default)]
    pub id: String,
    /// base units, decimal
    pub size: String,
    /// display rate; not used for simulation
    #[serde(default)]
    pub premium_rate: String,
    pub premium_rate_x96: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceStateSnapshot {
    /// raw quote units
    pub max_price_impact_liquidity: String,
    pub premium_rate_x96: String,
    pub pending_vertex_index: usize,
    pub liquidation_vertex_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_vertex_index: Option<usize>,
    pub price_vertices: Vec<PriceVertexSnapshot>,
    pub liquidation_buffer_net_sizes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_price_x96: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basis_index_price_x96: Option<String>,
}

impl PriceStateSnapshot {
    /// `net_size` fills a missing current vertex index, `index_price_x96` a
    /// missing basis price.
    pub fn normalize(
        &self,
        net_size: U256,
        index_price_x96: I256,
    ) -> Result<PriceState, SnapshotError> {
        check_len("priceVertices", self.price_vertices.len())?;
        check_len("liquidationBufferNetSizes", self.liquidation_buffer_net_sizes.len())?;
        check_index("liquidationVertexIndex", self.liquidation_vertex_index)?;
        check_index("pendingVertexIndex", self.pending_vertex_index)?;

        let mut price_vertices = [PriceVertex::default(); VERTEX_NUM];
        for (slot, vertex) in price_vertices.iter_mut().zip(&self.price_vertices) {
            *slot = PriceVertex::new(
                parse_units(&vertex.size, DEFAULT_PRECISION)?,
                parse_int(&vertex.premium_rate_x96)?,
            );
        }
        let mut liquidation_buffer_net_sizes = [U256::zero(); VERTEX_NUM];
        for (slot, size) in liquidation_buffer_net_sizes
            .iter_mut()
            .zip(&self.liquidation_buffer_net_sizes)
        {
            *slot = parse_units(size, DEFAULT_PRECISION)?;
        }

        let current_vertex_index = match self.current_vertex_index {
            Some(index) => {
                check_index("currentVertexIndex", index)?;
                index
            }
            None => compute_current_vertex_index(net_size, &price_vertices),
        };
        let basis_index_price_x96 = match &self.basis_index_price_x96 {
            Some(value) => parse_int(value)?,
            None => index_price_x96,
        };

        Ok(PriceState {
            premium_rate_x96: parse_int(&self.premium_rate_x96)?,
            current_vertex_index,
            pending_vertex_index: self.pending_vertex_index,
            liquidation_vertex_index: self.liquidation_vertex_index,
            price_vertices,
            liquidation_buffer_net_sizes,
            basis_index_price_x96,
        })
    }

    pub fn price_config(
        &self,
        vertices: [VertexConfig; VERTEX_NUM],
    ) -> Result<PriceConfig, SnapshotError> {
        Ok(PriceConfig {
            max_price_impact_liquidity: parse_uint(&self.max_price_impact_liquidity)?,
            liquidation_vertex_index: self.liquidation_vertex_index,
            vertices,
        })
    }
}

fn check_len(field: &'static str, actual: usize) -> Result<(), SnapshotError> {
    if actual != VERTEX_NUM {
        return Err(SnapshotError::VertexCount {
            field,
            expected: VERTEX_NUM,
            actual,
        });
    }
    Ok(())
}

fn check_index(field: &'static str, index: usize) -> Result<(), SnapshotError> {
    if index >= VERTEX_NUM {
        return Err(SnapshotError::IndexOutOfRange { field, index });
    }
    Ok(())
}

/// Pool plus price state to the curve model and its static config.
pub fn normalize_market(
    position: &GlobalLiquidityPositionSnapshot,
    price_state: &PriceStateSnapshot,
    index_price_x96: I256,
) -> Result<(MarketState, PriceConfig), SnapshotError> {
    let global_liquidity_position = position.normalize()?;
    let price_state_model = price_state.normalize(global_liquidity_position.net_size, index_price_x96)?;
    let config = price_state.price_config(position.vertex_configs()?)?;
    Ok((
        MarketState {
            price_state: price_state_model,
            global_liquidity_position,
        },
        config,
    ))
}

// 6.1: funding samples only carry over within the same UTC hour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingRateSampleSnapshot {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub last_adjust_funding_rate_time: DateTime<Utc>,
    pub sample_count: String,
    pub cumulative_premium_rate_x96: String,
}

impl FundingRateSampleSnapshot {
    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        hour_bucket(self.last_adjust_funding_rate_time) == hour_bucket(now)
    }

    /// Stale samples restart at zero, stamped at minute 5 of the current hour.
    pub fn normalize(&self, now: DateTime<Utc>) -> FundingRateSampleSnapshot {
        if self.is_current(now) {
            return self.clone();
        }
        let adjusted = now
            .with_minute(5)
            .and_then(|t| t.with_second(0))
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(now);
        FundingRateSampleSnapshot {
            last_adjust_funding_rate_time: adjusted,
            sample_count: "0".to_string(),
            cumulative_premium_rate_x96: "0".to_string(),
        }
    }
}

fn hour_bucket(time: DateTime<Utc>) -> i64 {
    time.timestamp().div_euclid(3600)
}

/// Everything needed to quote one market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    #[serde(default)]
    pub address: String,
    pub global_liquidity_position: GlobalLiquidityPositionSnapshot,
    pub price_state: PriceStateSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_funding_rate_sample: Option<FundingRateSampleSnapshot>,
    /// human price
    pub index_price: String,
    pub index_price_x96: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_index_price_x96: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_index_price_x96: Option<String>,
    /// raw 1e-8 units
    #[serde(default)]
    pub trading_fee_rate: String,
    /// raw 1e-8 units
    #[serde(default)]
    pub liquidation_fee_rate_per_position: String,
    /// quote units, decimal
    #[serde(default)]
    pub liquidation_execution_fee: String,
    #[serde(default = "default_base_decimals")]
    pub base_decimals: u32,
    #[serde(default = "default_quote_decimals")]
    pub quote_decimals: u32,
}

fn default_base_decimals() -> u32 {
    DEFAULT_PRECISION
}

fn default_quote_decimals() -> u32 {
    DEFAULT_QUOTE_PRECISION
}

impl MarketSnapshot {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn index_price_x96(&self) -> Result<I256, NumericError> {
        parse_int(&self.index_price_x96)
    }

    /// Index price bound a trade on `side` executes against: max for LONG,
    /// min for SHORT. Falls back to the plain index price.
    pub fn index_price_x96_for_side(&self, side: Side) -> Result<I256, NumericError> {
        let bound = match side {
            Side::Long => self.max_index_price_x96.as_deref(),
            Side::Short => self.min_index_price_x96.as_deref(),
        };
        parse_int(bound.unwrap_or(&self.index_price_x96))
    }

    pub fn normalize(&self) -> Result<(MarketState, PriceConfig), SnapshotError> {
        normalize_market(
            &self.global_liquidity_position,
            &self.price_state,
            self.index_price_x96()?,
        )
    }

    /// Signed pool exposure over liquidity, in quote terms. Negative when the
    /// pool is LONG. Zero without liquidity.
    pub fn balance_rate(&self) -> Decimal {
        let position = &self.global_liquidity_position;
        let liquidity = parse_decimal(&position.liquidity).unwrap_or(Decimal::ZERO);
        if liquidity.is_zero() {
            return Decimal::ZERO;
        }
        let net = parse_decimal(&position.net_size).unwrap_or(Decimal::ZERO);
        let buffer = parse_decimal(&position.liquidation_buffer_net_size).unwrap_or(Decimal::ZERO);
        let index_price = parse_decimal(&self.index_price).unwrap_or(Decimal::ZERO);

        let mut total_net_size = net.checked_add(buffer).unwrap_or(Decimal::ZERO);
        if position.side == Side::Long {
            total_net_size = -total_net_size;
        }
        let net_liquidity = total_net_size
            .checked_mul(index_price)
            .map(|value| to_decimal_places(value, DEFAULT_QUOTE_PRECISION, Rounding::Down))
            .unwrap_or(Decimal::ZERO);
        net_liquidity.checked_div(liquidity).unwrap_or(Decimal::ZERO)
    }

    /// Display premium rates of the configured vertices.
    pub fn vertex_premium_rates(&self) -> Vec<Decimal> {
        self.global_liquidity_position
            .token_vertices
            .iter()
            .map(|vertex| format_rate(&vertex.premium_rate))
            .collect()
    }
}
