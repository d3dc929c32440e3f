// curve-risk: off-chain quoting core for a curve-priced perpetual futures market.
// mirrors the contract's price-impact curve and position risk formulas so a
// client can quote a trade and size its risk before submitting it.
// all computation is deterministic with no external I/O.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: Side, Rounding
//   2.x  math/: decimal helpers, 256-bit signed ints, X96 conversions
//   3.x  vertex.rs: premium-rate curve model, price config
//   4.x  curve/: trade simulation along the curve, vertex regeneration
//   5.x  position.rs, funding.rs, liquidation.rs, margin.rs: position risk
//   6.x  snapshot.rs: wire market snapshot to curve model
//   7.x  quote.rs: slippage bands, increase / decrease quotes
//   8.x  config.rs: precision, slippage, fee defaults, env presets

// numeric core
pub mod math;
pub mod types;

// curve
pub mod curve;
pub mod vertex;

// risk
pub mod funding;
pub mod liquidation;
pub mod margin;
pub mod position;

// client integration
pub mod config;
pub mod quote;
pub mod snapshot;

// re exports for convenience
pub use curve::*;
pub use funding::*;
pub use liquidation::*;
pub use margin::*;
pub use position::*;
pub use quote::*;
pub use snapshot::*;
pub use types::*;
pub use vertex::*;
pub use config::{ConfigError, EngineConfig, Environment, PrecisionConfig, SlippageConfig};
pub use math::{NumericError, I256, U256};
