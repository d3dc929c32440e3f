//! curve-sim: quote trades against a market snapshot and size position risk.
//!
//! Runs the same pricing and risk math a client uses before submitting an
//! order, from the command line.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use curve_risk::math::{calculate_price, parse_units, DEFAULT_PRECISION};
use curve_risk::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;

const DEMO_SNAPSHOT: &str = include_str!("../fixtures/eth_market.json");

#[derive(Parser)]
#[command(name = "curve-sim")]
#[command(about = "Price-impact curve and position risk simulator", long_about = None)]
struct Cli {
    /// Optional TOML config (precision, slippage, fees)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Quote a trade against a market snapshot
    Quote {
        /// Market snapshot JSON file
        #[arg(long)]
        snapshot: PathBuf,
        /// long or short
        #[arg(long)]
        side: Side,
        /// Size in base token units
        #[arg(long)]
        size: Decimal,
        /// Slippage tolerance in percent (defaults to the configured value)
        #[arg(long)]
        slippage: Option<Decimal>,
    },
    /// Maintenance margin, margin rate and liquidation price of a position
    Risk {
        #[arg(long)]
        side: Side,
        #[arg(long)]
        size: Decimal,
        #[arg(long)]
        entry_price: Decimal,
        #[arg(long)]
        margin: Decimal,
        /// Current price used for P&L and the closing fee
        #[arg(long)]
        price: Decimal,
    },
    /// Run built-in scenarios against a sample market
    Demo,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = load_config(cli.config.as_deref())?;
    info!(environment = ?config.environment, "configuration loaded");

    match cli.command {
        Commands::Quote {
            snapshot,
            side,
            size,
            slippage,
        } => {
            let json = std::fs::read_to_string(&snapshot)
                .with_context(|| format!("reading snapshot {}", snapshot.display()))?;
            let market = MarketSnapshot::from_json(&json).context("parsing snapshot")?;
            let slippage = slippage.unwrap_or(config.slippage.default_percent);
            run_quote(&market, side, size, slippage)?;
        }
        Commands::Risk {
            side,
            size,
            entry_price,
            margin,
            price,
        } => {
            let position = Position::new(side, size, entry_price, margin);
            run_risk(&position, price, &config.fees)?;
        }
        Commands::Demo => run_demo(&config)?,
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    Ok(EngineConfig::from_toml_str(&text)?)
}

fn run_quote(market: &MarketSnapshot, side: Side, size: Decimal, slippage: Decimal) -> Result<()> {
    let quote = increase_position_quote(market, side, size, slippage)?;
    println!("  {} {} @ index {}", side, size, market.index_price);
    println!("  Trade price:      {}", quote.trade_price);
    println!("  Acceptable price: {} ({}% slippage)", quote.acceptable_price, slippage);
    println!("  Acceptable X96:   {}", quote.acceptable_price_x96);

    // proposed curve state after the trade
    let (state, config) = market.normalize()?;
    let update = update_price_state(
        &state,
        &config,
        &UpdatePriceStateParameter {
            side,
            size_delta: parse_units(&size.to_string(), DEFAULT_PRECISION)?,
            index_price_x96: market.index_price_x96()?,
            liquidation: false,
        },
    )?;
    let price_state = &update.state.price_state;
    let position = &update.state.global_liquidity_position;
    println!(
        "  Pool after:       {} net {} (vertex {}, premium X96 {})",
        position.side, position.net_size, price_state.current_vertex_index, price_state.premium_rate_x96
    );
    Ok(())
}

fn run_risk(position: &Position, price: Decimal, fees: &FeeRates) -> Result<()> {
    println!(
        "  {} {} @ {} with {} margin",
        position.side, position.size, position.entry_price, position.margin
    );
    println!("  Unrealized P&L:     {}", position.unrealized_pnl(price));
    println!("  Maintenance margin: {}", position.maintenance_margin(price, fees));
    println!("  Margin rate:        {}", position.margin_rate(price, fees));
    println!("  Leverage:           {}", position.leverage());
    match position.liquidation_price(fees) {
        Ok(liq) => println!("  Liquidation price:  {}", liq),
        Err(err) => println!("  Liquidation price:  n/a ({})", err),
    }
    Ok(())
}

fn run_demo(config: &EngineConfig) -> Result<()> {
    println!("Curve Pricing Simulation");
    println!("ETH market, $1M liquidity, index $2000\n");

    let market = MarketSnapshot::from_json(DEMO_SNAPSHOT).context("parsing demo snapshot")?;

    scenario_1_price_impact(&market)?;
    scenario_2_slippage_quotes(&market, config)?;
    scenario_3_risk(config)?;
    scenario_4_depth_limit(&market);

    println!("\nAll simulations completed successfully.");
    Ok(())
}

/// Premium grows with size as the trade walks up the curve.
fn scenario_1_price_impact(market: &MarketSnapshot) -> Result<()> {
    println!("Scenario 1: Price Impact By Size\n");
    for size in [dec!(0.1), dec!(1), dec!(5), dec!(20), dec!(60)] {
        let long = calculate_market_price(
            &size.to_string(),
            &market.global_liquidity_position,
            &market.price_state,
            Side::Long,
            &market.index_price_x96,
            market.base_decimals,
            market.quote_decimals,
        )?;
        let short = calculate_market_price(
            &size.to_string(),
            &market.global_liquidity_position,
            &market.price_state,
            Side::Short,
            &market.index_price_x96,
            market.base_decimals,
            market.quote_decimals,
        )?;
        println!("  {:>5} ETH  long {:.4}  short {:.4}", size, long, short);
    }
    let index = calculate_price(market.index_price_x96()?, market.base_decimals, market.quote_decimals)?;
    println!("  index      {:.4}\n", index);
    Ok(())
}

/// Acceptable prices for opening and closing under the configured tolerance.
fn scenario_2_slippage_quotes(market: &MarketSnapshot, config: &EngineConfig) -> Result<()> {
    println!("Scenario 2: Quotes With Slippage\n");
    let slippage = config.slippage.default_percent;

    let open = increase_position_quote(market, Side::Long, dec!(2), slippage)?;
    println!("  Open LONG 2 ETH: trade {:.4}, accept up to {:.4}", open.trade_price, open.acceptable_price);

    let position = Position::new(Side::Long, dec!(2), open.trade_price, dec!(400));
    let close = decrease_position_quote(market, &position, dec!(1), slippage)?;
    println!(
        "  Close half: trade {:.4}, accept down to {:.4}, margin back {:.4}\n",
        close.trade_price, close.acceptable_price, close.margin_delta
    );
    Ok(())
}

fn scenario_3_risk(config: &EngineConfig) -> Result<()> {
    println!("Scenario 3: Position Risk\n");
    let position = Position::new(Side::Long, dec!(10), dec!(2000), dec!(1000));
    run_risk(&position, dec!(1950), &config.fees)?;
    println!();
    Ok(())
}

fn scenario_4_depth_limit(market: &MarketSnapshot) {
    println!("Scenario 4: Trade Beyond Curve Depth\n");
    let result = calculate_market_price(
        "500",
        &market.global_liquidity_position,
        &market.price_state,
        Side::Long,
        &market.index_price_x96,
        market.base_decimals,
        market.quote_decimals,
    );
    match result {
        Ok(price) => println!("  500 ETH filled at {}", price),
        Err(err) => println!("  500 ETH rejected: {} (sentinel {})", err, err.sentinel()),
    }
}
