//! End-to-end scenarios against a realistic market snapshot.
//!
//! `fixtures/eth_market.json` is a balanced ETH pool: $1M liquidity, index
//! $2000, vertices at 0.25 / 0.5 / 1 / 2 / 5 / 10 / 20 / 40 / 80 ETH.

use chrono::{TimeZone, Utc};
use curve_risk::math::{calculate_price, parse_units, Q96};
use curve_risk::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const ETH_MARKET: &str = include_str!("../fixtures/eth_market.json");

fn market() -> MarketSnapshot {
    MarketSnapshot::from_json(ETH_MARKET).unwrap()
}

fn eth(amount: &str) -> U256 {
    parse_units(amount, 18).unwrap()
}

fn market_price(market: &MarketSnapshot, side: Side, size: &str) -> Result<Decimal, PricingError> {
    calculate_market_price(
        size,
        &market.global_liquidity_position,
        &market.price_state,
        side,
        &market.index_price_x96,
        market.base_decimals,
        market.quote_decimals,
    )
}

fn trade(market: &MarketSnapshot, side: Side, size: &str, liquidation: bool) -> UpdatePriceStateParameter {
    UpdatePriceStateParameter {
        side,
        size_delta: eth(size),
        index_price_x96: market.index_price_x96().unwrap(),
        liquidation,
    }
}

#[test]
fn balanced_pool_with_flat_curve_trades_at_index() {
    let mut vertices = [VertexConfig::default(); VERTEX_NUM];
    for v in vertices.iter_mut().skip(1) {
        v.balance_rate = 100_000_000; // 100%
    }
    let config = PriceConfig {
        max_price_impact_liquidity: U256::from(u64::MAX),
        liquidation_vertex_index: 7,
        vertices,
    };
    assert!(config.validate().is_ok());

    let index_price_x96 = I256::from(Q96);
    let mut state = MarketState {
        price_state: PriceState {
            liquidation_vertex_index: 7,
            ..PriceState::default()
        },
        global_liquidity_position: GlobalLiquidityPosition {
            side: Side::Long,
            net_size: U256::zero(),
            liquidation_buffer_net_size: U256::zero(),
            liquidity: U256::from(1_000_000u64),
        },
    };
    change_price_vertex(&mut state, &config, index_price_x96, 0, LATEST_VERTEX);
    assert_eq!(state.price_state.price_vertices[1].size, U256::from(1_000_000u64));

    let update = update_price_state(
        &state,
        &config,
        &UpdatePriceStateParameter {
            side: Side::Long,
            size_delta: U256::one(),
            index_price_x96,
            liquidation: false,
        },
    )
    .unwrap();
    assert_eq!(update.trade_price_x96, index_price_x96);
    assert_eq!(update.state.price_state.premium_rate_x96, I256::ZERO);
}

#[test]
fn long_liquidation_price_matches_hand_computation() {
    // ((10 * 2000 * 0.01 + 1 - 100) / 10 + 2000) / (1 - 0.001) = 2010.1 / 0.999
    let price = calculate_liq_price(
        Side::Long,
        dec!(100),
        dec!(10),
        dec!(2000),
        dec!(1),
        dec!(0.01),
        dec!(0.001),
    )
    .unwrap();
    assert_eq!(price, dec!(2010.1) / dec!(0.999));
    assert!(price > dec!(2012.112) && price < dec!(2012.113));
}

#[test]
fn empty_pool_always_quotes_zero() {
    let mut market = market();
    market.global_liquidity_position.liquidity = "0".to_string();
    for side in [Side::Long, Side::Short] {
        for size in ["0.001", "1", "1000000", "not a number"] {
            assert_eq!(market_price(&market, side, size).unwrap(), Decimal::ZERO);
        }
    }
    market.index_price_x96 = "garbage".to_string();
    assert_eq!(market_price(&market, Side::Long, "1").unwrap(), Decimal::ZERO);
}

#[test]
fn trade_beyond_curve_depth_fails() {
    let market = market();
    assert!(market_price(&market, Side::Long, "80").is_ok());

    let err = market_price(&market, Side::Long, "81").unwrap_err();
    assert_eq!(
        err,
        PricingError::Curve(CurveError::InsufficientLiquidity { size_left: eth("1") })
    );
    assert_eq!(err.sentinel(), "0");
}

#[test]
fn quotes_straddle_the_index() {
    let market = market();
    let index = calculate_price(market.index_price_x96().unwrap(), 18, 6).unwrap();
    assert!(index > dec!(1999.99) && index <= dec!(2000));

    let long = market_price(&market, Side::Long, "1").unwrap();
    let short = market_price(&market, Side::Short, "1").unwrap();
    assert!(long > index, "long {long}");
    assert!(short < index, "short {short}");

    // deeper fills pay more premium
    let deep = market_price(&market, Side::Long, "30").unwrap();
    assert!(deep > long);
    // 30 ETH averages about 1.5% premium
    assert!(deep > index * dec!(1.01) && deep < index * dec!(1.02), "deep {deep}");
}

#[test]
fn repeated_quotes_are_identical() {
    let market = market();
    let first = market_price(&market, Side::Short, "12.5").unwrap();
    for _ in 0..5 {
        assert_eq!(market_price(&market, Side::Short, "12.5").unwrap(), first);
    }
}

#[test]
fn closing_trade_walks_back_to_balance() {
    let market = market();
    let (state, config) = market.normalize().unwrap();

    let open = update_price_state(&state, &config, &trade(&market, Side::Long, "10", false)).unwrap();
    let pool = &open.state.global_liquidity_position;
    assert_eq!(pool.side, Side::Short);
    assert_eq!(pool.net_size, eth("10"));
    assert_eq!(open.state.price_state.current_vertex_index, 6);

    let close =
        update_price_state(&open.state, &config, &trade(&market, Side::Short, "10", false)).unwrap();
    let pool = &close.state.global_liquidity_position;
    assert!(pool.is_balanced());
    assert_eq!(close.state.price_state.current_vertex_index, 0);
    assert_eq!(close.state.price_state.premium_rate_x96, I256::ZERO);

    // the round trip costs rounding only
    assert!(close.trade_price_x96 <= open.trade_price_x96);
    assert!(open.trade_price_x96 - close.trade_price_x96 < I256::from(10i64));
}

#[test]
fn crossing_the_balance_point_flips_the_pool() {
    let market = market();
    let (state, config) = market.normalize().unwrap();

    let open = update_price_state(&state, &config, &trade(&market, Side::Long, "3", false)).unwrap();
    let flip = update_price_state(&open.state, &config, &trade(&market, Side::Short, "5", false)).unwrap();

    let pool = &flip.state.global_liquidity_position;
    assert_eq!(pool.side, Side::Long);
    assert_eq!(pool.net_size, eth("2"));
    assert_eq!(flip.size_consumed, eth("5"));
}

#[test]
fn liquidation_parks_residual_in_buffer() {
    let market = market();
    let (state, config) = market.normalize().unwrap();

    // liquidation vertex 7 sits at 20 ETH
    let update = update_price_state(&state, &config, &trade(&market, Side::Long, "30", true)).unwrap();
    assert_eq!(update.total_buffer_used, eth("10"));
    assert_eq!(update.size_consumed, eth("20"));
    assert_eq!(update.state.price_state.liquidation_buffer_net_sizes[7], eth("10"));
    let pool = &update.state.global_liquidity_position;
    assert_eq!(pool.net_size, eth("20"));
    assert_eq!(pool.liquidation_buffer_net_size, eth("10"));

    // the same size without the liquidation flag just walks further up
    let plain = update_price_state(&state, &config, &trade(&market, Side::Long, "30", false)).unwrap();
    assert!(plain.total_buffer_used.is_zero());
}

#[test]
fn snapshot_fee_schedule_and_funding_sample() {
    let market = market();
    let fees = FeeRates::from_raw(
        &market.liquidation_fee_rate_per_position,
        &market.trading_fee_rate,
        &market.liquidation_execution_fee,
    )
    .unwrap();
    assert_eq!(fees, FeeRates::default());

    let sample = market.global_funding_rate_sample.clone().unwrap();
    let same_hour = Utc.with_ymd_and_hms(2024, 3, 1, 14, 59, 59).unwrap();
    assert_eq!(sample.normalize(same_hour).sample_count, "7");
    let next_hour = Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap();
    assert_eq!(sample.normalize(next_hour).sample_count, "0");
}

#[test]
fn open_then_partially_close_with_configured_slippage() {
    let config = EngineConfig::from_toml_str(
        r#"
        environment = "mainnet"

        [slippage]
        default_percent = "0.5"
        min_auto_percent = "0.3"
        max_auto_percent = "5"
        "#,
    )
    .unwrap();
    let market = market();
    let slippage = config.slippage.default_percent;

    let open = increase_position_quote(&market, Side::Long, dec!(4), slippage).unwrap();
    assert_eq!(open.acceptable_price, open.trade_price * dec!(1.005));
    assert_eq!(open.size_delta, eth("4"));

    let position = Position::new(Side::Long, dec!(4), open.trade_price, dec!(800));
    let close = decrease_position_quote(&market, &position, dec!(1), slippage).unwrap();
    assert_eq!(close.lighten_ratio, dec!(0.25));
    // selling into a balanced pool lands below the entry: some margin is lost
    assert!(close.margin_delta < dec!(200));
    assert!(close.margin_delta > dec!(190));

    let risk = position.margin_rate(close.trade_price, &config.fees);
    assert!(risk > Decimal::ZERO && risk < Decimal::ONE);
}
