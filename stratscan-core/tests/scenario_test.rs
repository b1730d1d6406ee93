//! End-to-end scenarios through indicators → signals → simulator.

use chrono::{Duration, TimeZone, Utc};
use stratscan_core::indicators::IndicatorSet;
use stratscan_core::signals::{generate, SignalSeries};
use stratscan_core::simulator::{simulate, SimulationOutcome, SimulatorConfig};
use stratscan_core::strategy::{StrategyDefinition, StrategyKind};
use stratscan_core::{Candle, ExitReason, Side};

fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                timestamp: base + Duration::days(i as i64),
                open,
                high: open.max(close) * 1.002,
                low: open.min(close) * 0.998,
                close,
                volume: 10_000.0,
            }
        })
        .collect()
}

fn run(candles: &[Candle], def: &StrategyDefinition, config: &SimulatorConfig) -> SimulationOutcome {
    let rule = def.rule().unwrap();
    let indicators = IndicatorSet::compute_all(candles, &def.required_indicators().unwrap());
    let signals = generate(candles, &indicators, &rule);
    simulate(candles, &signals, config)
}

/// Strictly increasing: a slow linear drift, then 3% per bar growth.
fn rising_then_accelerating() -> Vec<f64> {
    let mut closes: Vec<f64> = (0..30).map(|i| 100.0 + 0.1 * i as f64).collect();
    let pivot = closes[29];
    closes.extend((1..=20).map(|k| pivot * 1.03_f64.powi(k)));
    closes
}

#[test]
fn flat_series_mean_reversion_makes_no_trades() {
    let candles = candles_from_closes(&[100.0; 30]);
    let def = StrategyDefinition::with_defaults(StrategyKind::MeanReversion);
    let out = run(&candles, &def, &SimulatorConfig::default());

    assert!(out.trades.is_empty());
    assert_eq!(out.equity_curve.len(), 30);
    assert!(out.equity_curve.iter().all(|&e| e == 100_000.0));
}

#[test]
fn increasing_series_crossover_makes_one_long() {
    let closes = rising_then_accelerating();
    assert_eq!(closes.len(), 50);
    assert!(closes.windows(2).all(|w| w[1] > w[0]));

    let candles = candles_from_closes(&closes);
    let def = StrategyDefinition::with_defaults(StrategyKind::TrendCrossover)
        .with_param("fast_period", 5.0)
        .with_param("slow_period", 20.0);
    let out = run(&candles, &def, &SimulatorConfig::default());

    assert_eq!(out.trades.len(), 1, "trades: {:?}", out.trades);
    let trade = &out.trades[0];
    assert_eq!(trade.side, Side::Long);
    assert_eq!(trade.exit_reason, ExitReason::ForcedClose);
    assert!(trade.pnl > 0.0);
    assert!(out.trades.iter().all(|t| t.side != Side::Short));
}

fn assert_single_long_from_crossover(closes: &[f64]) {
    assert_eq!(closes.len(), 50);
    assert!(closes.windows(2).all(|w| w[1] > w[0]));

    let candles = candles_from_closes(closes);
    let def = StrategyDefinition::with_defaults(StrategyKind::TrendCrossover)
        .with_param("fast_period", 5.0)
        .with_param("slow_period", 20.0);
    let out = run(&candles, &def, &SimulatorConfig::default());

    assert_eq!(out.trades.len(), 1, "trades: {:?}", out.trades);
    let trade = &out.trades[0];
    assert_eq!(trade.side, Side::Long);
    // Entered as soon as the slow window fills
    assert_eq!(trade.entry_index, 19);
    assert_eq!(trade.exit_index, 49);
    assert_eq!(trade.exit_reason, ExitReason::ForcedClose);
    assert!(trade.pnl > 0.0);
}

#[test]
fn linear_rise_crossover_makes_one_long() {
    let closes: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
    assert_single_long_from_crossover(&closes);
}

#[test]
fn geometric_rise_crossover_makes_one_long() {
    let closes: Vec<f64> = (0..50).map(|i| 100.0 * 1.01_f64.powi(i)).collect();
    assert_single_long_from_crossover(&closes);
}

#[test]
fn round_trip_costs_at_flat_price() {
    // $1,000 notional, fee 0.1%, slippage 0.05%
    let candles = candles_from_closes(&[100.0; 5]);
    let signals = SignalSeries::from_values([0, 1, 0, -1, 0]);
    let config = SimulatorConfig {
        initial_capital: 10_000.0,
        position_fraction: 0.1,
        fee_rate: 0.001,
        slippage_rate: 0.0005,
        allow_short: false,
        ..SimulatorConfig::default()
    };
    let frictionless = SimulatorConfig {
        fee_rate: 0.0,
        slippage_rate: 0.0,
        ..config.clone()
    };

    let costly = simulate(&candles, &signals, &config);
    let free = simulate(&candles, &signals, &frictionless);

    assert_eq!(costly.trades.len(), 1);
    assert_eq!(costly.trades[0].exit_reason, ExitReason::SignalReversal);
    let entry_notional = costly.trades[0].entry_price * costly.trades[0].quantity;
    assert!((entry_notional - 1_000.0).abs() < 1e-9);

    let reduction = free.trades[0].pnl - costly.trades[0].pnl;
    assert!(reduction >= 1.5, "reduction was {reduction}");
}

#[test]
fn window_longer_than_series_yields_no_trades() {
    let candles = candles_from_closes(&[100.0, 105.0, 95.0, 110.0, 90.0]);
    for kind in StrategyKind::ALL {
        let def = StrategyDefinition::with_defaults(kind);
        let out = run(&candles, &def, &SimulatorConfig::default());
        assert!(out.trades.is_empty(), "{kind} traded on 5 candles");
        assert_eq!(out.equity_curve.len(), 5);
    }
}

#[test]
fn oscillator_trades_a_swing() {
    // Sell-off drives RSI under 30, rally drives it over 70.
    let mut closes: Vec<f64> = (0..7).map(|i| 100.0 - 2.0 * i as f64).collect();
    closes.extend((1..=10).map(|k| 88.0 + 3.0 * k as f64));
    let candles = candles_from_closes(&closes);
    let def = StrategyDefinition::with_defaults(StrategyKind::Oscillator)
        .with_param("rsi_period", 5.0);
    let out = run(&candles, &def, &SimulatorConfig::default());

    assert!(!out.trades.is_empty());
    assert_eq!(out.trades[0].side, Side::Long);
    assert_eq!(out.trades[0].entry_index, 6);
    assert_eq!(out.trades[0].exit_reason, ExitReason::SignalReversal);
    assert_eq!(out.trades[0].exit_index, 10);
    assert!(out.trades[0].pnl > 0.0);
}

#[test]
fn stop_loss_from_strategy_params() {
    let mut closes = vec![100.0; 25];
    closes.push(130.0);
    closes.extend([128.0, 120.0, 110.0, 105.0]);
    let candles = candles_from_closes(&closes);

    let def = StrategyDefinition::with_defaults(StrategyKind::Breakout).with_param("stop_loss", 0.05);
    let config = SimulatorConfig::default().with_overrides(&def.risk_overrides().unwrap());
    let out = run(&candles, &def, &config);

    assert_eq!(out.trades.len(), 1);
    assert_eq!(out.trades[0].side, Side::Long);
    assert_eq!(out.trades[0].entry_index, 25);
    assert_eq!(out.trades[0].exit_reason, ExitReason::StopLoss);
    assert_eq!(out.trades[0].exit_index, 27);
}
