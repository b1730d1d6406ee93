//! Backtest runner — wires together strategy rule, signals, simulator, and metrics.
//!
//! Two entry points:
//! - `run_backtest()`: computes the rule's indicators, then runs. Used by the CLI `run` command.
//! - `run_backtest_with_indicators()`: takes a precomputed indicator set. Used by the sweep,
//!   which computes every indicator once and shares it across workers.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use stratscan_core::simulator::InvalidSimulatorConfig;
use stratscan_core::{
    generate, simulate, Candle, IndicatorSet, SimulatorConfig, StrategyDefinition, StrategyError,
    StrategyId, Trade,
};

use crate::metrics::{analyze, PerformanceMetrics};

/// Errors from a single backtest.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunError {
    #[error("strategy error: {0}")]
    Strategy(#[from] StrategyError),
    #[error(transparent)]
    Simulator(#[from] InvalidSimulatorConfig),
}

/// Current schema version for persisted results.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub strategy_id: StrategyId,
    pub strategy: StrategyDefinition,
    pub timeframe: String,
    pub metrics: PerformanceMetrics,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<f64>,
    pub bar_count: usize,
    /// Bars carrying a non-zero signal.
    pub signal_count: usize,
    /// Entry signals the simulator could not fund.
    pub skipped_entries: usize,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestResult {
    pub fn total_return(&self) -> f64 {
        self.metrics.total_return
    }

    pub fn trade_count(&self) -> usize {
        self.metrics.trade_count
    }
}

/// Run one strategy over a candle series.
///
/// A parameter window longer than the series is not an error: it yields a
/// zero-trade result with a flat equity curve.
pub fn run_backtest(
    candles: &[Candle],
    strategy: &StrategyDefinition,
    config: &SimulatorConfig,
    timeframe: &str,
) -> Result<BacktestResult, RunError> {
    let required = strategy.required_indicators()?;
    let indicators = IndicatorSet::compute_all(candles, &required);
    run_backtest_with_indicators(candles, &indicators, strategy, config, timeframe)
}

/// Run one strategy against indicators computed ahead of time.
///
/// `indicators` may hold series for other strategies too; only the names this
/// rule reads are consulted. Risk parameters in the definition override `config`.
pub fn run_backtest_with_indicators(
    candles: &[Candle],
    indicators: &IndicatorSet,
    strategy: &StrategyDefinition,
    config: &SimulatorConfig,
    timeframe: &str,
) -> Result<BacktestResult, RunError> {
    let rule = strategy.rule()?;
    let config = config.with_overrides(&strategy.risk_overrides()?);
    config.validate()?;

    let signals = generate(candles, indicators, &rule);
    let outcome = simulate(candles, &signals, &config);
    let metrics = analyze(&outcome.trades, &outcome.equity_curve);

    let strategy_id = strategy.id();
    debug!(
        strategy = %strategy,
        id = strategy_id.short(),
        trades = metrics.trade_count,
        total_return = metrics.total_return,
        "backtest complete"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        strategy_id,
        strategy: strategy.clone(),
        timeframe: timeframe.to_string(),
        metrics,
        trades: outcome.trades,
        equity_curve: outcome.equity_curve,
        bar_count: candles.len(),
        signal_count: signals.active_count(),
        skipped_entries: outcome.skipped_entries,
    })
}
