//! StratScan Runner — backtest orchestration, parameter sweeps, metrics, scoring.
//!
//! This crate builds on `stratscan-core` to provide:
//! - Candle loading from CSV with row-level rejection counts
//! - Single-backtest runner producing serializable results
//! - Performance analyzer (return, Sharpe, drawdown, profit factor, expectancy)
//! - Parallel, failure-isolated parameter sweeps with cancellation and progress
//! - Multi-factor strategy scoring, ranking, and candidate gating
//! - TOML sweep configuration
//! - Sweep jobs: several strategy grids across several timeframes

pub mod config;
pub mod data_loader;
pub mod job;
pub mod metrics;
pub mod runner;
pub mod scoring;
pub mod sweep;

pub use config::{
    ConfigError, GridConfig, ParamValues, SweepConfig, TimeframeConfig, DEFAULT_TIMEFRAME,
};
pub use data_loader::{load_candles_csv, read_candles, LoadError, LoadedCandles};
pub use job::{JobError, JobOutcome, SkippedTimeframe, SweepJob, TimeframeRun};
pub use metrics::{analyze, PerformanceMetrics};
pub use runner::{run_backtest, run_backtest_with_indicators, BacktestResult, RunError};
pub use scoring::{score, RiskLevel, ScoreBreakdown, Scorer, ScoringConfig, StrategyScore};
pub use sweep::{
    precompute_indicators, ParamGrid, SweepError, SweepFailure, SweepOutcome, SweepProgress,
    SweepRunner,
};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn performance_metrics_is_send_sync() {
        assert_send::<PerformanceMetrics>();
        assert_sync::<PerformanceMetrics>();
    }

    #[test]
    fn backtest_result_is_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
    }

    #[test]
    fn sweep_types_are_send_sync() {
        assert_send::<SweepRunner>();
        assert_sync::<SweepRunner>();
        assert_send::<ParamGrid>();
        assert_sync::<ParamGrid>();
        assert_send::<SweepOutcome>();
        assert_sync::<SweepOutcome>();
        assert_send::<SweepFailure>();
        assert_sync::<SweepFailure>();
    }

    #[test]
    fn job_types_are_send_sync() {
        assert_send::<SweepJob>();
        assert_sync::<SweepJob>();
        assert_send::<JobOutcome>();
        assert_sync::<JobOutcome>();
        assert_send::<JobError>();
        assert_sync::<JobError>();
    }

    #[test]
    fn scoring_types_are_send_sync() {
        assert_send::<Scorer>();
        assert_sync::<Scorer>();
        assert_send::<StrategyScore>();
        assert_sync::<StrategyScore>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<SweepConfig>();
        assert_sync::<SweepConfig>();
        assert_send::<ScoringConfig>();
        assert_sync::<ScoringConfig>();
        assert_send::<LoadedCandles>();
        assert_sync::<LoadedCandles>();
    }

    #[test]
    fn error_types_are_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
        assert_send::<LoadError>();
        assert_sync::<LoadError>();
        assert_send::<ConfigError>();
        assert_sync::<ConfigError>();
    }
}
