//! Parameter sweep — grid expansion and parallel, failure-isolated execution.
//!
//! Every indicator the grid needs is computed once, up front, and shared
//! read-only across workers. Each combination then runs on a bounded rayon
//! pool; a combination that returns an error or panics is recorded as a
//! [`SweepFailure`] and the rest of the sweep carries on. An indicator that
//! panics during precompute is left out of the shared set, and the
//! combinations reading it recompute it inside their own guard.

use std::collections::{BTreeMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use stratscan_core::{Candle, Indicator, IndicatorSeries, IndicatorSet, SimulatorConfig, StrategyDefinition, StrategyKind};

use crate::runner::{run_backtest, run_backtest_with_indicators, BacktestResult, RunError};

/// Errors that prevent a sweep from starting at all.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

// ─── Grid ────────────────────────────────────────────────────────────

/// Candidate values per parameter for one strategy kind.
///
/// Axes are kept in a `BTreeMap`, so expansion order is deterministic:
/// lexicographic by parameter name, last axis varying fastest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    kind: StrategyKind,
    axes: BTreeMap<String, Vec<f64>>,
}

impl ParamGrid {
    /// A grid with no axes: expands to the single all-defaults definition.
    pub fn new(kind: StrategyKind) -> Self {
        Self {
            kind,
            axes: BTreeMap::new(),
        }
    }

    pub fn from_axes(kind: StrategyKind, axes: BTreeMap<String, Vec<f64>>) -> Self {
        Self { kind, axes }
    }

    /// Builder-style axis setter; replaces any existing candidates for `name`.
    pub fn with_axis(mut self, name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        self.axes.insert(name.into(), values.into_iter().collect());
        self
    }

    pub fn kind(&self) -> StrategyKind {
        self.kind
    }

    pub fn axes(&self) -> &BTreeMap<String, Vec<f64>> {
        &self.axes
    }

    /// Number of combinations. An axis with no candidates empties the grid.
    pub fn size(&self) -> usize {
        self.axes.values().map(Vec::len).product()
    }

    /// Expand the Cartesian product into strategy definitions.
    pub fn definitions(&self) -> Vec<StrategyDefinition> {
        let mut combos: Vec<BTreeMap<String, f64>> = vec![BTreeMap::new()];
        for (name, values) in &self.axes {
            combos = combos
                .into_iter()
                .flat_map(|base| {
                    values.iter().map(move |&value| {
                        let mut params = base.clone();
                        params.insert(name.clone(), value);
                        params
                    })
                })
                .collect();
        }
        combos
            .into_iter()
            .map(|params| StrategyDefinition::new(self.kind, params))
            .collect()
    }
}

// ─── Outcome ─────────────────────────────────────────────────────────

/// A combination that produced no result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepFailure {
    pub strategy: StrategyDefinition,
    pub error: String,
}

/// Everything a sweep produced, in combination order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepOutcome {
    pub results: Vec<BacktestResult>,
    pub failures: Vec<SweepFailure>,
    /// Combinations never started because the sweep was cancelled.
    pub cancelled: usize,
}

impl SweepOutcome {
    /// Dispatched combinations: results + failures + cancelled.
    pub fn total(&self) -> usize {
        self.results.len() + self.failures.len() + self.cancelled
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled > 0
    }
}

/// Progress snapshot passed to the progress callback after each combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepProgress {
    pub completed: usize,
    pub total: usize,
}

pub type ProgressCallback = dyn Fn(SweepProgress) + Send + Sync;

enum Slot {
    Done(Box<BacktestResult>),
    Failed(SweepFailure),
    Cancelled,
}

// ─── Runner ──────────────────────────────────────────────────────────

/// Parameter sweep executor.
///
/// Runs one isolated backtest per combination on a bounded worker pool.
pub struct SweepRunner {
    config: SimulatorConfig,
    timeframe: String,
    threads: Option<usize>,
    cancel: Arc<AtomicBool>,
    progress: Option<Arc<ProgressCallback>>,
}

impl SweepRunner {
    pub fn new(config: SimulatorConfig, timeframe: impl Into<String>) -> Self {
        Self {
            config,
            timeframe: timeframe.into(),
            threads: None,
            cancel: Arc::new(AtomicBool::new(false)),
            progress: None,
        }
    }

    /// Bound the worker pool. `None` uses one worker per available core.
    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    /// Share an externally owned cancellation flag.
    pub fn with_cancel_token(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Invoke `callback` after each combination completes or fails.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(SweepProgress) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Handle that cancels the sweep when set to `true`.
    ///
    /// Workers check it between combinations; finished results are kept.
    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Sweep every combination in `grid` over `candles`.
    pub fn run(&self, candles: &[Candle], grid: &ParamGrid) -> Result<SweepOutcome, SweepError> {
        self.run_definitions(candles, &grid.definitions())
    }

    /// Sweep an explicit list of definitions.
    pub fn run_definitions(
        &self,
        candles: &[Candle],
        definitions: &[StrategyDefinition],
    ) -> Result<SweepOutcome, SweepError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads.unwrap_or(0))
            .build()?;

        let started = Instant::now();
        info!(
            combinations = definitions.len(),
            threads = pool.current_num_threads(),
            candles = candles.len(),
            "sweep started"
        );

        let outcome = pool.install(|| {
            let indicators = precompute_indicators(candles, definitions);
            self.execute(definitions, |def| {
                let required = def.required_indicators()?;
                if required.iter().all(|indicator| indicators.contains(indicator.name())) {
                    run_backtest_with_indicators(candles, &indicators, def, &self.config, &self.timeframe)
                } else {
                    run_backtest(candles, def, &self.config, &self.timeframe)
                }
            })
        });

        info!(
            results = outcome.results.len(),
            failures = outcome.failures.len(),
            cancelled = outcome.cancelled,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "sweep finished"
        );
        Ok(outcome)
    }

    /// Run `job` for every definition on the current pool, isolating failures.
    fn execute<F>(&self, definitions: &[StrategyDefinition], job: F) -> SweepOutcome
    where
        F: Fn(&StrategyDefinition) -> Result<BacktestResult, RunError> + Sync,
    {
        let total = definitions.len();
        let completed = AtomicUsize::new(0);

        let slots: Vec<Slot> = definitions
            .par_iter()
            .map(|def| {
                if self.cancel.load(Ordering::Relaxed) {
                    return Slot::Cancelled;
                }
                let slot = match panic::catch_unwind(AssertUnwindSafe(|| job(def))) {
                    Ok(Ok(result)) => Slot::Done(Box::new(result)),
                    Ok(Err(err)) => Slot::Failed(failure(def, err.to_string())),
                    Err(payload) => Slot::Failed(failure(def, panic_message(payload.as_ref()))),
                };
                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(progress) = &self.progress {
                    progress(SweepProgress { completed: done, total });
                }
                slot
            })
            .collect();

        let mut outcome = SweepOutcome::default();
        for slot in slots {
            match slot {
                Slot::Done(result) => outcome.results.push(*result),
                Slot::Failed(failure) => outcome.failures.push(failure),
                Slot::Cancelled => outcome.cancelled += 1,
            }
        }
        outcome
    }
}

/// Compute, once, every distinct indicator the definitions read.
///
/// Definitions with invalid parameters contribute nothing here; they fail
/// individually when their combination runs. An indicator whose computation
/// panics is logged and omitted.
pub fn precompute_indicators(candles: &[Candle], definitions: &[StrategyDefinition]) -> IndicatorSet {
    let mut seen = HashSet::new();
    let unique: Vec<Box<dyn Indicator>> = definitions
        .iter()
        .filter_map(|def| def.required_indicators().ok())
        .flatten()
        .filter(|indicator| seen.insert(indicator.name().to_string()))
        .collect();

    let series: Vec<Option<IndicatorSeries>> = unique
        .par_iter()
        .map(|indicator| match panic::catch_unwind(AssertUnwindSafe(|| indicator.compute(candles))) {
            Ok(series) => Some(series),
            Err(payload) => {
                warn!(
                    indicator = indicator.name(),
                    error = %panic_message(payload.as_ref()),
                    "indicator precompute failed"
                );
                None
            }
        })
        .collect();
    series.into_iter().flatten().collect()
}

fn failure(def: &StrategyDefinition, error: String) -> SweepFailure {
    warn!(
        strategy = %def.kind(),
        params = ?def.params(),
        error = %error,
        "combination failed"
    );
    SweepFailure {
        strategy: def.clone(),
        error,
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn make_candles(n: usize) -> Vec<Candle> {
        let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| {
                let close = 100.0 + 8.0 * (i as f64 * 0.3).sin() + 0.05 * i as f64;
                Candle {
                    timestamp: base + Duration::hours(i as i64),
                    open: close - 0.2,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1_000.0,
                }
            })
            .collect()
    }

    #[test]
    fn grid_expands_cartesian_product_in_order() {
        let grid = ParamGrid::new(StrategyKind::TrendCrossover)
            .with_axis("fast_period", [5.0, 10.0])
            .with_axis("slow_period", [20.0, 30.0, 40.0]);
        assert_eq!(grid.size(), 6);

        let defs = grid.definitions();
        assert_eq!(defs.len(), 6);
        let pairs: Vec<(f64, f64)> = defs
            .iter()
            .map(|d| (d.param("fast_period").unwrap(), d.param("slow_period").unwrap()))
            .collect();
        assert_eq!(
            pairs,
            vec![(5.0, 20.0), (5.0, 30.0), (5.0, 40.0), (10.0, 20.0), (10.0, 30.0), (10.0, 40.0)]
        );
    }

    #[test]
    fn grid_without_axes_is_one_default_definition() {
        let grid = ParamGrid::new(StrategyKind::Oscillator);
        assert_eq!(grid.size(), 1);
        assert_eq!(grid.definitions(), vec![StrategyDefinition::with_defaults(StrategyKind::Oscillator)]);
    }

    #[test]
    fn empty_axis_empties_grid() {
        let grid = ParamGrid::new(StrategyKind::Oscillator)
            .with_axis("rsi_period", [7.0, 14.0])
            .with_axis("oversold", Vec::<f64>::new());
        assert_eq!(grid.size(), 0);
        assert!(grid.definitions().is_empty());
    }

    #[test]
    fn precompute_dedupes_shared_indicators() {
        let candles = make_candles(50);
        let grid = ParamGrid::new(StrategyKind::TrendCrossover)
            .with_axis("fast_period", [5.0, 10.0])
            .with_axis("slow_period", [20.0, 30.0]);
        let set = precompute_indicators(&candles, &grid.definitions());
        // sma_5, sma_10, sma_20, sma_30
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn sweep_matches_individual_runs() {
        let candles = make_candles(150);
        let config = SimulatorConfig::default();
        let grid = ParamGrid::new(StrategyKind::Oscillator)
            .with_axis("rsi_period", [5.0, 9.0])
            .with_axis("oversold", [25.0, 35.0]);

        let outcome = SweepRunner::new(config.clone(), "1h").with_threads(Some(2)).run(&candles, &grid).unwrap();
        assert_eq!(outcome.results.len(), 4);
        for (result, def) in outcome.results.iter().zip(grid.definitions()) {
            let direct = run_backtest(&candles, &def, &config, "1h").unwrap();
            assert_eq!(result, &direct);
        }
    }

    #[test]
    fn panicking_job_is_isolated() {
        let defs = ParamGrid::new(StrategyKind::Oscillator)
            .with_axis("rsi_period", [5.0, 6.0, 7.0])
            .definitions();
        let candles = make_candles(40);
        let config = SimulatorConfig::default();
        let runner = SweepRunner::new(config.clone(), "1h").with_threads(Some(2));

        let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let outcome = pool.install(|| {
            runner.execute(&defs, |def| {
                if def.param("rsi_period") == Some(6.0) {
                    panic!("boom");
                }
                run_backtest(&candles, def, &config, "1h")
            })
        });

        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].strategy.param("rsi_period"), Some(6.0));
        assert!(outcome.failures[0].error.contains("boom"));
    }

    #[test]
    fn absurd_period_fails_alone() {
        let candles = make_candles(80);
        let grid = ParamGrid::new(StrategyKind::Oscillator).with_axis("rsi_period", [14.0, 1e30]);

        let outcome = SweepRunner::new(SimulatorConfig::default(), "1h")
            .with_threads(Some(2))
            .run(&candles, &grid)
            .unwrap();

        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].strategy.param("rsi_period"), Some(1e30));
        assert!(outcome.failures[0].error.contains("rsi_period"));
    }

    #[test]
    fn progress_reports_every_combination() {
        let candles = make_candles(60);
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let grid = ParamGrid::new(StrategyKind::Breakout).with_axis("breakout_period", [10.0, 15.0, 20.0]);

        let outcome = SweepRunner::new(SimulatorConfig::default(), "1h")
            .with_progress(move |p| {
                assert_eq!(p.total, 3);
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .run(&candles, &grid)
            .unwrap();

        assert_eq!(outcome.total(), 3);
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn pre_cancelled_sweep_runs_nothing() {
        let candles = make_candles(60);
        let cancel = Arc::new(AtomicBool::new(true));
        let grid = ParamGrid::new(StrategyKind::Oscillator).with_axis("rsi_period", [5.0, 7.0, 9.0]);

        let outcome = SweepRunner::new(SimulatorConfig::default(), "1h")
            .with_cancel_token(cancel)
            .run(&candles, &grid)
            .unwrap();

        assert!(outcome.results.is_empty());
        assert_eq!(outcome.cancelled, 3);
        assert!(outcome.was_cancelled());
    }
}
