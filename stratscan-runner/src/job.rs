//! Sweep job — every configured strategy grid on every configured timeframe.
//!
//! Timeframes run one after another; within a timeframe all grids share one
//! candle series, one indicator precompute, and one worker pool. A timeframe
//! whose candles cannot be loaded is skipped and reported, the rest still run.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use stratscan_core::StrategyDefinition;

use crate::config::{ConfigError, SweepConfig};
use crate::data_loader::load_candles_csv;
use crate::runner::BacktestResult;
use crate::sweep::{SweepError, SweepFailure, SweepOutcome, SweepRunner};

/// Errors that stop a job before or between timeframes.
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sweep(#[from] SweepError),
}

/// Sweep outcome for one timeframe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeframeRun {
    pub timeframe: String,
    pub data: PathBuf,
    pub candles: usize,
    /// Input rows rejected by the loader.
    pub skipped_rows: usize,
    pub outcome: SweepOutcome,
}

/// A timeframe that produced no sweep at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedTimeframe {
    pub timeframe: String,
    pub reason: String,
}

/// Everything a job produced, in configuration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobOutcome {
    pub runs: Vec<TimeframeRun>,
    pub skipped: Vec<SkippedTimeframe>,
}

impl JobOutcome {
    /// Every result across timeframes, ready for [`crate::Scorer::rank`].
    pub fn results(&self) -> impl Iterator<Item = &BacktestResult> {
        self.runs.iter().flat_map(|run| run.outcome.results.iter())
    }

    pub fn failures(&self) -> impl Iterator<Item = &SweepFailure> {
        self.runs.iter().flat_map(|run| run.outcome.failures.iter())
    }

    pub fn cancelled(&self) -> usize {
        self.runs.iter().map(|run| run.outcome.cancelled).sum()
    }

    pub fn result_count(&self) -> usize {
        self.runs.iter().map(|run| run.outcome.results.len()).sum()
    }
}

/// Runs a [`SweepConfig`] end to end: load, sweep, collect.
pub struct SweepJob {
    config: SweepConfig,
    threads: Option<usize>,
    data_override: Option<PathBuf>,
    cancel: Arc<AtomicBool>,
}

impl SweepJob {
    pub fn new(config: SweepConfig) -> Self {
        let threads = config.threads;
        Self {
            config,
            threads,
            data_override: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Override the configured worker pool size.
    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        if threads.is_some() {
            self.threads = threads;
        }
        self
    }

    /// Candle file for a single-timeframe job, replacing the configured one.
    pub fn with_data(mut self, data: PathBuf) -> Result<Self, ConfigError> {
        if self.config.timeframe_configs().len() > 1 {
            return Err(ConfigError::Invalid(
                "a data override needs a single timeframe; set `data` per [[timeframes]] entry".into(),
            ));
        }
        self.data_override = Some(data);
        Ok(self)
    }

    pub fn with_cancel_token(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Combinations per timeframe.
    pub fn combinations(&self) -> Result<usize, ConfigError> {
        Ok(self.config.grids()?.iter().map(|grid| grid.size()).sum())
    }

    pub fn run(&self) -> Result<JobOutcome, JobError> {
        let definitions: Vec<StrategyDefinition> = self
            .config
            .grids()?
            .iter()
            .flat_map(|grid| grid.definitions())
            .collect();

        let mut job = JobOutcome::default();
        for timeframe in self.config.timeframe_configs() {
            let label = timeframe.label;
            let Some(path) = self.data_override.clone().or(timeframe.data) else {
                job.skipped.push(skip(&label, "no candle data configured".to_string()));
                continue;
            };
            if self.cancel.load(Ordering::Relaxed) {
                job.skipped.push(skip(&label, "cancelled".to_string()));
                continue;
            }

            let loaded = match load_candles_csv(&path) {
                Ok(loaded) => loaded,
                Err(err) => {
                    job.skipped.push(skip(&label, err.to_string()));
                    continue;
                }
            };
            info!(
                symbol = %self.config.symbol,
                timeframe = %label,
                candles = loaded.candles.len(),
                skipped_rows = loaded.skipped,
                combinations = definitions.len(),
                "timeframe started"
            );

            let outcome = SweepRunner::new(self.config.simulator.clone(), label.clone())
                .with_threads(self.threads)
                .with_cancel_token(Arc::clone(&self.cancel))
                .run_definitions(&loaded.candles, &definitions)?;

            job.runs.push(TimeframeRun {
                timeframe: label,
                data: path,
                candles: loaded.candles.len(),
                skipped_rows: loaded.skipped,
                outcome,
            });
        }
        Ok(job)
    }
}

fn skip(timeframe: &str, reason: String) -> SkippedTimeframe {
    warn!(timeframe, reason = %reason, "timeframe skipped");
    SkippedTimeframe {
        timeframe: timeframe.to_string(),
        reason,
    }
}
