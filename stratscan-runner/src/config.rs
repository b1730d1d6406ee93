//! Sweep configuration loaded from TOML.
//!
//! A single grid on a single timeframe can be written inline:
//!
//! ```toml
//! symbol = "BTCUSDT"
//! timeframe = "1h"
//! strategy = "trend_crossover"
//! data = "data/btcusdt_1h.csv"
//! threads = 4
//!
//! [params]
//! fast_period = [5, 10, 15]
//! slow_period = [20, 50]
//! ma_type = 1
//!
//! [simulator]
//! fee_rate = 0.001
//!
//! [scoring]
//! min_trades = 20
//! ```
//!
//! A job over several strategy kinds and timeframes lists them as tables;
//! every grid runs on every timeframe and all results are ranked together:
//!
//! ```toml
//! symbol = "BTCUSDT"
//!
//! [[strategies]]
//! kind = "oscillator"
//! params = { oversold = [25, 30, 35] }
//!
//! [[strategies]]
//! kind = "mean_reversion"
//!
//! [[timeframes]]
//! label = "15m"
//! data = "data/btcusdt_15m.csv"
//!
//! [[timeframes]]
//! label = "1h"
//! data = "data/btcusdt_1h.csv"
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stratscan_core::simulator::InvalidSimulatorConfig;
use stratscan_core::{SimulatorConfig, StrategyDefinition, StrategyError, StrategyKind};

use crate::scoring::{InvalidScoringConfig, ScoringConfig};
use crate::sweep::ParamGrid;

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Strategy(#[from] StrategyError),

    #[error(transparent)]
    Simulator(#[from] InvalidSimulatorConfig),

    #[error(transparent)]
    Scoring(#[from] InvalidScoringConfig),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// One fixed value or a list of candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValues {
    One(f64),
    Many(Vec<f64>),
}

impl ParamValues {
    pub fn to_vec(&self) -> Vec<f64> {
        match self {
            ParamValues::One(v) => vec![*v],
            ParamValues::Many(vs) => vs.clone(),
        }
    }
}

/// Timeframe label used when none is configured.
pub const DEFAULT_TIMEFRAME: &str = "1d";

/// One strategy kind with its candidate values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridConfig {
    /// Strategy kind name, e.g. `trend_crossover`.
    pub kind: String,
    #[serde(default)]
    pub params: BTreeMap<String, ParamValues>,
}

impl GridConfig {
    fn grid(&self) -> Result<ParamGrid, ConfigError> {
        let kind: StrategyKind = self.kind.parse()?;
        let axes = self
            .params
            .iter()
            .map(|(name, values)| (name.clone(), values.to_vec()))
            .collect();
        Ok(ParamGrid::from_axes(kind, axes))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let kind: StrategyKind = self.kind.parse()?;
        for (name, values) in &self.params {
            let values = values.to_vec();
            let Some(&first) = values.first() else {
                return Err(ConfigError::Invalid(format!(
                    "{kind}: parameter '{name}' has no candidate values"
                )));
            };
            let single = StrategyDefinition::with_defaults(kind).with_param(name.as_str(), first);
            if let Err(err @ StrategyError::UnknownParam { .. }) = single.rule() {
                return Err(err.into());
            }
        }
        Ok(())
    }
}

/// A timeframe label and the candle file holding its bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeframeConfig {
    pub label: String,
    #[serde(default)]
    pub data: Option<PathBuf>,
}

/// A parameter sweep on one symbol: one or more strategy grids, run on one
/// or more timeframes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepConfig {
    pub symbol: String,
    /// Inline timeframe label; defaults to `1d`.
    #[serde(default)]
    pub timeframe: Option<String>,
    /// Inline strategy kind name.
    #[serde(default)]
    pub strategy: Option<String>,
    /// Inline candle CSV; may be overridden on the command line.
    #[serde(default)]
    pub data: Option<PathBuf>,
    /// Candidate values for the inline strategy.
    #[serde(default)]
    pub params: BTreeMap<String, ParamValues>,
    #[serde(default)]
    pub strategies: Vec<GridConfig>,
    #[serde(default)]
    pub timeframes: Vec<TimeframeConfig>,
    #[serde(default)]
    pub simulator: SimulatorConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    /// Worker pool size; all cores when absent.
    #[serde(default)]
    pub threads: Option<usize>,
}

impl SweepConfig {
    /// Load and validate a sweep configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a sweep configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Strategy grids in configuration order; the inline grid comes first.
    pub fn grid_configs(&self) -> Vec<GridConfig> {
        let inline = self.strategy.as_ref().map(|kind| GridConfig {
            kind: kind.clone(),
            params: self.params.clone(),
        });
        inline.into_iter().chain(self.strategies.iter().cloned()).collect()
    }

    /// Expanded candidate grids, one per configured strategy.
    pub fn grids(&self) -> Result<Vec<ParamGrid>, ConfigError> {
        self.grid_configs().iter().map(GridConfig::grid).collect()
    }

    /// Timeframes in configuration order.
    ///
    /// Without a `[[timeframes]]` list this is the inline `timeframe` and
    /// `data` pair.
    pub fn timeframe_configs(&self) -> Vec<TimeframeConfig> {
        if !self.timeframes.is_empty() {
            return self.timeframes.clone();
        }
        vec![TimeframeConfig {
            label: self.timeframe.clone().unwrap_or_else(|| DEFAULT_TIMEFRAME.to_string()),
            data: self.data.clone(),
        }]
    }

    /// Check everything that does not depend on a particular combination.
    ///
    /// Values that are only invalid in combination (e.g. fast >= slow) are left
    /// for the sweep, which records them as failed combinations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("symbol must not be empty".into()));
        }
        if self.threads == Some(0) {
            return Err(ConfigError::Invalid("threads must be >= 1".into()));
        }

        if self.strategy.is_none() && !self.params.is_empty() {
            return Err(ConfigError::Invalid("[params] needs an inline `strategy`".into()));
        }
        let grids = self.grid_configs();
        if grids.is_empty() {
            return Err(ConfigError::Invalid("no strategy configured".into()));
        }
        for grid in &grids {
            grid.validate()?;
        }

        if !self.timeframes.is_empty() && (self.timeframe.is_some() || self.data.is_some()) {
            return Err(ConfigError::Invalid(
                "use either inline `timeframe`/`data` or [[timeframes]], not both".into(),
            ));
        }
        let mut labels = HashSet::new();
        for timeframe in self.timeframe_configs() {
            if timeframe.label.trim().is_empty() {
                return Err(ConfigError::Invalid("timeframe label must not be empty".into()));
            }
            if !labels.insert(timeframe.label.clone()) {
                return Err(ConfigError::Invalid(format!("duplicate timeframe '{}'", timeframe.label)));
            }
        }

        self.simulator.validate()?;
        self.scoring.validate()?;
        Ok(())
    }
}
