//! Strategy definitions — a closed set of rule kinds plus a parameter map.
//!
//! A [`StrategyDefinition`] is immutable once built. Its identity is a BLAKE3
//! hash of the canonical JSON form (kind name + sorted parameters), so two
//! definitions with equal parameters always share an id.

pub mod rules;

pub use rules::{MaType, RiskOverrides, StrategyRule};

use crate::indicators::Indicator;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors from parsing a strategy kind or validating its parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StrategyError {
    #[error("unknown strategy kind: {0}")]
    UnknownKind(String),
    #[error("unknown parameter '{name}' for {kind} strategy")]
    UnknownParam { kind: StrategyKind, name: String },
    #[error("invalid parameter '{name}' = {value}: {reason}")]
    InvalidParam {
        name: String,
        value: f64,
        reason: String,
    },
}

// ─── Kind ────────────────────────────────────────────────────────────

/// The closed enumeration of rule families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Momentum,
    MeanReversion,
    TrendCrossover,
    Oscillator,
    Breakout,
    MomentumOscillatorHybrid,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 6] = [
        StrategyKind::Momentum,
        StrategyKind::MeanReversion,
        StrategyKind::TrendCrossover,
        StrategyKind::Oscillator,
        StrategyKind::Breakout,
        StrategyKind::MomentumOscillatorHybrid,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::Momentum => "momentum",
            StrategyKind::MeanReversion => "mean_reversion",
            StrategyKind::TrendCrossover => "trend_crossover",
            StrategyKind::Oscillator => "oscillator",
            StrategyKind::Breakout => "breakout",
            StrategyKind::MomentumOscillatorHybrid => "momentum_oscillator_hybrid",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = StrategyError;

    /// Accepts snake_case or kebab-case names, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        StrategyKind::ALL
            .into_iter()
            .find(|k| k.name() == normalized)
            .ok_or_else(|| StrategyError::UnknownKind(s.to_string()))
    }
}

// ─── Identity ────────────────────────────────────────────────────────

/// Deterministic strategy identity (hex BLAKE3 of kind + parameters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StrategyId(pub String);

impl StrategyId {
    /// First 12 hex characters, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── Definition ──────────────────────────────────────────────────────

/// A strategy: rule kind plus named numeric parameters.
///
/// Uses `BTreeMap` for deterministic key ordering during serialization → hashing.
/// Missing parameters fall back to per-kind defaults when the rule is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyDefinition {
    kind: StrategyKind,
    params: BTreeMap<String, f64>,
}

impl StrategyDefinition {
    pub fn new(kind: StrategyKind, params: BTreeMap<String, f64>) -> Self {
        Self { kind, params }
    }

    /// A definition with no explicit parameters (all defaults).
    pub fn with_defaults(kind: StrategyKind) -> Self {
        Self::new(kind, BTreeMap::new())
    }

    /// Builder-style parameter setter; returns a new definition.
    pub fn with_param(mut self, name: impl Into<String>, value: f64) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    pub fn kind(&self) -> StrategyKind {
        self.kind
    }

    pub fn params(&self) -> &BTreeMap<String, f64> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<f64> {
        self.params.get(name).copied()
    }

    /// Identity hash over kind + parameters.
    ///
    /// Canonical serialization: keys are sorted (BTreeMap) and the JSON is deterministic.
    pub fn id(&self) -> StrategyId {
        let canonical = serde_json::json!({
            "kind": self.kind.name(),
            "params": &self.params,
        });
        StrategyId(blake3::hash(canonical.to_string().as_bytes()).to_hex().to_string())
    }

    /// Human-readable label, e.g. `trend_crossover(fast_period=5, slow_period=20)`.
    pub fn label(&self) -> String {
        let params: Vec<String> = self.params.iter().map(|(k, v)| format!("{k}={v}")).collect();
        format!("{}({})", self.kind, params.join(", "))
    }

    /// Validate parameters and build the typed rule.
    pub fn rule(&self) -> Result<StrategyRule, StrategyError> {
        StrategyRule::from_definition(self)
    }

    /// Risk settings carried in the parameter map.
    pub fn risk_overrides(&self) -> Result<RiskOverrides, StrategyError> {
        RiskOverrides::from_params(&self.params)
    }

    /// Indicators the rule reads, ready for precomputation.
    pub fn required_indicators(&self) -> Result<Vec<Box<dyn Indicator>>, StrategyError> {
        Ok(self.rule()?.required_indicators())
    }
}

impl fmt::Display for StrategyDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
