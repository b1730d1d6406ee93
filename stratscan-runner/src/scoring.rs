//! Strategy scoring — weighted multi-factor composite, ranking, and candidate gate.
//!
//! Each factor is normalized before weighting so no unbounded metric can
//! dominate: return to [-1, 1], everything else to [0, 1]. The optional
//! live-vs-backtest concordance factor is supplied by the caller per strategy;
//! when absent its weight is dropped and the rest are renormalized.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use stratscan_core::{StrategyDefinition, StrategyId};
use thiserror::Error;

use crate::runner::BacktestResult;

/// Weights, normalization anchors, and candidate gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub return_weight: f64,
    pub risk_adjusted_weight: f64,
    pub consistency_weight: f64,
    pub reliability_weight: f64,
    pub concordance_weight: f64,
    /// Sharpe ratio that earns a full risk-adjusted score.
    pub sharpe_target: f64,
    /// Win rate that earns a full consistency score.
    pub win_rate_target: f64,
    /// Divisor turning drawdown into the risk-adjusted penalty (capped at 50%).
    pub drawdown_penalty_scale: f64,
    /// Trade count that earns a full reliability score.
    pub trade_count_target: usize,
    pub min_score: f64,
    pub min_trades: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            return_weight: 0.30,
            risk_adjusted_weight: 0.25,
            consistency_weight: 0.20,
            reliability_weight: 0.15,
            concordance_weight: 0.10,
            sharpe_target: 5.0,
            win_rate_target: 0.8,
            drawdown_penalty_scale: 0.3,
            trade_count_target: 50,
            min_score: 0.3,
            min_trades: 10,
        }
    }
}

/// A scoring configuration field outside its valid range.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("scoring config field '{field}' = {value}: {reason}")]
pub struct InvalidScoringConfig {
    pub field: &'static str,
    pub value: f64,
    pub reason: &'static str,
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), InvalidScoringConfig> {
        let weights = [
            ("return_weight", self.return_weight),
            ("risk_adjusted_weight", self.risk_adjusted_weight),
            ("consistency_weight", self.consistency_weight),
            ("reliability_weight", self.reliability_weight),
            ("concordance_weight", self.concordance_weight),
        ];
        for (field, value) in weights {
            if !(value.is_finite() && value >= 0.0) {
                return Err(InvalidScoringConfig {
                    field,
                    value,
                    reason: "must be finite and >= 0",
                });
            }
        }
        let base: f64 = weights[..4].iter().map(|(_, w)| w).sum();
        if base <= 0.0 {
            return Err(InvalidScoringConfig {
                field: "return_weight",
                value: base,
                reason: "non-concordance weights must not all be zero",
            });
        }

        let anchors = [
            ("sharpe_target", self.sharpe_target),
            ("win_rate_target", self.win_rate_target),
            ("drawdown_penalty_scale", self.drawdown_penalty_scale),
            ("trade_count_target", self.trade_count_target as f64),
        ];
        for (field, value) in anchors {
            if !(value.is_finite() && value > 0.0) {
                return Err(InvalidScoringConfig {
                    field,
                    value,
                    reason: "must be finite and > 0",
                });
            }
        }
        if !self.min_score.is_finite() {
            return Err(InvalidScoringConfig {
                field: "min_score",
                value: self.min_score,
                reason: "must be finite",
            });
        }
        Ok(())
    }
}

// ─── Sub-scores ──────────────────────────────────────────────────────

/// Normalized factors and the weighted composite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// In [-1, 1].
    pub return_score: f64,
    pub risk_adjusted: f64,
    pub consistency: f64,
    pub reliability: f64,
    pub concordance: Option<f64>,
    pub composite: f64,
}

/// Signed, log-compressed total return; saturates at ±1 beyond a ~191% move.
pub fn return_score(total_return: f64) -> f64 {
    let magnitude = ((1.0 + (10.0 * total_return).abs()).ln() / 3.0).min(1.0);
    magnitude.copysign(total_return)
}

/// Sharpe against its target, discounted by up to half for drawdown.
pub fn risk_adjusted_score(sharpe: f64, max_drawdown: f64, config: &ScoringConfig) -> f64 {
    let sharpe_part = (sharpe / config.sharpe_target).clamp(0.0, 1.0);
    let penalty = (max_drawdown.max(0.0) / config.drawdown_penalty_scale).min(0.5);
    sharpe_part * (1.0 - penalty)
}

pub fn consistency_score(win_rate: f64, config: &ScoringConfig) -> f64 {
    (win_rate / config.win_rate_target).clamp(0.0, 1.0)
}

pub fn reliability_score(trade_count: usize, config: &ScoringConfig) -> f64 {
    (trade_count as f64 / config.trade_count_target as f64).min(1.0)
}

/// Score one result. Concordance, when known, must be in [0, 1]; it is clamped.
pub fn breakdown(result: &BacktestResult, config: &ScoringConfig, concordance: Option<f64>) -> ScoreBreakdown {
    let m = &result.metrics;
    let return_score = return_score(m.total_return);
    let risk_adjusted = risk_adjusted_score(m.sharpe, m.max_drawdown, config);
    let consistency = consistency_score(m.win_rate, config);
    let reliability = reliability_score(m.trade_count, config);
    let concordance = concordance.filter(|c| c.is_finite()).map(|c| c.clamp(0.0, 1.0));

    let mut weighted = config.return_weight * return_score
        + config.risk_adjusted_weight * risk_adjusted
        + config.consistency_weight * consistency
        + config.reliability_weight * reliability;
    let mut total_weight =
        config.return_weight + config.risk_adjusted_weight + config.consistency_weight + config.reliability_weight;
    if let Some(c) = concordance {
        weighted += config.concordance_weight * c;
        total_weight += config.concordance_weight;
    }
    let composite = if total_weight > 0.0 {
        weighted / total_weight
    } else {
        0.0
    };

    ScoreBreakdown {
        return_score,
        risk_adjusted,
        consistency,
        reliability,
        concordance,
        composite,
    }
}

/// Composite score of one result without concordance data.
pub fn score(result: &BacktestResult, config: &ScoringConfig) -> f64 {
    breakdown(result, config, None).composite
}

// ─── Ranking ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn assess(max_drawdown: f64, sharpe: f64) -> Self {
        if max_drawdown > 0.30 || sharpe < 1.0 {
            RiskLevel::High
        } else if max_drawdown > 0.15 || sharpe < 2.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        })
    }
}

/// Suggested share of capital for a candidate with the given composite.
pub fn recommended_allocation(composite: f64) -> f64 {
    if composite >= 0.8 {
        0.30
    } else if composite >= 0.6 {
        0.20
    } else if composite >= 0.4 {
        0.10
    } else {
        0.05
    }
}

/// A scored and ranked result. Derived once per sweep; never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyScore {
    /// 1-based position in the ranking.
    pub rank: usize,
    pub strategy_id: StrategyId,
    pub strategy: StrategyDefinition,
    pub timeframe: String,
    pub score: ScoreBreakdown,
    pub total_return: f64,
    pub sharpe: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub trade_count: usize,
    /// Passed the minimum-score and minimum-trades gate.
    pub is_candidate: bool,
    /// Only set for candidates.
    pub recommended_allocation: Option<f64>,
    pub risk_level: RiskLevel,
}

impl StrategyScore {
    pub fn composite(&self) -> f64 {
        self.score.composite
    }
}

/// Scores and ranks a batch of results.
#[derive(Debug, Clone, Default)]
pub struct Scorer {
    config: ScoringConfig,
    concordance: HashMap<StrategyId, f64>,
}

impl Scorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            config,
            concordance: HashMap::new(),
        }
    }

    /// Attach a live-vs-backtest concordance value for one strategy.
    pub fn with_concordance(mut self, id: StrategyId, concordance: f64) -> Self {
        self.concordance.insert(id, concordance);
        self
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn breakdown(&self, result: &BacktestResult) -> ScoreBreakdown {
        let concordance = self.concordance.get(&result.strategy_id).copied();
        breakdown(result, &self.config, concordance)
    }

    /// Score every result and sort: composite descending, then total return descending.
    ///
    /// The sort is stable, so fully tied results keep their input order.
    /// Results from several sweeps (other kinds, other timeframes) can be
    /// chained into one ranking.
    pub fn rank<'a>(&self, results: impl IntoIterator<Item = &'a BacktestResult>) -> Vec<StrategyScore> {
        let mut scored: Vec<StrategyScore> = results.into_iter().map(|r| self.to_score(r)).collect();
        scored.sort_by(|a, b| {
            b.score
                .composite
                .total_cmp(&a.score.composite)
                .then_with(|| b.total_return.total_cmp(&a.total_return))
        });
        for (i, s) in scored.iter_mut().enumerate() {
            s.rank = i + 1;
        }
        scored
    }

    /// Ranked results that pass the candidate gate.
    pub fn candidates<'a>(&self, results: impl IntoIterator<Item = &'a BacktestResult>) -> Vec<StrategyScore> {
        self.rank(results).into_iter().filter(|s| s.is_candidate).collect()
    }

    fn to_score(&self, result: &BacktestResult) -> StrategyScore {
        let score = self.breakdown(result);
        let m = &result.metrics;
        let is_candidate = score.composite >= self.config.min_score && m.trade_count >= self.config.min_trades;
        StrategyScore {
            rank: 0,
            strategy_id: result.strategy_id.clone(),
            strategy: result.strategy.clone(),
            timeframe: result.timeframe.clone(),
            score,
            total_return: m.total_return,
            sharpe: m.sharpe,
            max_drawdown: m.max_drawdown,
            win_rate: m.win_rate,
            trade_count: m.trade_count,
            is_candidate,
            recommended_allocation: is_candidate.then(|| recommended_allocation(score.composite)),
            risk_level: RiskLevel::assess(m.max_drawdown, m.sharpe),
        }
    }
}
