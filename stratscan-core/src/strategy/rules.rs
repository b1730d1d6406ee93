//! Typed rules — validated, defaulted parameters for each strategy kind.
//!
//! The parameter map of a [`StrategyDefinition`] is loosely typed (name → f64).
//! `StrategyRule::from_definition` resolves defaults, checks every value, and
//! produces one variant per kind that the signal generator dispatches on.

use std::collections::BTreeMap;

use super::{StrategyDefinition, StrategyError, StrategyKind};
use crate::indicators::{Atr, Bollinger, Channel, Ema, Indicator, Roc, Rsi, Sma};

/// Parameter names accepted by every kind; consumed by the simulator, not the rule.
pub const RISK_PARAMS: [&str; 3] = ["stop_loss", "take_profit", "max_hold_bars"];

/// Upper bound for any indicator window.
pub const MAX_PERIOD: usize = 100_000;

/// Moving-average flavour for trend-crossover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaType {
    Sma,
    Ema,
}

impl MaType {
    pub fn indicator(self, period: usize) -> Box<dyn Indicator> {
        match self {
            MaType::Sma => Box::new(Sma::new(period)),
            MaType::Ema => Box::new(Ema::new(period)),
        }
    }
}

/// Fully resolved rule for one strategy kind.
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyRule {
    /// Fast MA crossing the slow MA scaled by a multiplier.
    TrendCrossover {
        fast_period: usize,
        slow_period: usize,
        ma_type: MaType,
        crossover_threshold: f64,
        crossunder_threshold: f64,
    },
    /// RSI level: long below oversold, short above overbought.
    Oscillator {
        rsi_period: usize,
        oversold: f64,
        overbought: f64,
    },
    /// Close outside the Bollinger bands, each band scaled by a threshold.
    MeanReversion {
        bb_period: usize,
        bb_std: f64,
        buy_threshold: f64,
        sell_threshold: f64,
    },
    /// Close beyond the previous bar's channel plus an ATR buffer.
    Breakout {
        breakout_period: usize,
        atr_period: usize,
        atr_multiplier: f64,
    },
    /// Rate of change beyond a threshold, optionally volume-confirmed on entry.
    Momentum {
        momentum_period: usize,
        momentum_threshold: f64,
        volume_period: usize,
        volume_threshold: f64,
    },
    /// Momentum entries filtered by RSI not being stretched.
    MomentumOscillatorHybrid {
        momentum_period: usize,
        momentum_threshold: f64,
        rsi_period: usize,
        oversold: f64,
        overbought: f64,
    },
}

// ─── Parameter reader ────────────────────────────────────────────────

/// Reads parameters off a map, tracking which names were consumed.
struct Params<'a> {
    kind: StrategyKind,
    map: &'a BTreeMap<String, f64>,
    known: Vec<&'static str>,
}

impl<'a> Params<'a> {
    fn new(kind: StrategyKind, map: &'a BTreeMap<String, f64>) -> Self {
        Self {
            kind,
            map,
            known: RISK_PARAMS.to_vec(),
        }
    }

    fn raw(&mut self, name: &'static str, default: f64) -> f64 {
        self.known.push(name);
        self.map.get(name).copied().unwrap_or(default)
    }

    /// Whole number in `1..=MAX_PERIOD`.
    fn period(&mut self, name: &'static str, default: usize) -> Result<usize, StrategyError> {
        let value = self.raw(name, default as f64);
        if !value.is_finite() || value < 1.0 || value > MAX_PERIOD as f64 || value.fract() != 0.0 {
            return Err(invalid(name, value, "must be a whole number in [1, 100000]"));
        }
        Ok(value as usize)
    }

    fn positive(&mut self, name: &'static str, default: f64) -> Result<f64, StrategyError> {
        let value = self.raw(name, default);
        if !value.is_finite() || value <= 0.0 {
            return Err(invalid(name, value, "must be finite and > 0"));
        }
        Ok(value)
    }

    fn non_negative(&mut self, name: &'static str, default: f64) -> Result<f64, StrategyError> {
        let value = self.raw(name, default);
        if !value.is_finite() || value < 0.0 {
            return Err(invalid(name, value, "must be finite and >= 0"));
        }
        Ok(value)
    }

    fn rsi_level(&mut self, name: &'static str, default: f64) -> Result<f64, StrategyError> {
        let value = self.raw(name, default);
        if !(0.0..=100.0).contains(&value) {
            return Err(invalid(name, value, "must be within [0, 100]"));
        }
        Ok(value)
    }

    fn ma_type(&mut self, name: &'static str) -> Result<MaType, StrategyError> {
        let value = self.raw(name, 0.0);
        if value == 0.0 {
            Ok(MaType::Sma)
        } else if value == 1.0 {
            Ok(MaType::Ema)
        } else {
            Err(invalid(name, value, "must be 0 (SMA) or 1 (EMA)"))
        }
    }

    /// Reject any name no reader asked for.
    fn finish(self) -> Result<(), StrategyError> {
        match self
            .map
            .keys()
            .find(|k| !self.known.iter().any(|n| *n == k.as_str()))
        {
            Some(name) => Err(StrategyError::UnknownParam {
                kind: self.kind,
                name: name.clone(),
            }),
            None => Ok(()),
        }
    }
}

fn invalid(name: &str, value: f64, reason: &str) -> StrategyError {
    StrategyError::InvalidParam {
        name: name.to_string(),
        value,
        reason: reason.to_string(),
    }
}

fn ordered_levels(oversold: f64, overbought: f64) -> Result<(), StrategyError> {
    if oversold >= overbought {
        return Err(invalid("oversold", oversold, "must be below overbought"));
    }
    Ok(())
}

// ─── Rule construction ───────────────────────────────────────────────

impl StrategyRule {
    pub fn from_definition(def: &StrategyDefinition) -> Result<Self, StrategyError> {
        let mut p = Params::new(def.kind(), def.params());

        let rule = match def.kind() {
            StrategyKind::TrendCrossover => {
                let fast_period = p.period("fast_period", 5)?;
                let slow_period = p.period("slow_period", 20)?;
                if fast_period >= slow_period {
                    return Err(invalid(
                        "fast_period",
                        fast_period as f64,
                        "must be below slow_period",
                    ));
                }
                StrategyRule::TrendCrossover {
                    fast_period,
                    slow_period,
                    ma_type: p.ma_type("ma_type")?,
                    crossover_threshold: p.positive("crossover_threshold", 1.01)?,
                    crossunder_threshold: p.positive("crossunder_threshold", 0.99)?,
                }
            }
            StrategyKind::Oscillator => {
                let rsi_period = p.period("rsi_period", 14)?;
                let oversold = p.rsi_level("oversold", 30.0)?;
                let overbought = p.rsi_level("overbought", 70.0)?;
                ordered_levels(oversold, overbought)?;
                StrategyRule::Oscillator {
                    rsi_period,
                    oversold,
                    overbought,
                }
            }
            StrategyKind::MeanReversion => StrategyRule::MeanReversion {
                bb_period: p.period("bb_period", 20)?,
                bb_std: p.positive("bb_std", 2.0)?,
                buy_threshold: p.positive("buy_threshold", 1.0)?,
                sell_threshold: p.positive("sell_threshold", 1.0)?,
            },
            StrategyKind::Breakout => StrategyRule::Breakout {
                breakout_period: p.period("breakout_period", 20)?,
                atr_period: p.period("atr_period", 14)?,
                atr_multiplier: p.non_negative("atr_multiplier", 2.0)?,
            },
            StrategyKind::Momentum => StrategyRule::Momentum {
                momentum_period: p.period("momentum_period", 10)?,
                momentum_threshold: p.non_negative("momentum_threshold", 0.005)?,
                volume_period: p.period("volume_period", 20)?,
                volume_threshold: p.non_negative("volume_threshold", 0.0)?,
            },
            StrategyKind::MomentumOscillatorHybrid => {
                let momentum_period = p.period("momentum_period", 10)?;
                let momentum_threshold = p.non_negative("momentum_threshold", 0.005)?;
                let rsi_period = p.period("rsi_period", 14)?;
                let oversold = p.rsi_level("oversold", 30.0)?;
                let overbought = p.rsi_level("overbought", 70.0)?;
                ordered_levels(oversold, overbought)?;
                StrategyRule::MomentumOscillatorHybrid {
                    momentum_period,
                    momentum_threshold,
                    rsi_period,
                    oversold,
                    overbought,
                }
            }
        };

        p.finish()?;
        RiskOverrides::from_params(def.params())?;
        Ok(rule)
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            StrategyRule::TrendCrossover { .. } => StrategyKind::TrendCrossover,
            StrategyRule::Oscillator { .. } => StrategyKind::Oscillator,
            StrategyRule::MeanReversion { .. } => StrategyKind::MeanReversion,
            StrategyRule::Breakout { .. } => StrategyKind::Breakout,
            StrategyRule::Momentum { .. } => StrategyKind::Momentum,
            StrategyRule::MomentumOscillatorHybrid { .. } => StrategyKind::MomentumOscillatorHybrid,
        }
    }

    /// Indicator instances this rule reads. Names match what the signal
    /// generator looks up in the indicator set.
    pub fn required_indicators(&self) -> Vec<Box<dyn Indicator>> {
        match *self {
            StrategyRule::TrendCrossover {
                fast_period,
                slow_period,
                ma_type,
                ..
            } => vec![ma_type.indicator(fast_period), ma_type.indicator(slow_period)],
            StrategyRule::Oscillator { rsi_period, .. } => vec![Box::new(Rsi::new(rsi_period))],
            StrategyRule::MeanReversion {
                bb_period, bb_std, ..
            } => vec![
                Box::new(Bollinger::upper(bb_period, bb_std)),
                Box::new(Bollinger::lower(bb_period, bb_std)),
            ],
            StrategyRule::Breakout {
                breakout_period,
                atr_period,
                ..
            } => vec![
                Box::new(Channel::high(breakout_period)),
                Box::new(Channel::low(breakout_period)),
                Box::new(Atr::new(atr_period)),
            ],
            StrategyRule::Momentum {
                momentum_period,
                volume_period,
                volume_threshold,
                ..
            } => {
                let mut out: Vec<Box<dyn Indicator>> = vec![Box::new(Roc::new(momentum_period))];
                if volume_threshold > 0.0 {
                    out.push(Box::new(Sma::of_volume(volume_period)));
                }
                out
            }
            StrategyRule::MomentumOscillatorHybrid {
                momentum_period,
                rsi_period,
                ..
            } => vec![Box::new(Roc::new(momentum_period)), Box::new(Rsi::new(rsi_period))],
        }
    }
}

// ─── Risk overrides ──────────────────────────────────────────────────

/// Protective-exit settings taken from a strategy's parameter map.
///
/// Each present field overrides the simulator configuration for that run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RiskOverrides {
    /// Adverse price move (fraction of entry) that closes the position.
    pub stop_loss: Option<f64>,
    /// Favourable price move (fraction of entry) that closes the position.
    pub take_profit: Option<f64>,
    pub max_hold_bars: Option<usize>,
}

impl RiskOverrides {
    pub fn from_params(params: &BTreeMap<String, f64>) -> Result<Self, StrategyError> {
        let fraction = |name: &str| -> Result<Option<f64>, StrategyError> {
            match params.get(name).copied() {
                None => Ok(None),
                Some(v) if v.is_finite() && v > 0.0 => Ok(Some(v)),
                Some(v) => Err(invalid(name, v, "must be finite and > 0")),
            }
        };

        let max_hold_bars = match params.get("max_hold_bars").copied() {
            None => None,
            Some(v) if v.is_finite() && v >= 1.0 && v.fract() == 0.0 => Some(v as usize),
            Some(v) => return Err(invalid("max_hold_bars", v, "must be a whole number >= 1")),
        };

        Ok(Self {
            stop_loss: fraction("stop_loss")?,
            take_profit: fraction("take_profit")?,
            max_hold_bars,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.stop_loss.is_none() && self.take_profit.is_none() && self.max_hold_bars.is_none()
    }
}
