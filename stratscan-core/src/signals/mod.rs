//! Signal generation — maps a typed rule plus precomputed indicators to a
//! directional series.
//!
//! Signals are portfolio-agnostic: they receive candle history and indicator
//! values, never position state. A value of 0 means "no new directional
//! signal", not "go flat".
//!
//! Every rule reads indicators at bar i and i-1 only. If a value it needs at
//! bar i is undefined, the bar emits 0. Level rules that compare against bar
//! i-1 also emit 0 when that value is undefined; the crossover rule instead
//! treats an undefined bar i-1 as having no prior relation.

pub mod breakout;
pub mod crossover;
pub mod hybrid;
pub mod mean_reversion;
pub mod momentum;
pub mod oscillator;

pub use breakout::ChannelBreakout;
pub use crossover::TrendCrossover;
pub use hybrid::MomentumOscillatorHybrid;
pub use mean_reversion::BandMeanReversion;
pub use momentum::RocMomentum;
pub use oscillator::RsiOscillator;

use crate::domain::{Candle, Side};
use crate::indicators::IndicatorSet;
use crate::strategy::StrategyRule;

/// Aligned series of {-1, 0, +1}, one per candle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignalSeries {
    values: Vec<i8>,
}

impl SignalSeries {
    /// All-zero series of length `len`.
    pub fn flat(len: usize) -> Self {
        Self {
            values: vec![0; len],
        }
    }

    /// Build from raw values, clamping each to its sign.
    pub fn from_values(values: impl IntoIterator<Item = i8>) -> Self {
        Self {
            values: values.into_iter().map(i8::signum).collect(),
        }
    }

    /// Signal at `index`; 0 when out of range.
    pub fn get(&self, index: usize) -> i8 {
        self.values.get(index).copied().unwrap_or(0)
    }

    pub fn set(&mut self, index: usize, side: Side) {
        self.values[index] = match side {
            Side::Long => 1,
            Side::Short => -1,
        };
    }

    pub fn values(&self) -> &[i8] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of bars carrying a non-zero signal.
    pub fn active_count(&self) -> usize {
        self.values.iter().filter(|&&v| v != 0).count()
    }
}

/// Trait for per-bar signal rules.
///
/// # Architecture invariant
/// `evaluate` may only use `candles[..=index]` and indicator values at
/// `index` and `index - 1`.
pub trait SignalRule: Send + Sync {
    /// Human-readable name (e.g., "trend_crossover").
    fn name(&self) -> &str;

    /// Evaluate the rule at `index`. `None` means no signal.
    fn evaluate(&self, candles: &[Candle], index: usize, indicators: &IndicatorSet)
        -> Option<Side>;
}

/// Build the runtime rule for a typed strategy rule.
pub fn create_rule(rule: &StrategyRule) -> Box<dyn SignalRule> {
    match *rule {
        StrategyRule::TrendCrossover {
            fast_period,
            slow_period,
            ma_type,
            crossover_threshold,
            crossunder_threshold,
        } => Box::new(TrendCrossover::new(
            fast_period,
            slow_period,
            ma_type,
            crossover_threshold,
            crossunder_threshold,
        )),
        StrategyRule::Oscillator {
            rsi_period,
            oversold,
            overbought,
        } => Box::new(RsiOscillator::new(rsi_period, oversold, overbought)),
        StrategyRule::MeanReversion {
            bb_period,
            bb_std,
            buy_threshold,
            sell_threshold,
        } => Box::new(BandMeanReversion::new(
            bb_period,
            bb_std,
            buy_threshold,
            sell_threshold,
        )),
        StrategyRule::Breakout {
            breakout_period,
            atr_period,
            atr_multiplier,
        } => Box::new(ChannelBreakout::new(breakout_period, atr_period, atr_multiplier)),
        StrategyRule::Momentum {
            momentum_period,
            momentum_threshold,
            volume_period,
            volume_threshold,
        } => Box::new(RocMomentum::new(
            momentum_period,
            momentum_threshold,
            volume_period,
            volume_threshold,
        )),
        StrategyRule::MomentumOscillatorHybrid {
            momentum_period,
            momentum_threshold,
            rsi_period,
            oversold,
            overbought,
        } => Box::new(MomentumOscillatorHybrid::new(
            momentum_period,
            momentum_threshold,
            rsi_period,
            oversold,
            overbought,
        )),
    }
}

/// Produce the signal series for `rule` over `candles`.
///
/// `indicators` must hold every series `rule.required_indicators()` names;
/// a missing series reads as undefined and yields no signals.
pub fn generate(candles: &[Candle], indicators: &IndicatorSet, rule: &StrategyRule) -> SignalSeries {
    let evaluator = create_rule(rule);
    let mut series = SignalSeries::flat(candles.len());
    for index in 1..candles.len() {
        if let Some(side) = evaluator.evaluate(candles, index, indicators) {
            series.set(index, side);
        }
    }
    series
}
