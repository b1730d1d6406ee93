//! Trend crossover — fast MA crossing a scaled slow MA.
//!
//! Long when the fast MA moves from `<= slow * crossover_threshold` to
//! `> slow * crossover_threshold`. Short on the symmetric crossunder with its
//! own `crossunder_threshold`.
//!
//! The first bar where both averages are defined has no prior relation, so it
//! fires whenever the fast MA already sits beyond the threshold. A trend that
//! is under way when the slow window fills is therefore still entered.

use super::SignalRule;
use crate::domain::{Candle, Side};
use crate::indicators::{Indicator, IndicatorSet};
use crate::strategy::MaType;

/// Moving average crossover signal rule.
///
/// # Indicator dependencies
/// - Fast: `{sma|ema}_{fast_period}`
/// - Slow: `{sma|ema}_{slow_period}`
#[derive(Debug, Clone)]
pub struct TrendCrossover {
    pub crossover_threshold: f64,
    pub crossunder_threshold: f64,
    fast_key: String,
    slow_key: String,
}

impl TrendCrossover {
    pub fn new(
        fast_period: usize,
        slow_period: usize,
        ma_type: MaType,
        crossover_threshold: f64,
        crossunder_threshold: f64,
    ) -> Self {
        assert!(
            slow_period > fast_period,
            "slow_period must be > fast_period"
        );
        Self {
            crossover_threshold,
            crossunder_threshold,
            fast_key: ma_type.indicator(fast_period).name().to_string(),
            slow_key: ma_type.indicator(slow_period).name().to_string(),
        }
    }
}

impl SignalRule for TrendCrossover {
    fn name(&self) -> &str {
        "trend_crossover"
    }

    fn evaluate(&self, _candles: &[Candle], index: usize, indicators: &IndicatorSet) -> Option<Side> {
        let fast_cur = indicators.get(&self.fast_key, index)?;
        let slow_cur = indicators.get(&self.slow_key, index)?;
        let prev = index.checked_sub(1).and_then(|p| {
            Some((indicators.get(&self.fast_key, p)?, indicators.get(&self.slow_key, p)?))
        });

        let up = self.crossover_threshold;
        let down = self.crossunder_threshold;
        let (was_above, was_below) = match prev {
            Some((fast_prev, slow_prev)) => (fast_prev > slow_prev * up, fast_prev < slow_prev * down),
            None => (false, false),
        };

        if !was_above && fast_cur > slow_cur * up {
            return Some(Side::Long);
        }
        if !was_below && fast_cur < slow_cur * down {
            return Some(Side::Short);
        }
        None
    }
}
