//! Rolling high/low channel — highest high / lowest low over a lookback window.
//!
//! Produces two series (exposed as separate Indicator instances):
//! - High: max(high[t-period+1..=t])
//! - Low: min(low[t-period+1..=t])
//!
//! Lookback: period - 1.

use super::indicator::Indicator;
use crate::domain::Candle;

/// Which edge of the channel to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelEdge {
    High,
    Low,
}

#[derive(Debug, Clone)]
pub struct Channel {
    period: usize,
    edge: ChannelEdge,
    name: String,
}

impl Channel {
    pub fn high(period: usize) -> Self {
        assert!(period >= 1, "channel period must be >= 1");
        Self {
            period,
            edge: ChannelEdge::High,
            name: format!("channel_high_{period}"),
        }
    }

    pub fn low(period: usize) -> Self {
        assert!(period >= 1, "channel period must be >= 1");
        Self {
            period,
            edge: ChannelEdge::Low,
            name: format!("channel_low_{period}"),
        }
    }
}

impl Indicator for Channel {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute_raw(&self, candles: &[Candle]) -> Vec<f64> {
        let n = candles.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period {
            return result;
        }

        for i in (self.period - 1)..n {
            let window = &candles[(i + 1 - self.period)..=i];
            result[i] = match self.edge {
                ChannelEdge::High => extreme(window.iter().map(|c| c.high), f64::max),
                ChannelEdge::Low => extreme(window.iter().map(|c| c.low), f64::min),
            };
        }

        result
    }
}

/// Fold a window with `pick`; NaN if any value is non-finite.
fn extreme(mut values: impl Iterator<Item = f64>, pick: fn(f64, f64) -> f64) -> f64 {
    let Some(first) = values.next() else {
        return f64::NAN;
    };
    let mut acc = first;
    if !acc.is_finite() {
        return f64::NAN;
    }
    for v in values {
        if !v.is_finite() {
            return f64::NAN;
        }
        acc = pick(acc, v);
    }
    acc
}
