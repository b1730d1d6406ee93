//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|).
//! ATR is the simple mean of the last `period` true ranges.
//! Lookback: period - 1 (TR[0] is defined from the first candle's range).

use super::indicator::Indicator;
use super::sma::sma_of_series;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

/// Compute the True Range series.
/// TR[0] = high[0] - low[0] (no previous close).
/// TR[t] = max(high[t]-low[t], |high[t]-close[t-1]|, |low[t]-close[t-1]|).
pub fn true_range(candles: &[Candle]) -> Vec<f64> {
    let mut tr = Vec::with_capacity(candles.len());

    for (i, c) in candles.iter().enumerate() {
        let range = c.high - c.low;
        let value = if i == 0 {
            range
        } else {
            let pc = candles[i - 1].close;
            range.max((c.high - pc).abs()).max((c.low - pc).abs())
        };
        tr.push(if value.is_finite() { value } else { f64::NAN });
    }

    tr
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute_raw(&self, candles: &[Candle]) -> Vec<f64> {
        sma_of_series(&true_range(candles), self.period)
    }
}
