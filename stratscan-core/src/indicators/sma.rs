//! Simple Moving Average (SMA).
//!
//! Rolling mean over a lookback window of closes (or volumes).
//! Lookback: period - 1 (first valid value at index period-1).

use super::indicator::Indicator;
use crate::domain::Candle;

/// Which candle field an averaging indicator reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Close,
    Volume,
}

impl Source {
    pub fn read(self, candle: &Candle) -> f64 {
        match self {
            Source::Close => candle.close,
            Source::Volume => candle.volume,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    source: Source,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            source: Source::Close,
            name: format!("sma_{period}"),
        }
    }

    /// SMA of volume, used for volume-ratio confirmation.
    pub fn of_volume(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            source: Source::Volume,
            name: format!("volume_sma_{period}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute_raw(&self, candles: &[Candle]) -> Vec<f64> {
        let values: Vec<f64> = candles.iter().map(|c| self.source.read(c)).collect();
        sma_of_series(&values, self.period)
    }
}

/// Rolling mean of an arbitrary series. Windows containing a non-finite value are NaN.
pub fn sma_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period {
        return result;
    }

    let mut sum = 0.0;
    let mut bad_in_window = 0usize;
    for &v in values.iter().take(period) {
        if v.is_finite() {
            sum += v;
        } else {
            bad_in_window += 1;
        }
    }
    if bad_in_window == 0 {
        result[period - 1] = sum / period as f64;
    }

    // Roll the window forward, tracking how many non-finite entries it holds.
    for i in period..n {
        let leaving = values[i - period];
        let entering = values[i];
        if leaving.is_finite() {
            sum -= leaving;
        } else {
            bad_in_window -= 1;
        }
        if entering.is_finite() {
            sum += entering;
        } else {
            bad_in_window += 1;
        }
        if bad_in_window == 0 {
            result[i] = sum / period as f64;
        }
    }

    result
}
