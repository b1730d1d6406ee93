//! Rate of Change (ROC).
//!
//! Fractional price change over N bars.
//! ROC[t] = close[t] / close[t-period] - 1
//! Lookback: period.

use super::indicator::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Roc {
    period: usize,
    name: String,
}

impl Roc {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ROC period must be >= 1");
        Self {
            period,
            name: format!("roc_{period}"),
        }
    }
}

impl Indicator for Roc {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute_raw(&self, candles: &[Candle]) -> Vec<f64> {
        let n = candles.len();
        let mut result = vec![f64::NAN; n];

        for i in self.period..n {
            let prev = candles[i - self.period].close;
            let curr = candles[i].close;
            if prev.is_finite() && curr.is_finite() && prev != 0.0 {
                result[i] = curr / prev - 1.0;
            }
        }

        result
    }
}
