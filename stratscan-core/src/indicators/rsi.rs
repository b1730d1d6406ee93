//! Relative Strength Index (RSI).
//!
//! Average gain and average loss are plain means of the last `period` close-to-close
//! changes. RSI = 100 - 100 / (1 + avg_gain / avg_loss).
//! Lookback: period (needs period + 1 closes).
//! Edge case: avg_loss == 0 → RSI = 100.

use super::indicator::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute_raw(&self, candles: &[Candle]) -> Vec<f64> {
        let n = candles.len();
        let mut result = vec![f64::NAN; n];

        if n <= self.period {
            return result;
        }

        // changes[i] = close[i] - close[i-1]; changes[0] is unused.
        let mut changes = vec![f64::NAN; n];
        for i in 1..n {
            changes[i] = candles[i].close - candles[i - 1].close;
        }

        for i in self.period..n {
            let window = &changes[(i + 1 - self.period)..=i];
            if window.iter().any(|ch| !ch.is_finite()) {
                continue;
            }
            let gain: f64 = window.iter().filter(|&&ch| ch > 0.0).sum();
            let loss: f64 = window.iter().filter(|&&ch| ch < 0.0).map(|ch| -ch).sum();
            result[i] = compute_rsi(gain / self.period as f64, loss / self.period as f64);
        }

        result
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
