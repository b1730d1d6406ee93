//! Bollinger Bands — moving average +/- standard deviation multiplier.
//!
//! Three bands (separate Indicator instances):
//! - Middle: SMA(close, period)
//! - Upper: middle + mult * stddev(close, period)
//! - Lower: middle - mult * stddev(close, period)
//!
//! Uses population stddev (divide by N).
//! Lookback: period - 1.

use super::indicator::Indicator;
use crate::domain::Candle;

/// Which band of the Bollinger Bands to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
    band: BollingerBand,
    name: String,
}

impl Bollinger {
    pub fn new(period: usize, multiplier: f64, band: BollingerBand) -> Self {
        assert!(period >= 1, "Bollinger period must be >= 1");
        let label = match band {
            BollingerBand::Upper => "upper",
            BollingerBand::Middle => "middle",
            BollingerBand::Lower => "lower",
        };
        Self {
            period,
            multiplier,
            band,
            name: format!("bollinger_{label}_{period}_{multiplier}"),
        }
    }

    pub fn upper(period: usize, multiplier: f64) -> Self {
        Self::new(period, multiplier, BollingerBand::Upper)
    }

    pub fn middle(period: usize, multiplier: f64) -> Self {
        Self::new(period, multiplier, BollingerBand::Middle)
    }

    pub fn lower(period: usize, multiplier: f64) -> Self {
        Self::new(period, multiplier, BollingerBand::Lower)
    }
}

impl Indicator for Bollinger {
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
            if window.iter().any(|c| !c.close.is_finite()) {
                continue;
            }

            let mean = window.iter().map(|c| c.close).sum::<f64>() / self.period as f64;
            if self.band == BollingerBand::Middle {
                result[i] = mean;
                continue;
            }

            let variance = window
                .iter()
                .map(|c| {
                    let diff = c.close - mean;
                    diff * diff
                })
                .sum::<f64>()
                / self.period as f64;
            let width = self.multiplier * variance.sqrt();

            result[i] = match self.band {
                BollingerBand::Upper => mean + width,
                BollingerBand::Lower => mean - width,
                BollingerBand::Middle => mean,
            };
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles, DEFAULT_EPSILON};

    #[test]
    fn bollinger_constant_series_has_zero_width() {
        let candles = make_candles(&[100.0; 5]);
        let upper = Bollinger::upper(3, 2.0).compute(&candles);
        let lower = Bollinger::lower(3, 2.0).compute(&candles);
        for i in 2..5 {
            assert_approx(upper.get(i).unwrap(), 100.0, DEFAULT_EPSILON);
            assert_approx(lower.get(i).unwrap(), 100.0, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn bollinger_known_values() {
        // Window [10, 12, 14]: mean 12, population variance 8/3
        let candles = make_candles(&[10.0, 12.0, 14.0]);
        let sd = (8.0_f64 / 3.0).sqrt();
        let upper = Bollinger::upper(3, 2.0).compute(&candles);
        let middle = Bollinger::middle(3, 2.0).compute(&candles);
        let lower = Bollinger::lower(3, 2.0).compute(&candles);

        assert_approx(middle.get(2).unwrap(), 12.0, DEFAULT_EPSILON);
        assert_approx(upper.get(2).unwrap(), 12.0 + 2.0 * sd, DEFAULT_EPSILON);
        assert_approx(lower.get(2).unwrap(), 12.0 - 2.0 * sd, DEFAULT_EPSILON);
        assert_eq!(upper.get(1), None);
    }

    #[test]
    fn bollinger_band_ordering() {
        let candles = make_candles(&[100.0, 103.0, 98.0, 105.0, 101.0, 99.0, 104.0]);
        let upper = Bollinger::upper(4, 2.0).compute(&candles);
        let middle = Bollinger::middle(4, 2.0).compute(&candles);
        let lower = Bollinger::lower(4, 2.0).compute(&candles);
        for i in 3..7 {
            let (u, m, l) = (upper.get(i).unwrap(), middle.get(i).unwrap(), lower.get(i).unwrap());
            assert!(u >= m && m >= l, "band order violated at {i}");
        }
    }

    #[test]
    fn bollinger_names_are_distinct_per_band() {
        assert_eq!(Bollinger::upper(20, 2.0).name(), "bollinger_upper_20_2");
        assert_eq!(Bollinger::lower(20, 2.5).name(), "bollinger_lower_20_2.5");
        assert_eq!(Bollinger::middle(20, 2.0).lookback(), 19);
    }
}
