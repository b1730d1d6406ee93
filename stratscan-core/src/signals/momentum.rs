//! Rate-of-change momentum with optional volume confirmation.
//!
//! Long when ROC > threshold and, if `volume_threshold` > 0, the candle's
//! volume over its moving average exceeds `volume_threshold`.
//! Short when ROC < -threshold (no volume condition).

use super::SignalRule;
use crate::domain::{Candle, Side};
use crate::indicators::{Indicator, IndicatorSet, Roc, Sma};

#[derive(Debug, Clone)]
pub struct RocMomentum {
    pub threshold: f64,
    pub volume_threshold: f64,
    roc_key: String,
    volume_key: String,
}

impl RocMomentum {
    pub fn new(period: usize, threshold: f64, volume_period: usize, volume_threshold: f64) -> Self {
        Self {
            threshold,
            volume_threshold,
            roc_key: Roc::new(period).name().to_string(),
            volume_key: Sma::of_volume(volume_period).name().to_string(),
        }
    }

    fn volume_confirms(&self, candles: &[Candle], index: usize, indicators: &IndicatorSet) -> bool {
        if self.volume_threshold <= 0.0 {
            return true;
        }
        let Some((avg_volume, _)) = indicators.pair(&self.volume_key, index) else {
            return false;
        };
        avg_volume > 0.0
            && candles
                .get(index)
                .is_some_and(|c| c.volume / avg_volume > self.volume_threshold)
    }
}

impl SignalRule for RocMomentum {
    fn name(&self) -> &str {
        "momentum"
    }

    fn evaluate(&self, candles: &[Candle], index: usize, indicators: &IndicatorSet) -> Option<Side> {
        let (roc, _) = indicators.pair(&self.roc_key, index)?;

        if roc > self.threshold && self.volume_confirms(candles, index, indicators) {
            Some(Side::Long)
        } else if roc < -self.threshold {
            Some(Side::Short)
        } else {
            None
        }
    }
}
