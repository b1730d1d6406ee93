//! Bollinger band mean reversion.
//!
//! Long when close < lower band * buy_threshold; short when
//! close > upper band * sell_threshold. Thresholds of 1.0 use the bands as-is.

use super::SignalRule;
use crate::domain::{Candle, Side};
use crate::indicators::{Bollinger, Indicator, IndicatorSet};

#[derive(Debug, Clone)]
pub struct BandMeanReversion {
    pub buy_threshold: f64,
    pub sell_threshold: f64,
    upper_key: String,
    lower_key: String,
}

impl BandMeanReversion {
    pub fn new(period: usize, num_std: f64, buy_threshold: f64, sell_threshold: f64) -> Self {
        Self {
            buy_threshold,
            sell_threshold,
            upper_key: Bollinger::upper(period, num_std).name().to_string(),
            lower_key: Bollinger::lower(period, num_std).name().to_string(),
        }
    }
}

impl SignalRule for BandMeanReversion {
    fn name(&self) -> &str {
        "mean_reversion"
    }

    fn evaluate(&self, candles: &[Candle], index: usize, indicators: &IndicatorSet) -> Option<Side> {
        let (upper, _) = indicators.pair(&self.upper_key, index)?;
        let (lower, _) = indicators.pair(&self.lower_key, index)?;
        let close = candles.get(index)?.close;

        if close < lower * self.buy_threshold {
            Some(Side::Long)
        } else if close > upper * self.sell_threshold {
            Some(Side::Short)
        } else {
            None
        }
    }
}
