//! RSI oscillator — level-based mean reversion on RSI.
//!
//! Long while RSI < oversold, short while RSI > overbought.

use super::SignalRule;
use crate::domain::{Candle, Side};
use crate::indicators::{Indicator, IndicatorSet, Rsi};

#[derive(Debug, Clone)]
pub struct RsiOscillator {
    pub oversold: f64,
    pub overbought: f64,
    rsi_key: String,
}

impl RsiOscillator {
    pub fn new(rsi_period: usize, oversold: f64, overbought: f64) -> Self {
        Self {
            oversold,
            overbought,
            rsi_key: Rsi::new(rsi_period).name().to_string(),
        }
    }
}

impl SignalRule for RsiOscillator {
    fn name(&self) -> &str {
        "oscillator"
    }

    fn evaluate(&self, _candles: &[Candle], index: usize, indicators: &IndicatorSet) -> Option<Side> {
        let (rsi, _) = indicators.pair(&self.rsi_key, index)?;
        if rsi < self.oversold {
            Some(Side::Long)
        } else if rsi > self.overbought {
            Some(Side::Short)
        } else {
            None
        }
    }
}
