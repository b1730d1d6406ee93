//! Channel breakout with a volatility buffer.
//!
//! Long when close > channel_high[t-1] + atr_multiplier * ATR[t-1].
//! Short when close < channel_low[t-1] - atr_multiplier * ATR[t-1].
//! Comparing against the previous bar's channel keeps the current candle out
//! of its own threshold.

use super::SignalRule;
use crate::domain::{Candle, Side};
use crate::indicators::{Atr, Channel, Indicator, IndicatorSet};

#[derive(Debug, Clone)]
pub struct ChannelBreakout {
    pub atr_multiplier: f64,
    high_key: String,
    low_key: String,
    atr_key: String,
}

impl ChannelBreakout {
    pub fn new(period: usize, atr_period: usize, atr_multiplier: f64) -> Self {
        Self {
            atr_multiplier,
            high_key: Channel::high(period).name().to_string(),
            low_key: Channel::low(period).name().to_string(),
            atr_key: Atr::new(atr_period).name().to_string(),
        }
    }
}

impl SignalRule for ChannelBreakout {
    fn name(&self) -> &str {
        "breakout"
    }

    fn evaluate(&self, candles: &[Candle], index: usize, indicators: &IndicatorSet) -> Option<Side> {
        let (_, prev_high) = indicators.pair(&self.high_key, index)?;
        let (_, prev_low) = indicators.pair(&self.low_key, index)?;
        let (_, prev_atr) = indicators.pair(&self.atr_key, index)?;
        let close = candles.get(index)?.close;

        let buffer = self.atr_multiplier * prev_atr;
        if close > prev_high + buffer {
            Some(Side::Long)
        } else if close < prev_low - buffer {
            Some(Side::Short)
        } else {
            None
        }
    }
}
