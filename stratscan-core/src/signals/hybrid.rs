//! Momentum entries filtered by RSI.
//!
//! Long when ROC > threshold and RSI < overbought.
//! Short when ROC < -threshold and RSI > oversold.

use super::SignalRule;
use crate::domain::{Candle, Side};
use crate::indicators::{Indicator, IndicatorSet, Roc, Rsi};

#[derive(Debug, Clone)]
pub struct MomentumOscillatorHybrid {
    pub threshold: f64,
    pub oversold: f64,
    pub overbought: f64,
    roc_key: String,
    rsi_key: String,
}

impl MomentumOscillatorHybrid {
    pub fn new(
        momentum_period: usize,
        threshold: f64,
        rsi_period: usize,
        oversold: f64,
        overbought: f64,
    ) -> Self {
        Self {
            threshold,
            oversold,
            overbought,
            roc_key: Roc::new(momentum_period).name().to_string(),
            rsi_key: Rsi::new(rsi_period).name().to_string(),
        }
    }
}

impl SignalRule for MomentumOscillatorHybrid {
    fn name(&self) -> &str {
        "momentum_oscillator_hybrid"
    }

    fn evaluate(&self, _candles: &[Candle], index: usize, indicators: &IndicatorSet) -> Option<Side> {
        let (roc, _) = indicators.pair(&self.roc_key, index)?;
        let (rsi, _) = indicators.pair(&self.rsi_key, index)?;

        if roc > self.threshold && rsi < self.overbought {
            Some(Side::Long)
        } else if roc < -self.threshold && rsi > self.oversold {
            Some(Side::Short)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{make_candles, IndicatorSeries};

    fn set_with(roc: f64, rsi: f64) -> IndicatorSet {
        let mut set = IndicatorSet::new();
        set.insert(IndicatorSeries::from_raw("roc_10", vec![roc, roc]));
        set.insert(IndicatorSeries::from_raw("rsi_14", vec![rsi, rsi]));
        set
    }

    #[test]
    fn momentum_long_needs_room_on_rsi() {
        let candles = make_candles(&[100.0; 2]);
        let rule = MomentumOscillatorHybrid::new(10, 0.005, 14, 30.0, 70.0);
        assert_eq!(rule.evaluate(&candles, 1, &set_with(0.02, 55.0)), Some(Side::Long));
        assert_eq!(rule.evaluate(&candles, 1, &set_with(0.02, 80.0)), None);
    }

    #[test]
    fn momentum_short_needs_room_on_rsi() {
        let candles = make_candles(&[100.0; 2]);
        let rule = MomentumOscillatorHybrid::new(10, 0.005, 14, 30.0, 70.0);
        assert_eq!(rule.evaluate(&candles, 1, &set_with(-0.02, 45.0)), Some(Side::Short));
        assert_eq!(rule.evaluate(&candles, 1, &set_with(-0.02, 20.0)), None);
    }

    #[test]
    fn weak_momentum_is_ignored() {
        let candles = make_candles(&[100.0; 2]);
        let rule = MomentumOscillatorHybrid::new(10, 0.005, 14, 30.0, 70.0);
        assert_eq!(rule.evaluate(&candles, 1, &set_with(0.001, 50.0)), None);
    }
}
