//! Look-ahead contamination tests for every indicator and every signal rule.
//!
//! Invariant: no value at bar t may depend on candles from bar t+1 or later.
//!
//! Method: compute on a truncated series (candles 0..100) and the full series
//! (candles 0..200). Values for 0..100 must be identical between both runs.

use chrono::{Duration, TimeZone, Utc};
use stratscan_core::indicators::*;
use stratscan_core::signals::generate;
use stratscan_core::strategy::{StrategyDefinition, StrategyKind};
use stratscan_core::Candle;

/// N candles of deterministic pseudo-random OHLCV data.
fn make_test_candles(n: usize) -> Vec<Candle> {
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    let mut candles = Vec::with_capacity(n);
    let mut price = 100.0;

    for i in 0..n {
        // Simple LCG walk
        let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
        let change = ((seed % 200) as f64 - 100.0) * 0.05;
        price = (price + change).max(10.0);

        let open = price - 0.5;
        let close = price + 0.3;
        candles.push(Candle {
            timestamp: base + Duration::hours(i as i64),
            open,
            high: open.max(close) + 2.0,
            low: open.min(close) - 2.0,
            close,
            volume: 1000.0 + (i as f64) * 100.0,
        });
    }

    candles
}

fn assert_no_lookahead(indicator: &dyn Indicator, full: &[Candle], truncated_len: usize) {
    let truncated = indicator.compute(&full[..truncated_len]);
    let complete = indicator.compute(full);

    assert_eq!(truncated.len(), truncated_len, "{}", indicator.name());
    for i in 0..truncated_len {
        assert_eq!(
            truncated.get(i),
            complete.get(i),
            "{}: look-ahead at index {i}",
            indicator.name()
        );
    }
}

#[test]
fn no_indicator_looks_ahead() {
    let candles = make_test_candles(200);
    let indicators: Vec<Box<dyn Indicator>> = vec![
        Box::new(Sma::new(20)),
        Box::new(Sma::of_volume(10)),
        Box::new(Ema::new(12)),
        Box::new(Rsi::new(14)),
        Box::new(Bollinger::upper(20, 2.0)),
        Box::new(Bollinger::middle(20, 2.0)),
        Box::new(Bollinger::lower(20, 2.0)),
        Box::new(Atr::new(14)),
        Box::new(Channel::high(20)),
        Box::new(Channel::low(20)),
        Box::new(Roc::new(10)),
    ];
    for indicator in &indicators {
        assert_no_lookahead(indicator.as_ref(), &candles, 100);
    }
}

#[test]
fn lookback_matches_first_defined_index() {
    let candles = make_test_candles(200);
    let indicators: Vec<Box<dyn Indicator>> = vec![
        Box::new(Sma::new(20)),
        Box::new(Ema::new(12)),
        Box::new(Rsi::new(14)),
        Box::new(Bollinger::upper(20, 2.0)),
        Box::new(Atr::new(14)),
        Box::new(Channel::low(20)),
        Box::new(Roc::new(10)),
    ];
    for indicator in &indicators {
        let series = indicator.compute(&candles);
        assert_eq!(
            series.first_defined(),
            Some(indicator.lookback()),
            "{}",
            indicator.name()
        );
    }
}

#[test]
fn no_signal_rule_looks_ahead() {
    let candles = make_test_candles(200);
    let truncated_len = 100;

    for kind in StrategyKind::ALL {
        let def = StrategyDefinition::with_defaults(kind);
        let rule = def.rule().unwrap();
        let indicators = def.required_indicators().unwrap();

        let full_set = IndicatorSet::compute_all(&candles, &indicators);
        let part_set = IndicatorSet::compute_all(&candles[..truncated_len], &indicators);

        let full = generate(&candles, &full_set, &rule);
        let part = generate(&candles[..truncated_len], &part_set, &rule);
        assert_eq!(
            &full.values()[..truncated_len],
            part.values(),
            "{kind}: signal look-ahead"
        );
    }
}
