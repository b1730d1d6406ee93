//! Concrete indicator implementations.
//!
//! Every indicator implements [`Indicator`]. They are precomputed once per
//! candle series into an [`IndicatorSet`] and read per-bar by the signal
//! generator.
//!
//! Multi-series indicators (Bollinger, rolling channels) are exposed as
//! separate named instances per band, keeping the single-series trait
//! unchanged.

pub mod atr;
pub mod bollinger;
pub mod channel;
pub mod ema;
pub mod indicator;
pub mod roc;
pub mod rsi;
pub mod sma;

pub use atr::{true_range, Atr};
pub use bollinger::{Bollinger, BollingerBand};
pub use channel::{Channel, ChannelEdge};
pub use ema::{ema_of_series, Ema};
pub use indicator::{Indicator, IndicatorSeries, IndicatorSet};
pub use roc::Roc;
pub use rsi::Rsi;
pub use sma::{sma_of_series, Sma, Source};

/// Create synthetic candles from close prices for testing.
///
/// Generates plausible OHLCV: open = prev_close (or close for the first candle),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000,
/// one day apart starting 2024-01-02.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<crate::domain::Candle> {
    use crate::domain::Candle;
    use chrono::{Duration, TimeZone, Utc};

    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                timestamp: base + Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
