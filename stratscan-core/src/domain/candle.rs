//! Candle — the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV candle for one interval of a single symbol.
///
/// A series of candles is sorted ascending by `timestamp` with no duplicates,
/// and every `close` is strictly positive. `validate_series` checks both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Returns true if any OHLCV field is not a finite number.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite())
    }

    /// Basic sanity check: finite fields, positive close, high >= low.
    pub fn is_sane(&self) -> bool {
        !self.is_void() && self.close > 0.0 && self.high >= self.low && self.volume >= 0.0
    }
}

/// Why a candle series failed validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SeriesError {
    #[error("candle {index} is not sane (non-finite field, close <= 0, or high < low)")]
    InsaneCandle { index: usize },
    #[error("candle {index} timestamp is not strictly after its predecessor")]
    OutOfOrder { index: usize },
}

/// Check the ordering and value invariants of a candle series.
pub fn validate_series(candles: &[Candle]) -> Result<(), SeriesError> {
    for (index, candle) in candles.iter().enumerate() {
        if !candle.is_sane() {
            return Err(SeriesError::InsaneCandle { index });
        }
        if index > 0 && candle.timestamp <= candles[index - 1].timestamp {
            return Err(SeriesError::OutOfOrder { index });
        }
    }
    Ok(())
}
