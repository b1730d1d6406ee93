//! Candle loading from CSV.
//!
//! The file needs a header row naming a timestamp column (`timestamp`, `time`,
//! `date` or `datetime`) and `open`, `high`, `low`, `close`, `volume`, matched
//! case-insensitively in any order. Extra columns are ignored.
//!
//! Rows are never repaired or zero-filled. A row is skipped, counted, and
//! logged when a field fails to parse, when the candle is not sane
//! (non-finite value, close <= 0, high < low), or when its timestamp does not
//! advance past the previous accepted row.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::{ReaderBuilder, StringRecord, Trim};
use thiserror::Error;
use tracing::{debug, warn};

use stratscan_core::Candle;

/// Integer timestamps above this are read as epoch milliseconds.
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

const TIMESTAMP_ALIASES: [&str; 4] = ["timestamp", "time", "date", "datetime"];

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("no usable rows ({skipped} skipped)")]
    NoUsableRows { skipped: usize },
}

/// Result of loading candles, with the count of rejected rows.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedCandles {
    pub candles: Vec<Candle>,
    pub skipped: usize,
}

/// Why a row was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipReason {
    Unparseable(&'static str),
    NotSane,
    OutOfOrder,
}

/// Column positions resolved from the header row.
struct Columns {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self, LoadError> {
        let find = |names: &[&str], label: &'static str| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
                .ok_or(LoadError::MissingColumn(label))
        };
        Ok(Self {
            timestamp: find(&TIMESTAMP_ALIASES, "timestamp")?,
            open: find(&["open"], "open")?,
            high: find(&["high"], "high")?,
            low: find(&["low"], "low")?,
            close: find(&["close"], "close")?,
            volume: find(&["volume"], "volume")?,
        })
    }

    fn parse(&self, record: &StringRecord) -> Result<Candle, SkipReason> {
        let field = |idx: usize, name: &'static str| record.get(idx).ok_or(SkipReason::Unparseable(name));
        let number = |idx: usize, name: &'static str| -> Result<f64, SkipReason> {
            field(idx, name)?
                .parse::<f64>()
                .map_err(|_| SkipReason::Unparseable(name))
        };

        let timestamp =
            parse_timestamp(field(self.timestamp, "timestamp")?).ok_or(SkipReason::Unparseable("timestamp"))?;
        let candle = Candle {
            timestamp,
            open: number(self.open, "open")?,
            high: number(self.high, "high")?,
            low: number(self.low, "low")?,
            close: number(self.close, "close")?,
            volume: number(self.volume, "volume")?,
        };
        if !candle.is_sane() {
            return Err(SkipReason::NotSane);
        }
        Ok(candle)
    }
}

/// Load candles from a CSV file.
pub fn load_candles_csv(path: &Path) -> Result<LoadedCandles, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let loaded = read_candles(file)?;
    debug!(
        path = %path.display(),
        candles = loaded.candles.len(),
        skipped = loaded.skipped,
        "loaded candles"
    );
    Ok(loaded)
}

/// Read candles from any CSV source.
pub fn read_candles<R: Read>(source: R) -> Result<LoadedCandles, LoadError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(source);
    let columns = Columns::resolve(reader.headers()?)?;

    let mut candles: Vec<Candle> = Vec::new();
    let mut skipped = 0;

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        // Header is line 1.
        let line = row + 2;
        let outcome = columns.parse(&record).and_then(|candle| match candles.last() {
            Some(prev) if candle.timestamp <= prev.timestamp => Err(SkipReason::OutOfOrder),
            _ => Ok(candle),
        });
        match outcome {
            Ok(candle) => candles.push(candle),
            Err(reason) => {
                skipped += 1;
                warn!(line, reason = ?reason, "skipping candle row");
            }
        }
    }

    if candles.is_empty() {
        return Err(LoadError::NoUsableRows { skipped });
    }
    if skipped > 0 {
        warn!(skipped, kept = candles.len(), "some candle rows were rejected");
    }
    Ok(LoadedCandles { candles, skipped })
}

/// Parse a timestamp: epoch seconds, epoch milliseconds, RFC 3339,
/// `%Y-%m-%d %H:%M:%S` (UTC), or `%Y-%m-%d` (UTC midnight).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(epoch) = raw.parse::<i64>() {
        return if epoch.abs() > EPOCH_MILLIS_THRESHOLD {
            DateTime::from_timestamp_millis(epoch)
        } else {
            DateTime::from_timestamp(epoch, 0)
        };
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
