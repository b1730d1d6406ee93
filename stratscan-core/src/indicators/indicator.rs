//! Indicator trait, aligned indicator series, and the precomputed indicator set.
//!
//! Indicators are pure functions: candle history in, aligned series out.
//! They are computed once per candle series and shared read-only by every
//! signal evaluation that needs them.

use crate::domain::Candle;
use std::collections::HashMap;

/// Trait for indicators.
///
/// `compute_raw` produces one value per candle. Warm-up entries (and any entry
/// whose window touched a non-finite input) are `f64::NAN` there;
/// [`Indicator::compute`] turns them into absent values.
///
/// # Look-ahead contamination guard
/// No indicator value at index t may depend on candles at t+1 or later.
pub trait Indicator: Send + Sync {
    /// Unique name including parameters (e.g., "sma_20", "bollinger_upper_20_2").
    fn name(&self) -> &str;

    /// Number of leading entries that are always undefined.
    fn lookback(&self) -> usize;

    /// Compute the raw series, NaN-padded through the warm-up window.
    fn compute_raw(&self, candles: &[Candle]) -> Vec<f64>;

    /// Compute the aligned series with warm-up entries absent.
    fn compute(&self, candles: &[Candle]) -> IndicatorSeries {
        IndicatorSeries::from_raw(self.name(), self.compute_raw(candles))
    }
}

/// A named series aligned index-for-index with its candle series.
///
/// Entries are `None` before the warm-up window completes. A `None` is never
/// a tradable value.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    name: String,
    values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    /// Build from a raw NaN-padded series. Non-finite entries become `None`.
    pub fn from_raw(name: impl Into<String>, raw: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values: raw
                .into_iter()
                .map(|v| if v.is_finite() { Some(v) } else { None })
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value at `index`, or `None` if undefined or out of range.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Index of the first defined entry, if any.
    pub fn first_defined(&self) -> Option<usize> {
        self.values.iter().position(|v| v.is_some())
    }
}

/// Container for precomputed indicator series, keyed by indicator name.
#[derive(Debug, Clone, Default)]
pub struct IndicatorSet {
    series: HashMap<String, IndicatorSeries>,
}

impl IndicatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute every indicator over `candles`, skipping names already present.
    pub fn compute_all(candles: &[Candle], indicators: &[Box<dyn Indicator>]) -> Self {
        let mut set = Self::new();
        for indicator in indicators {
            if !set.contains(indicator.name()) {
                set.insert(indicator.compute(candles));
            }
        }
        set
    }

    pub fn insert(&mut self, series: IndicatorSeries) {
        self.series.insert(series.name().to_string(), series);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.series.contains_key(name)
    }

    /// Value of the named indicator at `index`.
    pub fn get(&self, name: &str, index: usize) -> Option<f64> {
        self.series.get(name).and_then(|s| s.get(index))
    }

    /// Current and previous value of the named indicator; `None` unless both are defined.
    pub fn pair(&self, name: &str, index: usize) -> Option<(f64, f64)> {
        if index == 0 {
            return None;
        }
        Some((self.get(name, index)?, self.get(name, index - 1)?))
    }

    pub fn series(&self, name: &str) -> Option<&IndicatorSeries> {
        self.series.get(name)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl Extend<IndicatorSeries> for IndicatorSet {
    fn extend<T: IntoIterator<Item = IndicatorSeries>>(&mut self, iter: T) {
        for series in iter {
            self.insert(series);
        }
    }
}

impl FromIterator<IndicatorSeries> for IndicatorSet {
    fn from_iter<T: IntoIterator<Item = IndicatorSeries>>(iter: T) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}
