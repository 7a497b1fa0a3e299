pub mod ema;
pub mod macd;

pub use ema::ExponentialMovingAverage;
pub use macd::MacdEngine;

use serde::{Deserialize, Serialize};

/// MACD reading aligned to one candle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSample {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

impl IndicatorSample {
    pub fn new(macd: f64, signal: f64) -> Self {
        Self {
            macd,
            signal,
            histogram: macd - signal,
        }
    }
}

/// Indicator output aligned index-for-index with the candle window.
/// Entries are `None` while the averages are still warming up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacdSeries {
    samples: Vec<Option<IndicatorSample>>,
}

impl MacdSeries {
    pub fn new(samples: Vec<Option<IndicatorSample>>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&IndicatorSample> {
        self.samples.get(index).and_then(Option::as_ref)
    }

    pub fn latest(&self) -> Option<&IndicatorSample> {
        self.samples.last().and_then(Option::as_ref)
    }

    /// The second-to-last and last samples.
    pub fn latest_pair(&self) -> (Option<&IndicatorSample>, Option<&IndicatorSample>) {
        match self.samples.len() {
            0 => (None, None),
            1 => (None, self.latest()),
            n => (self.get(n - 2), self.latest()),
        }
    }
}

/// Pluggable indicator computation over a close-price sequence.
pub trait IndicatorEngine: Send + Sync {
    fn id(&self) -> &'static str;

    /// Candles required before `compute` yields a series.
    fn min_candles(&self) -> usize;

    /// Returns `None` when `closes` is too short to produce any sample.
    fn compute(&self, closes: &[f64]) -> Option<MacdSeries>;
}
