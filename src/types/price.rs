use serde::{Deserialize, Serialize};

/// Daily OHLCV bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Bar open time, unix milliseconds.
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Price history for one symbol, ascending by time.
///
/// Gaps are possible (the provider decides which sessions exist); the
/// indicators treat consecutive bars as consecutive periods.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Build a series, sorting bars by time if the provider did not.
    pub fn new(symbol: impl Into<String>, mut bars: Vec<PriceBar>) -> Self {
        if !bars.windows(2).all(|w| w[0].time <= w[1].time) {
            bars.sort_by_key(|b| b.time);
        }
        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    /// Empty series, the normal "no data" answer from a provider.
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self::new(symbol, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Most recent bar.
    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }
}
