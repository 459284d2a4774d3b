//! Rolling volatility of daily returns.

use super::{closes, sample_std, Indicator};
use crate::types::PriceBar;

/// Current and earlier rolling volatility.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolatilityReading {
    pub current: f64,
    pub previous: f64,
}

/// Standard deviation of daily percentage returns over a rolling window.
///
/// `previous` is the rolling value `lookback` positions from the end of the
/// series, where the latest value sits at position 1.
pub struct Volatility {
    window: usize,
    lookback: usize,
}

impl Default for Volatility {
    fn default() -> Self {
        Self {
            window: 20,
            lookback: 5,
        }
    }
}

impl Volatility {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            ..Self::default()
        }
    }

    /// Daily percentage returns; element `i` is the change into bar `i + 1`.
    pub fn returns(values: &[f64]) -> Vec<f64> {
        values
            .windows(2)
            .map(|pair| pair[1] / pair[0] - 1.0)
            .collect()
    }

    /// Rolling volatility ending at bar `index` of the price series.
    fn rolling_at(returns: &[f64], window: usize, index: usize) -> Option<f64> {
        // Bar `index` maps to return `index - 1`
        if index < window {
            return None;
        }
        let end = index;
        let start = end - window;
        sample_std(&returns[start..end])
    }
}

impl Indicator for Volatility {
    type Output = VolatilityReading;

    fn id(&self) -> &str {
        "volatility"
    }

    fn min_periods(&self) -> usize {
        self.window + self.lookback
    }

    fn calculate(&self, bars: &[PriceBar]) -> Option<VolatilityReading> {
        if self.window < 2 || self.lookback == 0 || bars.len() < self.min_periods() {
            return None;
        }

        let returns = Self::returns(&closes(bars));
        let last = bars.len() - 1;
        let current = Self::rolling_at(&returns, self.window, last)?;
        let previous = Self::rolling_at(&returns, self.window, bars.len() - self.lookback)?;

        Some(VolatilityReading { current, previous })
    }
}
