//! Breakout detection.

use super::Indicator;
use crate::types::PriceBar;

/// True when the latest close is strictly above the highest close of the
/// `window` bars before it. The current bar is never part of the high.
pub struct Breakout {
    window: usize,
}

impl Default for Breakout {
    fn default() -> Self {
        Self { window: 20 }
    }
}

impl Breakout {
    pub fn new(window: usize) -> Self {
        Self { window }
    }
}

impl Indicator for Breakout {
    type Output = bool;

    fn id(&self) -> &str {
        "breakout"
    }

    fn min_periods(&self) -> usize {
        self.window + 1
    }

    fn calculate(&self, bars: &[PriceBar]) -> Option<bool> {
        if self.window == 0 || bars.len() < self.min_periods() {
            return None;
        }

        let (current, prior) = bars.split_last()?;
        let highest = prior[prior.len() - self.window..]
            .iter()
            .map(|b| b.close)
            .fold(f64::NEG_INFINITY, f64::max);

        Some(current.close > highest)
    }
}
