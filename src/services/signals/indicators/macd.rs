//! MACD (Moving Average Convergence Divergence) indicator.

use super::{closes, Ema, Indicator};
use crate::types::PriceBar;

/// MACD line: EMA(fast) - EMA(slow) at the latest bar.
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
}

impl Default for Macd {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
        }
    }
}

impl Indicator for Macd {
    type Output = f64;

    fn id(&self) -> &str {
        "macd"
    }

    fn min_periods(&self) -> usize {
        self.slow_period.max(self.fast_period)
    }

    fn calculate(&self, bars: &[PriceBar]) -> Option<f64> {
        if bars.len() < self.min_periods() {
            return None;
        }

        let closes = closes(bars);
        let fast = Ema::latest(&closes, self.fast_period)?;
        let slow = Ema::latest(&closes, self.slow_period)?;
        Some(fast - slow)
    }
}
