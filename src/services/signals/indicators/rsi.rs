//! Relative Strength Index (RSI) indicator.

use super::{closes, Indicator};
use crate::types::PriceBar;

/// RSI (Relative Strength Index) indicator.
///
/// Averages gains and losses over the most recent `period` price changes
/// with a simple mean (no Wilder smoothing):
/// RSI = 100 - 100 / (1 + avg_gain / avg_loss).
pub struct Rsi {
    period: usize,
}

impl Default for Rsi {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// RSI of the last `period` changes in `values`.
    pub fn calculate_rsi(values: &[f64], period: usize) -> Option<f64> {
        if period == 0 || values.len() < period + 1 {
            return None;
        }

        let window = &values[values.len() - period - 1..];
        let mut gain_sum = 0.0;
        let mut loss_sum = 0.0;

        for pair in window.windows(2) {
            let change = pair[1] - pair[0];
            if change > 0.0 {
                gain_sum += change;
            } else {
                loss_sum -= change;
            }
        }

        let avg_gain = gain_sum / period as f64;
        let avg_loss = loss_sum / period as f64;

        if avg_loss == 0.0 {
            // Flat window has no direction
            return Some(if avg_gain == 0.0 { 50.0 } else { 100.0 });
        }

        let rs = avg_gain / avg_loss;
        Some(100.0 - (100.0 / (1.0 + rs)))
    }
}

impl Indicator for Rsi {
    type Output = f64;

    fn id(&self) -> &str {
        "rsi"
    }

    fn min_periods(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, bars: &[PriceBar]) -> Option<f64> {
        Self::calculate_rsi(&closes(bars), self.period)
    }
}
