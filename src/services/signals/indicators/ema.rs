//! Exponential Moving Average (EMA) indicator.

use super::{closes, Indicator};
use crate::types::PriceBar;

/// EMA (Exponential Moving Average) indicator.
///
/// Smoothing factor 2 / (period + 1), seeded with the first value and
/// without bias correction.
pub struct Ema {
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// EMA at every position of `values`.
    pub fn series(values: &[f64], period: usize) -> Vec<f64> {
        let Some(&first) = values.first() else {
            return Vec::new();
        };

        let alpha = 2.0 / (period as f64 + 1.0);
        let mut ema = Vec::with_capacity(values.len());
        let mut current = first;
        ema.push(current);

        for &value in &values[1..] {
            current = alpha * value + (1.0 - alpha) * current;
            ema.push(current);
        }

        ema
    }

    /// Latest EMA of `values`.
    pub fn latest(values: &[f64], period: usize) -> Option<f64> {
        Self::series(values, period).last().copied()
    }
}

impl Indicator for Ema {
    type Output = f64;

    fn id(&self) -> &str {
        "ema"
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, bars: &[PriceBar]) -> Option<f64> {
        if self.period == 0 || bars.len() < self.min_periods() {
            return None;
        }
        Self::latest(&closes(bars), self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::indicators::test_support::bars_from_closes;

    #[test]
    fn test_ema_series_seeded_with_first_value() {
        let ema = Ema::series(&[10.0, 20.0, 30.0], 3);
        // alpha = 0.5
        assert_eq!(ema, vec![10.0, 15.0, 22.5]);
    }

    #[test]
    fn test_ema_empty() {
        assert!(Ema::series(&[], 9).is_empty());
        assert!(Ema::latest(&[], 9).is_none());
    }

    #[test]
    fn test_ema_constant_series() {
        let bars = bars_from_closes(&[42.0; 30]);
        let value = Ema::new(21).calculate(&bars).unwrap();
        assert!((value - 42.0).abs() < 1e-12);
    }

    #[test]
    fn test_ema_requires_period_bars() {
        let bars = bars_from_closes(&[1.0; 8]);
        assert!(Ema::new(9).calculate(&bars).is_none());
        assert!(Ema::new(8).calculate(&bars).is_some());
    }

    #[test]
    fn test_fast_ema_leads_in_uptrend() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let bars = bars_from_closes(&closes);
        let fast = Ema::new(9).calculate(&bars).unwrap();
        let slow = Ema::new(21).calculate(&bars).unwrap();
        assert!(fast > slow);
    }
}
