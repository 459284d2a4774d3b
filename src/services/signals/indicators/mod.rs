//! Technical indicator implementations.
//!
//! Every indicator recomputes over the full series it is given; no state is
//! carried between refresh cycles.

pub mod breakout;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod volatility;
pub mod volume;

pub use breakout::Breakout;
pub use ema::Ema;
pub use macd::Macd;
pub use rsi::Rsi;
pub use volatility::{Volatility, VolatilityReading};
pub use volume::VolumeRatio;

use crate::types::PriceBar;

/// Trait for implementing technical indicators.
pub trait Indicator: Send + Sync {
    type Output;

    /// Unique identifier for this indicator.
    fn id(&self) -> &str;

    /// Minimum number of bars required for calculation.
    fn min_periods(&self) -> usize;

    /// Calculate the latest value from daily bars.
    /// Returns None if there is not enough data.
    fn calculate(&self, bars: &[PriceBar]) -> Option<Self::Output>;
}

pub(crate) fn closes(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
pub(crate) fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let avg = mean(values);
    let variance =
        values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}
