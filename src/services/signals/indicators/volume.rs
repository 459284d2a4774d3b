//! Volume ratio indicator.

use super::{mean, Indicator};
use crate::types::PriceBar;

/// Today's volume divided by the average volume of the last `window` bars
/// (today included).
pub struct VolumeRatio {
    window: usize,
}

impl Default for VolumeRatio {
    fn default() -> Self {
        Self { window: 20 }
    }
}

impl VolumeRatio {
    pub fn new(window: usize) -> Self {
        Self { window }
    }
}

impl Indicator for VolumeRatio {
    type Output = f64;

    fn id(&self) -> &str {
        "volume_ratio"
    }

    fn min_periods(&self) -> usize {
        self.window
    }

    fn calculate(&self, bars: &[PriceBar]) -> Option<f64> {
        if self.window == 0 || bars.len() < self.window {
            return None;
        }

        let volumes: Vec<f64> = bars[bars.len() - self.window..]
            .iter()
            .map(|b| b.volume)
            .collect();
        let average = mean(&volumes);
        let today = bars.last()?.volume;

        if average <= 0.0 {
            return Some(0.0);
        }

        Some(today / average)
    }
}
