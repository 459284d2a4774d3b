//! Threshold scoring of indicator snapshots.
//!
//! Pure functions of the snapshot and policy: identical inputs always yield
//! the same score and trend.

use crate::types::{IndicatorSnapshot, ScoringPolicy, Trend};

/// RSI band rewarded by both policies (exclusive bounds).
pub const RSI_BAND: (f64, f64) = (55.0, 70.0);

/// Volume ratio above which volume counts as a spike.
pub const VOLUME_SPIKE_RATIO: f64 = 1.5;

/// Score and trend label for a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub value: u8,
    pub trend: Trend,
}

fn rsi_in_band(rsi: f64) -> bool {
    rsi > RSI_BAND.0 && rsi < RSI_BAND.1
}

/// Score a snapshot under the given policy.
pub fn score(policy: ScoringPolicy, snapshot: &IndicatorSnapshot) -> Score {
    let trend_up = snapshot.trend.is_up();

    let points: Vec<(bool, u8)> = match policy {
        ScoringPolicy::MultiFactor => vec![
            (rsi_in_band(snapshot.rsi), 20),
            (snapshot.macd > 0.0, 20),
            (trend_up, 20),
            (snapshot.volatility > snapshot.prev_volatility, 15),
            (snapshot.volume_ratio > VOLUME_SPIKE_RATIO, 15),
            (snapshot.breakout, 10),
        ],
        ScoringPolicy::Structural => vec![
            (trend_up, 40),
            (snapshot.breakout, 30),
            (rsi_in_band(snapshot.rsi), 20),
        ],
    };

    let value = points
        .iter()
        .filter(|(hit, _)| *hit)
        .map(|(_, pts)| *pts)
        .sum();

    Score {
        value,
        trend: snapshot.trend.trend(),
    }
}
