use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scoring policy used to turn indicators into a ranking score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScoringPolicy {
    /// RSI band, MACD, EMA9/EMA21 crossover, volatility expansion,
    /// volume spike and breakout. Scores 0-100.
    #[default]
    MultiFactor,
    /// EMA21 > EMA50 > EMA200 alignment, breakout and RSI band. Scores 0-90.
    Structural,
}

impl ScoringPolicy {
    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "multi_factor" | "multifactor" | "multi" => Some(Self::MultiFactor),
            "structural" | "alignment" => Some(Self::Structural),
            _ => None,
        }
    }

    /// Get display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MultiFactor => "multi_factor",
            Self::Structural => "structural",
        }
    }

    /// Highest score this policy can produce.
    pub fn max_score(&self) -> u8 {
        match self {
            Self::MultiFactor => 100,
            Self::Structural => 90,
        }
    }

    /// Minimum history length used when none is configured.
    pub fn default_min_history(&self) -> usize {
        match self {
            Self::MultiFactor => 60,
            Self::Structural => 200,
        }
    }

    /// Provider lookback used when none is configured.
    pub fn default_history_range(&self) -> &'static str {
        match self {
            Self::MultiFactor => "6mo",
            Self::Structural => "1y",
        }
    }
}

/// Coarse trend label stored with every signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    Uptrend,
    Downtrend,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Uptrend => "UPTREND",
            Trend::Downtrend => "DOWNTREND",
        }
    }

    /// Parse the stored label. Anything unknown reads as a downtrend.
    pub fn from_label(s: &str) -> Self {
        if s.eq_ignore_ascii_case("UPTREND") {
            Trend::Uptrend
        } else {
            Trend::Downtrend
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Moving averages that define the trend for a policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrendGauge {
    /// Fast/slow EMA crossover (EMA9 vs EMA21).
    Crossover { fast: f64, slow: f64 },
    /// Three-EMA alignment (EMA21 > EMA50 > EMA200).
    Alignment { short: f64, mid: f64, long: f64 },
}

impl TrendGauge {
    /// Whether the trend-defining condition holds.
    pub fn is_up(&self) -> bool {
        match *self {
            TrendGauge::Crossover { fast, slow } => fast > slow,
            TrendGauge::Alignment { short, mid, long } => short > mid && mid > long,
        }
    }

    pub fn trend(&self) -> Trend {
        if self.is_up() {
            Trend::Uptrend
        } else {
            Trend::Downtrend
        }
    }
}

/// Indicator values for one symbol at one computation time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub rsi: f64,
    /// EMA12 - EMA26.
    pub macd: f64,
    /// Latest rolling volatility of daily returns.
    pub volatility: f64,
    /// Rolling volatility five positions from the end.
    pub prev_volatility: f64,
    /// Today's volume over the rolling average volume.
    pub volume_ratio: f64,
    pub breakout: bool,
    pub trend: TrendGauge,
}

/// A scored snapshot: what the ranking cache serves and what gets persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSignal {
    pub symbol: String,
    pub score: u8,
    pub trend: Trend,
    pub rsi: f64,
    pub macd: f64,
    pub volatility: f64,
    pub volume_spike: f64,
    pub breakout: bool,
    pub computed_at: DateTime<Utc>,
}

impl ScoredSignal {
    /// Assemble a signal from a snapshot and its score.
    ///
    /// Indicator values are rounded for storage and display; the score has
    /// already been derived from the unrounded snapshot.
    pub fn from_snapshot(
        symbol: impl Into<String>,
        snapshot: &IndicatorSnapshot,
        score: u8,
        trend: Trend,
        computed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            score,
            trend,
            rsi: round_to(snapshot.rsi, 2),
            macd: round_to(snapshot.macd, 4),
            volatility: round_to(snapshot.volatility, 4),
            volume_spike: round_to(snapshot.volume_ratio, 2),
            breakout: snapshot.breakout,
            computed_at,
        }
    }

    /// Whether this signal is worth a new row given the latest stored one.
    /// Only score, trend and breakout count as a change.
    pub fn differs_from(&self, last: &SignalRecord) -> bool {
        self.score != last.score || self.trend != last.trend || self.breakout != last.breakout
    }
}

/// A persisted signal row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub id: i64,
    pub symbol: String,
    pub score: u8,
    pub trend: Trend,
    pub rsi: f64,
    pub macd: f64,
    pub volatility: f64,
    pub volume_spike: f64,
    pub breakout: bool,
    pub created_at: DateTime<Utc>,
}

/// Ranking view handed to readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    /// Entries by descending score.
    pub data: Vec<ScoredSignal>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(trend: TrendGauge) -> IndicatorSnapshot {
        IndicatorSnapshot {
            rsi: 61.23456,
            macd: 0.123456,
            volatility: 0.0154321,
            prev_volatility: 0.012,
            volume_ratio: 1.876,
            breakout: true,
            trend,
        }
    }

    fn record(score: u8, trend: Trend, breakout: bool) -> SignalRecord {
        SignalRecord {
            id: 1,
            symbol: "PETR4.SA".to_string(),
            score,
            trend,
            rsi: 10.0,
            macd: 1.0,
            volatility: 0.5,
            volume_spike: 3.0,
            breakout,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(ScoringPolicy::from_str("multi_factor"), Some(ScoringPolicy::MultiFactor));
        assert_eq!(ScoringPolicy::from_str("STRUCTURAL"), Some(ScoringPolicy::Structural));
        assert_eq!(ScoringPolicy::from_str("momentum"), None);
    }

    #[test]
    fn test_policy_defaults() {
        assert_eq!(ScoringPolicy::default(), ScoringPolicy::MultiFactor);
        assert_eq!(ScoringPolicy::MultiFactor.default_min_history(), 60);
        assert_eq!(ScoringPolicy::Structural.default_min_history(), 200);
        assert_eq!(ScoringPolicy::Structural.max_score(), 90);
    }

    #[test]
    fn test_trend_serialization() {
        assert_eq!(serde_json::to_string(&Trend::Uptrend).unwrap(), "\"UPTREND\"");
        assert_eq!(serde_json::to_string(&Trend::Downtrend).unwrap(), "\"DOWNTREND\"");
        assert_eq!(Trend::from_label("uptrend"), Trend::Uptrend);
        assert_eq!(Trend::from_label("sideways"), Trend::Downtrend);
    }

    #[test]
    fn test_crossover_gauge() {
        assert!(TrendGauge::Crossover { fast: 10.5, slow: 10.0 }.is_up());
        assert!(!TrendGauge::Crossover { fast: 10.0, slow: 10.0 }.is_up());
    }

    #[test]
    fn test_alignment_gauge_requires_full_order() {
        assert!(TrendGauge::Alignment { short: 3.0, mid: 2.0, long: 1.0 }.is_up());
        assert!(!TrendGauge::Alignment { short: 3.0, mid: 1.0, long: 2.0 }.is_up());
        assert_eq!(
            TrendGauge::Alignment { short: 1.0, mid: 2.0, long: 3.0 }.trend(),
            Trend::Downtrend
        );
    }

    #[test]
    fn test_scored_signal_rounds_values() {
        let snap = snapshot(TrendGauge::Crossover { fast: 2.0, slow: 1.0 });
        let signal = ScoredSignal::from_snapshot("PETR4.SA", &snap, 70, Trend::Uptrend, Utc::now());
        assert_eq!(signal.rsi, 61.23);
        assert_eq!(signal.macd, 0.1235);
        assert_eq!(signal.volatility, 0.0154);
        assert_eq!(signal.volume_spike, 1.88);
    }

    #[test]
    fn test_differs_from_only_checks_change_fields() {
        let snap = snapshot(TrendGauge::Crossover { fast: 2.0, slow: 1.0 });
        let signal = ScoredSignal::from_snapshot("PETR4.SA", &snap, 70, Trend::Uptrend, Utc::now());

        assert!(!signal.differs_from(&record(70, Trend::Uptrend, true)));
        assert!(signal.differs_from(&record(50, Trend::Uptrend, true)));
        assert!(signal.differs_from(&record(70, Trend::Downtrend, true)));
        assert!(signal.differs_from(&record(70, Trend::Uptrend, false)));
    }

    #[test]
    fn test_round_to_keeps_non_finite() {
        assert!(round_to(f64::NAN, 2).is_nan());
        assert_eq!(round_to(f64::INFINITY, 2), f64::INFINITY);
        assert_eq!(round_to(1.005, 0), 1.0);
    }
}
