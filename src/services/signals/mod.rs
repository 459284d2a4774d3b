//! Trading signals service module.
//!
//! Turns a daily price series into an indicator snapshot, scores it under the
//! configured policy and decides whether the result is worth persisting.

pub mod indicators;
pub mod persist;
pub mod scoring;

pub use persist::{save_if_changed, PersistOutcome, SignalRepository};
pub use scoring::{score, Score};

use chrono::{DateTime, Utc};
use indicators::{Breakout, Ema, Indicator, Macd, Rsi, Volatility, VolumeRatio};

use crate::error::SymbolError;
use crate::types::{IndicatorSnapshot, PriceBar, PriceSeries, ScoredSignal, ScoringPolicy, TrendGauge};

/// Window lengths shared by both policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorSettings {
    pub rsi_period: usize,
    pub volatility_window: usize,
    pub volume_window: usize,
    pub breakout_window: usize,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            volatility_window: 20,
            volume_window: 20,
            breakout_window: 20,
        }
    }
}

/// EMA periods that define the trend for each policy.
fn trend_periods(policy: ScoringPolicy) -> &'static [usize] {
    match policy {
        ScoringPolicy::MultiFactor => &[9, 21],
        ScoringPolicy::Structural => &[21, 50, 200],
    }
}

/// Computes snapshots and scored signals for one policy.
#[derive(Debug, Clone)]
pub struct SignalCalculator {
    policy: ScoringPolicy,
    settings: IndicatorSettings,
    min_history: usize,
}

impl SignalCalculator {
    /// Create a calculator. `min_history` is raised to what the indicators
    /// need if it is configured lower.
    pub fn new(policy: ScoringPolicy, settings: IndicatorSettings, min_history: usize) -> Self {
        let min_history = min_history.max(Self::required_bars(policy, &settings));
        Self {
            policy,
            settings,
            min_history,
        }
    }

    /// Calculator with the policy's default windows and history length.
    pub fn for_policy(policy: ScoringPolicy) -> Self {
        Self::new(policy, IndicatorSettings::default(), policy.default_min_history())
    }

    pub fn policy(&self) -> ScoringPolicy {
        self.policy
    }

    pub fn min_history(&self) -> usize {
        self.min_history
    }

    /// Fewest bars every indicator of `policy` can work with.
    pub fn required_bars(policy: ScoringPolicy, settings: &IndicatorSettings) -> usize {
        let common = [
            Rsi::new(settings.rsi_period).min_periods(),
            Macd::default().min_periods(),
            Volatility::new(settings.volatility_window).min_periods(),
            VolumeRatio::new(settings.volume_window).min_periods(),
            Breakout::new(settings.breakout_window).min_periods(),
        ];

        trend_periods(policy)
            .iter()
            .map(|&period| Ema::new(period).min_periods())
            .chain(common)
            .max()
            .unwrap_or(0)
    }

    fn trend_gauge(&self, bars: &[PriceBar]) -> Option<TrendGauge> {
        let emas = trend_periods(self.policy)
            .iter()
            .map(|&period| Ema::new(period).calculate(bars))
            .collect::<Option<Vec<f64>>>()?;

        match (self.policy, emas.as_slice()) {
            (ScoringPolicy::MultiFactor, &[fast, slow]) => Some(TrendGauge::Crossover { fast, slow }),
            (ScoringPolicy::Structural, &[short, mid, long]) => {
                Some(TrendGauge::Alignment { short, mid, long })
            }
            _ => None,
        }
    }

    /// Indicator snapshot of the series, or None when the series is too
    /// short for this calculator.
    pub fn snapshot(&self, series: &PriceSeries) -> Option<IndicatorSnapshot> {
        if series.len() < self.min_history {
            return None;
        }

        let bars = &series.bars;
        let volatility = Volatility::new(self.settings.volatility_window).calculate(bars)?;

        Some(IndicatorSnapshot {
            rsi: Rsi::new(self.settings.rsi_period).calculate(bars)?,
            macd: Macd::default().calculate(bars)?,
            volatility: volatility.current,
            prev_volatility: volatility.previous,
            volume_ratio: VolumeRatio::new(self.settings.volume_window).calculate(bars)?,
            breakout: Breakout::new(self.settings.breakout_window).calculate(bars)?,
            trend: self.trend_gauge(bars)?,
        })
    }

    /// Snapshot and score a series.
    pub fn evaluate(
        &self,
        series: &PriceSeries,
        computed_at: DateTime<Utc>,
    ) -> Result<ScoredSignal, SymbolError> {
        let snapshot = self
            .snapshot(series)
            .ok_or(SymbolError::InsufficientData {
                bars: series.len(),
                required: self.min_history,
            })?;

        let Score { value, trend } = score(self.policy, &snapshot);
        Ok(ScoredSignal::from_snapshot(
            series.symbol.clone(),
            &snapshot,
            value,
            trend,
            computed_at,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signals::indicators::test_support::{bars_from_closes, bars_with_volume};
    use crate::types::Trend;

    fn series(closes: &[f64]) -> PriceSeries {
        PriceSeries::new("PETR4.SA", bars_from_closes(closes))
    }

    fn rising(count: usize) -> Vec<f64> {
        (0..count).map(|i| 20.0 + i as f64 * 0.25).collect()
    }

    #[test]
    fn test_required_bars_per_policy() {
        let settings = IndicatorSettings::default();
        assert_eq!(SignalCalculator::required_bars(ScoringPolicy::MultiFactor, &settings), 26);
        assert_eq!(SignalCalculator::required_bars(ScoringPolicy::Structural, &settings), 200);
    }

    #[test]
    fn test_min_history_never_below_required() {
        let calc = SignalCalculator::new(ScoringPolicy::Structural, IndicatorSettings::default(), 60);
        assert_eq!(calc.min_history(), 200);

        let calc = SignalCalculator::for_policy(ScoringPolicy::MultiFactor);
        assert_eq!(calc.min_history(), 60);
    }

    #[test]
    fn test_short_series_is_insufficient() {
        let calc = SignalCalculator::for_policy(ScoringPolicy::MultiFactor);
        assert!(calc.snapshot(&series(&rising(59))).is_none());

        let err = calc.evaluate(&series(&rising(59)), Utc::now()).unwrap_err();
        match err {
            SymbolError::InsufficientData { bars, required } => {
                assert_eq!(bars, 59);
                assert_eq!(required, 60);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_empty_series_is_insufficient() {
        let calc = SignalCalculator::for_policy(ScoringPolicy::MultiFactor);
        let err = calc
            .evaluate(&PriceSeries::empty("VALE3.SA"), Utc::now())
            .unwrap_err();
        assert!(matches!(err, SymbolError::InsufficientData { bars: 0, .. }));
    }

    #[test]
    fn test_steady_uptrend_multi_factor() {
        let calc = SignalCalculator::for_policy(ScoringPolicy::MultiFactor);
        let snapshot = calc.snapshot(&series(&rising(120))).unwrap();

        assert_eq!(snapshot.rsi, 100.0);
        assert!(snapshot.macd > 0.0);
        assert!(snapshot.breakout);
        assert!(matches!(snapshot.trend, TrendGauge::Crossover { .. }));
        assert!(snapshot.trend.is_up());

        let signal = calc.evaluate(&series(&rising(120)), Utc::now()).unwrap();
        // MACD, crossover and breakout hit; RSI 100 is outside the band,
        // volume is flat and linear growth has shrinking volatility
        assert_eq!(signal.score, 50);
        assert_eq!(signal.trend, Trend::Uptrend);
        assert_eq!(signal.symbol, "PETR4.SA");
    }

    #[test]
    fn test_volume_spike_adds_points() {
        let closes = rising(120);
        let mut volumes = vec![1_000.0; 119];
        volumes.push(5_000.0);
        let spiked = PriceSeries::new("PETR4.SA", bars_with_volume(&closes, &volumes));

        let calc = SignalCalculator::for_policy(ScoringPolicy::MultiFactor);
        let signal = calc.evaluate(&spiked, Utc::now()).unwrap();
        assert_eq!(signal.score, 65);
        assert!(signal.volume_spike > 1.5);
    }

    #[test]
    fn test_structural_policy_uses_alignment() {
        let calc = SignalCalculator::for_policy(ScoringPolicy::Structural);
        assert!(calc.snapshot(&series(&rising(199))).is_none());

        let snapshot = calc.snapshot(&series(&rising(250))).unwrap();
        assert!(matches!(snapshot.trend, TrendGauge::Alignment { .. }));

        let signal = calc.evaluate(&series(&rising(250)), Utc::now()).unwrap();
        // alignment and breakout; RSI 100 misses the band
        assert_eq!(signal.score, 70);
        assert_eq!(signal.trend, Trend::Uptrend);
    }

    #[test]
    fn test_score_within_policy_bounds() {
        let closes: Vec<f64> = (0..220)
            .map(|i| 50.0 + (i as f64 * 0.3).sin() * 4.0 + (i as f64 * 0.05))
            .collect();
        let s = series(&closes);

        for policy in [ScoringPolicy::MultiFactor, ScoringPolicy::Structural] {
            let signal = SignalCalculator::for_policy(policy).evaluate(&s, Utc::now()).unwrap();
            assert!(signal.score <= policy.max_score());
        }
    }

    #[test]
    fn test_evaluate_is_pure() {
        let closes: Vec<f64> = (0..90).map(|i| 30.0 + (i as f64 * 0.9).cos() * 2.0).collect();
        let calc = SignalCalculator::for_policy(ScoringPolicy::MultiFactor);
        let at = Utc::now();
        assert_eq!(
            calc.evaluate(&series(&closes), at).unwrap(),
            calc.evaluate(&series(&closes), at).unwrap()
        );
    }

    #[test]
    fn test_downtrend() {
        let closes: Vec<f64> = (0..100).map(|i| 80.0 - i as f64 * 0.3).collect();
        let calc = SignalCalculator::for_policy(ScoringPolicy::MultiFactor);
        let signal = calc.evaluate(&series(&closes), Utc::now()).unwrap();
        assert_eq!(signal.trend, Trend::Downtrend);
        assert!(!signal.breakout);
        assert_eq!(signal.rsi, 0.0);
    }
}
