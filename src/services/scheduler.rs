//! Refresh scheduler.
//!
//! One long-lived task that, once per interval, fetches history for every
//! tracked symbol, scores it, persists changes and rebuilds the ranking
//! cache. Symbols are processed sequentially; a failing symbol never stops
//! the cycle and nothing escapes the loop.

use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::{Disposition, SymbolError};
use crate::services::signals::{save_if_changed, SignalCalculator, SignalRepository};
use crate::services::RankingCache;
use crate::sources::HistoryProvider;
use crate::types::ScoredSignal;

/// What to refresh and how often.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Ordered symbol list; order breaks score ties in the ranking.
    pub symbols: Vec<String>,
    /// Pause between the end of one cycle and the start of the next.
    pub interval: Duration,
    /// Provider lookback, e.g. "6mo".
    pub history_range: String,
    /// Provider bar interval, e.g. "1d".
    pub history_interval: String,
}

/// Counters for one refresh cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Symbols that made it into the ranking.
    pub ranked: usize,
    /// Symbols without enough history.
    pub skipped: usize,
    /// Symbols dropped after a provider error.
    pub failed: usize,
    /// New rows appended to the signal log.
    pub persisted: usize,
    /// Rows that could not be written (the symbol is still ranked).
    pub persist_failed: usize,
    /// The cycle stopped early and the cache was left untouched.
    pub aborted: bool,
    /// The ranking cache was replaced.
    pub cache_updated: bool,
}

/// Periodic signal refresh.
pub struct RefreshScheduler {
    provider: Arc<dyn HistoryProvider>,
    store: Arc<dyn SignalRepository>,
    cache: Arc<RankingCache>,
    calculator: SignalCalculator,
    settings: SchedulerSettings,
    /// Held for the duration of a cycle.
    cycle_lock: Mutex<()>,
    shutdown_tx: broadcast::Sender<()>,
}

impl RefreshScheduler {
    pub fn new(
        provider: Arc<dyn HistoryProvider>,
        store: Arc<dyn SignalRepository>,
        cache: Arc<RankingCache>,
        calculator: SignalCalculator,
        settings: SchedulerSettings,
    ) -> Arc<Self> {
        let (shutdown_tx, _) = broadcast::channel(1);

        Arc::new(Self {
            provider,
            store,
            cache,
            calculator,
            settings,
            cycle_lock: Mutex::new(()),
            shutdown_tx,
        })
    }

    pub fn cache(&self) -> &Arc<RankingCache> {
        &self.cache
    }

    /// Start the refresh loop on the runtime. The first cycle starts
    /// immediately.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(Arc::clone(self).run())
    }

    /// The refresh loop as a future that ends once `stop()` is called.
    ///
    /// Shutdown is subscribed when this is called, not when the future is
    /// first polled, so a `stop()` in between still ends the loop.
    pub fn run(self: Arc<Self>) -> impl Future<Output = ()> + Send + 'static {
        let shutdown_rx = self.shutdown_tx.subscribe();
        async move { self.run_until(shutdown_rx).await }
    }

    /// Ask the loop to exit. An in-flight cycle is dropped before it swaps
    /// the cache, so readers keep the last completed ranking.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(());
    }

    async fn run_until(&self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!(
            "Refresh scheduler started: {} symbols every {}s ({} policy)",
            self.settings.symbols.len(),
            self.settings.interval.as_secs(),
            self.calculator.policy().name()
        );

        loop {
            tokio::select! {
                _ = self.run_cycle() => {}
                _ = shutdown_rx.recv() => break,
            }

            tokio::select! {
                _ = tokio::time::sleep(self.settings.interval) => {}
                _ = shutdown_rx.recv() => break,
            }
        }

        info!("Refresh scheduler received shutdown signal");
    }

    /// Run one full refresh over the symbol list.
    pub async fn run_cycle(&self) -> CycleReport {
        let _guard = self.cycle_lock.lock().await;
        let started = Instant::now();
        let mut report = CycleReport::default();
        let mut results: Vec<ScoredSignal> = Vec::with_capacity(self.settings.symbols.len());

        debug!("Updating ranking for {} symbols", self.settings.symbols.len());

        for symbol in &self.settings.symbols {
            let signal = match self.compute_symbol(symbol).await {
                Ok(signal) => signal,
                Err(e) => {
                    if self.record_failure(symbol, &e, &mut report) == Disposition::Abort {
                        break;
                    }
                    continue;
                }
            };

            match save_if_changed(self.store.as_ref(), &signal) {
                Ok(outcome) => {
                    if outcome.inserted() {
                        report.persisted += 1;
                    }
                }
                Err(e) => {
                    let e = SymbolError::from(e);
                    if self.record_failure(symbol, &e, &mut report) == Disposition::Abort {
                        break;
                    }
                }
            }

            results.push(signal);
        }

        report.ranked = results.len();

        if report.aborted {
            error!(
                "Refresh cycle aborted after {:?}; keeping previous ranking ({} entries)",
                started.elapsed(),
                self.cache.len()
            );
            return report;
        }

        if results.is_empty() {
            warn!(
                "Refresh cycle produced no results ({} skipped, {} failed); keeping previous ranking",
                report.skipped, report.failed
            );
            return report;
        }

        self.cache.replace(results, Utc::now());
        report.cache_updated = true;

        info!(
            ranked = report.ranked,
            skipped = report.skipped,
            failed = report.failed,
            persisted = report.persisted,
            "Ranking updated in {:?}",
            started.elapsed()
        );

        report
    }

    /// Fetch and score one symbol.
    async fn compute_symbol(&self, symbol: &str) -> Result<ScoredSignal, SymbolError> {
        let series = self
            .provider
            .fetch(
                symbol,
                &self.settings.history_range,
                &self.settings.history_interval,
            )
            .await?;

        self.calculator.evaluate(&series, Utc::now())
    }

    /// Log a per-symbol failure and count it.
    fn record_failure(
        &self,
        symbol: &str,
        err: &SymbolError,
        report: &mut CycleReport,
    ) -> Disposition {
        let disposition = err.disposition();
        let phase = err.phase();

        match disposition {
            Disposition::Skip => {
                debug!(symbol, phase, "Skipping symbol: {}", err);
                report.skipped += 1;
            }
            Disposition::Fail if matches!(err, SymbolError::Store(_)) => {
                warn!(symbol, phase, "Signal not persisted: {}", err);
                report.persist_failed += 1;
            }
            Disposition::Fail => {
                warn!(symbol, phase, "Symbol refresh failed: {}", err);
                report.failed += 1;
            }
            Disposition::Abort => {
                error!(symbol, phase, "Aborting refresh cycle: {}", err);
                report.aborted = true;
            }
        }

        disposition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::services::SqliteStore;
    use crate::types::{PriceBar, PriceSeries, ScoringPolicy};
    use async_trait::async_trait;

    struct FixedProvider;

    #[async_trait]
    impl HistoryProvider for FixedProvider {
        async fn fetch(&self, symbol: &str, _: &str, _: &str) -> Result<PriceSeries, ProviderError> {
            let bars = (0..80)
                .map(|i| PriceBar {
                    time: i * 86_400_000,
                    open: 10.0,
                    high: 10.0,
                    low: 10.0,
                    close: 10.0 + i as f64 * 0.1,
                    volume: 500.0,
                })
                .collect();
            Ok(PriceSeries::new(symbol, bars))
        }
    }

    fn scheduler(symbols: &[&str]) -> Arc<RefreshScheduler> {
        RefreshScheduler::new(
            Arc::new(FixedProvider),
            Arc::new(SqliteStore::new_in_memory().unwrap()),
            RankingCache::new(),
            SignalCalculator::for_policy(ScoringPolicy::MultiFactor),
            SchedulerSettings {
                symbols: symbols.iter().map(|s| s.to_string()).collect(),
                interval: Duration::from_millis(10),
                history_range: "6mo".to_string(),
                history_interval: "1d".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_cycle_fills_cache() {
        let scheduler = scheduler(&["PETR4.SA", "VALE3.SA"]);
        let report = scheduler.run_cycle().await;

        assert_eq!(report.ranked, 2);
        assert_eq!(report.persisted, 2);
        assert!(report.cache_updated);
        assert_eq!(scheduler.cache().len(), 2);
        assert!(scheduler.cache().updated_at().is_some());
    }

    #[tokio::test]
    async fn test_repeat_cycle_persists_nothing_new() {
        let scheduler = scheduler(&["PETR4.SA"]);
        scheduler.run_cycle().await;
        let second = scheduler.run_cycle().await;

        assert_eq!(second.ranked, 1);
        assert_eq!(second.persisted, 0);
    }

    #[tokio::test]
    async fn test_spawned_loop_stops() {
        let scheduler = scheduler(&["PETR4.SA"]);
        let handle = scheduler.spawn();

        tokio::time::sleep(Duration::from_millis(50)).await;
        scheduler.stop();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("scheduler did not stop")
            .unwrap();
        assert_eq!(scheduler.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_run_future_sees_stop_sent_before_polling() {
        let scheduler = scheduler(&["PETR4.SA"]);
        let run = Arc::clone(&scheduler).run();
        scheduler.stop();

        tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .expect("scheduler did not stop");
    }

    #[tokio::test]
    async fn test_stop_before_first_poll() {
        let scheduler = scheduler(&["PETR4.SA"]);
        let handle = scheduler.spawn();
        scheduler.stop();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("scheduler did not stop")
            .unwrap();
    }
}
