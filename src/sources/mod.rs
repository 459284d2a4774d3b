//! Price history providers.

pub mod yahoo;

pub use yahoo::YahooFinanceClient;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::types::PriceSeries;

/// Supplies daily OHLCV history for a symbol.
///
/// An empty or short series is a normal answer; errors are reserved for
/// transport and upstream failures.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Fetch bars for `symbol` covering `range` (e.g. "6mo") at `interval`
    /// (e.g. "1d"), ascending by time.
    async fn fetch(
        &self,
        symbol: &str,
        range: &str,
        interval: &str,
    ) -> Result<PriceSeries, ProviderError>;
}
