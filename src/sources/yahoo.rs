//! Yahoo Finance API client for daily stock history.
//!
//! Uses the unofficial v8 chart endpoint. Prices are auto-adjusted with the
//! `adjclose` series when Yahoo supplies it.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::HistoryProvider;
use crate::error::ProviderError;
use crate::types::{PriceBar, PriceSeries};

const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance chart response.
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    timestamp: Option<Vec<i64>>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
    #[serde(default)]
    adjclose: Option<Vec<YahooAdjClose>>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct YahooAdjClose {
    adjclose: Option<Vec<Option<f64>>>,
}

/// Yahoo symbols are upper case; B3 tickers keep their ".SA" suffix.
fn normalize_yahoo_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

fn value_at(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten()
}

/// Convert a decoded chart response into a series.
fn parse_chart(symbol: &str, data: YahooChartResponse) -> Result<PriceSeries, ProviderError> {
    if let Some(error) = data.chart.error {
        return Err(ProviderError::Upstream {
            code: error.code,
            description: error.description,
        });
    }

    let Some(result) = data.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(PriceSeries::empty(symbol));
    };

    // Symbols without trading history come back without timestamps
    let Some(timestamps) = result.timestamp else {
        return Ok(PriceSeries::empty(symbol));
    };

    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Malformed("no quote data".to_string()))?;

    let opens = quote.open.unwrap_or_default();
    let highs = quote.high.unwrap_or_default();
    let lows = quote.low.unwrap_or_default();
    let closes = quote.close.unwrap_or_default();
    let volumes = quote.volume.unwrap_or_default();
    let adj_closes = result
        .indicators
        .adjclose
        .and_then(|a| a.into_iter().next())
        .and_then(|a| a.adjclose)
        .unwrap_or_default();

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, &timestamp) in timestamps.iter().enumerate() {
        let Some(close) = value_at(&closes, i).filter(|c| *c > 0.0) else {
            continue;
        };

        let factor = value_at(&adj_closes, i)
            .filter(|adj| *adj > 0.0)
            .map(|adj| adj / close)
            .unwrap_or(1.0);

        bars.push(PriceBar {
            time: timestamp * 1000,
            open: value_at(&opens, i).unwrap_or(close) * factor,
            high: value_at(&highs, i).unwrap_or(close) * factor,
            low: value_at(&lows, i).unwrap_or(close) * factor,
            close: close * factor,
            volume: value_at(&volumes, i).unwrap_or(0.0),
        });
    }

    Ok(PriceSeries::new(symbol, bars))
}

/// Yahoo Finance API client.
pub struct YahooFinanceClient {
    client: Client,
    base_url: String,
}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client.
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_base_url(BASE_URL)
    }

    /// Client against a different chart endpoint.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn chart_url(&self, symbol: &str, range: &str, interval: &str) -> String {
        format!(
            "{}/{}?range={}&interval={}&includePrePost=false&events=div%2Csplits",
            self.base_url.trim_end_matches('/'),
            normalize_yahoo_symbol(symbol),
            range,
            interval
        )
    }
}

#[async_trait]
impl HistoryProvider for YahooFinanceClient {
    async fn fetch(
        &self,
        symbol: &str,
        range: &str,
        interval: &str,
    ) -> Result<PriceSeries, ProviderError> {
        let url = self.chart_url(symbol, range, interval);
        debug!("Fetching Yahoo Finance data: {}", url);

        let response = self.client.get(&url).send().await?;

        // Unknown symbols answer 404 with an error body
        let status = response.status();
        if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::Status(status));
        }

        let data: YahooChartResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        parse_chart(symbol, data)
    }
}
