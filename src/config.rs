use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::services::scheduler::SchedulerSettings;
use crate::services::signals::{IndicatorSettings, SignalCalculator};
use crate::types::ScoringPolicy;

/// Tickers tracked when `SYMBOLS` is not set.
pub const DEFAULT_SYMBOLS: &[&str] = &[
    "PETR4.SA", "VALE3.SA", "ITUB4.SA", "BBDC4.SA", "BBAS3.SA", "ABEV3.SA", "B3SA3.SA",
    "SUZB3.SA", "WEGE3.SA", "GGBR4.SA", "CSNA3.SA", "RADL3.SA", "AAPL34.SA", "AMZO34.SA",
    "MELI34.SA", "MSFT34.SA", "NVDC34.SA", "PFIZ34.SA",
];

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// SQLite database file.
    pub database_path: String,
    /// Ordered, deduplicated ticker list.
    pub symbols: Vec<String>,
    /// Exchange suffix tried by lookups that omit it.
    pub symbol_suffix: String,
    /// Pause between refresh cycles.
    pub update_interval: Duration,
    /// Scoring policy.
    pub policy: ScoringPolicy,
    /// Bars required before a symbol is scored.
    pub min_history_bars: usize,
    /// Provider lookback.
    pub history_range: String,
    /// Provider bar interval.
    pub history_interval: String,
    /// Indicator windows.
    pub indicators: IndicatorSettings,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let policy = match get("SCORING_POLICY") {
            Some(name) => ScoringPolicy::from_str(&name).ok_or(ConfigError::InvalidValue {
                key: "SCORING_POLICY",
                value: name,
            })?,
            None => ScoringPolicy::default(),
        };

        let symbols = match get("SYMBOLS") {
            Some(list) => parse_symbols(&list),
            None => DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
        };
        if symbols.is_empty() {
            return Err(ConfigError::NoSymbols);
        }

        let indicators = IndicatorSettings {
            rsi_period: positive(&get, "RSI_PERIOD", 14)?,
            volatility_window: positive(&get, "VOLATILITY_WINDOW", 20)?,
            volume_window: positive(&get, "VOLUME_WINDOW", 20)?,
            breakout_window: positive(&get, "BREAKOUT_WINDOW", 20)?,
        };

        // A standard deviation needs two returns
        if indicators.volatility_window < 2 {
            return Err(ConfigError::TooSmall {
                key: "VOLATILITY_WINDOW",
                min: 2,
            });
        }

        let min_history_bars = positive(&get, "MIN_HISTORY_BARS", policy.default_min_history())?;
        let required = SignalCalculator::required_bars(policy, &indicators);
        if min_history_bars < required {
            return Err(ConfigError::HistoryTooShort {
                configured: min_history_bars,
                required,
                policy: policy.name(),
            });
        }

        let update_interval_secs: u64 = positive(&get, "UPDATE_INTERVAL_SECS", 60)?;

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&get, "PORT", 8000)?,
            database_path: get("DATABASE_PATH").unwrap_or_else(|| "stocknews.db".to_string()),
            symbols,
            symbol_suffix: get("SYMBOL_SUFFIX")
                .map(|s| s.to_uppercase())
                .unwrap_or_else(|| ".SA".to_string()),
            update_interval: Duration::from_secs(update_interval_secs),
            policy,
            min_history_bars,
            history_range: get("HISTORY_RANGE")
                .unwrap_or_else(|| policy.default_history_range().to_string()),
            history_interval: get("HISTORY_INTERVAL").unwrap_or_else(|| "1d".to_string()),
            indicators,
        })
    }

    /// Get the server address string.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn calculator(&self) -> SignalCalculator {
        SignalCalculator::new(self.policy, self.indicators, self.min_history_bars)
    }

    pub fn scheduler_settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            symbols: self.symbols.clone(),
            interval: self.update_interval,
            history_range: self.history_range.clone(),
            history_interval: self.history_interval.clone(),
        }
    }
}

/// Split a comma-separated list, upper-case it and drop repeats (first wins).
fn parse_symbols(list: &str) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    for symbol in list.split(',').map(|s| s.trim().to_uppercase()) {
        if !symbol.is_empty() && !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }
    symbols
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(default),
    }
}

fn positive<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Default + PartialEq,
    G: Fn(&str) -> Option<String>,
{
    let value = parse_or(get, key, default)?;
    if value == T::default() {
        return Err(ConfigError::Zero(key));
    }
    Ok(value)
}
