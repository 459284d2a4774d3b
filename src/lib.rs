//! StockRank - technical signal ranking for a fixed list of equities

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;

use std::sync::Arc;

use config::Config;
use services::{RankingCache, SignalRepository};
use sources::HistoryProvider;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cache: Arc<RankingCache>,
    pub store: Arc<dyn SignalRepository>,
    pub provider: Arc<dyn HistoryProvider>,
}

// Re-export commonly used types
pub use types::*;
