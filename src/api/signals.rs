//! Signal log API endpoints.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::types::{SignalRecord, Trend};
use crate::AppState;

const DEFAULT_LATEST_LIMIT: usize = 20;
const MAX_LIMIT: usize = 500;
const HISTORY_LIMIT: usize = 100;

/// Query parameters for the latest signals endpoint.
#[derive(Debug, Deserialize)]
pub struct LatestQuery {
    pub limit: Option<String>,
}

impl LatestQuery {
    /// Row limit, defaulting to 20 and capped at 500.
    fn limit(&self) -> Result<usize> {
        let Some(raw) = self.limit.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(DEFAULT_LATEST_LIMIT);
        };

        let limit: usize = raw
            .parse()
            .map_err(|_| AppError::BadRequest(format!("limit must be a non-negative integer, got {:?}", raw)))?;
        Ok(limit.min(MAX_LIMIT))
    }
}

/// Query parameters for the history endpoint.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub symbol: Option<String>,
}

/// Persisted signal as listed by the API.
#[derive(Debug, Serialize)]
pub struct SignalSummary {
    pub symbol: String,
    pub score: u8,
    pub trend: Trend,
    pub rsi: f64,
    pub created_at: DateTime<Utc>,
}

impl From<SignalRecord> for SignalSummary {
    fn from(record: SignalRecord) -> Self {
        Self {
            symbol: record.symbol,
            score: record.score,
            trend: record.trend,
            rsi: record.rsi,
            created_at: record.created_at,
        }
    }
}

/// Create the signals router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/latest", get(get_latest))
        .route("/history", get(get_history))
}

/// Most recent signal changes across all symbols.
async fn get_latest(
    State(state): State<AppState>,
    Query(query): Query<LatestQuery>,
) -> Result<Json<Vec<SignalSummary>>> {
    let limit = query.limit()?;
    let records = state.store.latest(limit)?;
    Ok(Json(records.into_iter().map(SignalSummary::from).collect()))
}

/// Signal changes for one symbol, newest first.
async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<SignalSummary>>> {
    let symbol = query
        .symbol
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("symbol is required".to_string()))?;

    let records = state.store.history(&symbol, HISTORY_LIMIT)?;
    Ok(Json(records.into_iter().map(SignalSummary::from).collect()))
}
