//! Ranking API endpoints, served from the in-memory cache.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::types::{Ranking, ScoredSignal};
use crate::AppState;

const DEFAULT_MIN_SCORE: u8 = 50;

/// Query parameters for the top ranking endpoint.
#[derive(Debug, Deserialize)]
pub struct TopQuery {
    pub min_score: Option<String>,
}

impl TopQuery {
    /// Threshold in 0-100, defaulting to 50.
    fn min_score(&self) -> Result<u8> {
        let Some(raw) = self.min_score.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(DEFAULT_MIN_SCORE);
        };

        raw.parse::<u8>()
            .ok()
            .filter(|score| *score <= 100)
            .ok_or_else(|| {
                AppError::BadRequest(format!("min_score must be an integer from 0 to 100, got {:?}", raw))
            })
    }
}

/// Create the ranking router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_ranking))
        .route("/top", get(get_top))
        .route("/:symbol", get(get_symbol))
}

/// Full ranking by descending score.
async fn get_ranking(State(state): State<AppState>) -> Json<Ranking> {
    Json(state.cache.get_ranking())
}

/// Ranking entries at or above `min_score`.
async fn get_top(
    State(state): State<AppState>,
    Query(query): Query<TopQuery>,
) -> Result<Json<Ranking>> {
    let min_score = query.min_score()?;
    Ok(Json(state.cache.get_ranking_above(min_score)))
}

/// One cached entry. "petr4" also finds "PETR4.SA".
async fn get_symbol(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ScoredSignal>> {
    let symbol = symbol.trim().to_uppercase();
    let suffix = &state.config.symbol_suffix;

    state
        .cache
        .get(&symbol)
        .or_else(|| {
            if symbol.ends_with(suffix.as_str()) {
                None
            } else {
                state.cache.get(&format!("{}{}", symbol, suffix))
            }
        })
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No ranking entry for {}", symbol)))
}
