//! Market quote endpoint.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::AppState;

/// Lookback wide enough to cover weekends and holidays.
const QUOTE_RANGE: &str = "5d";

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub ticker: String,
    pub price: f64,
}

/// Create the market router.
pub fn router() -> Router<AppState> {
    Router::new().route("/quote/:ticker", get(get_quote))
}

/// Latest close for a ticker straight from the provider.
async fn get_quote(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<QuoteResponse>> {
    let ticker = ticker.trim().to_uppercase();
    let series = state
        .provider
        .fetch(&ticker, QUOTE_RANGE, &state.config.history_interval)
        .await?;

    let last = series
        .last()
        .ok_or_else(|| AppError::NotFound(format!("Ticker not found: {}", ticker)))?;

    Ok(Json(QuoteResponse {
        ticker,
        price: last.close,
    }))
}
