use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    policy: &'static str,
    symbols: usize,
    ranked: usize,
    updated_at: Option<DateTime<Utc>>,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.cache.snapshot();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        policy: state.config.policy.name(),
        symbols: state.config.symbols.len(),
        ranked: snapshot.entries.len(),
        updated_at: snapshot.updated_at,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}
