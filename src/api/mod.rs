pub mod health;
pub mod market;
pub mod ranking;
pub mod signals;

use crate::AppState;
use axum::Router;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/api/ranking", ranking::router())
        .nest("/api/signals", signals::router())
        .nest("/api/market", market::router())
}
