use axum::Router;
use std::sync::Arc;
use stockrank::api;
use stockrank::config::Config;
use stockrank::services::{RankingCache, RefreshScheduler, SqliteStore};
use stockrank::sources::YahooFinanceClient;
use stockrank::AppState;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockrank=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env()?);
    info!(
        "Starting StockRank on {} ({} symbols, {} policy)",
        config.server_addr(),
        config.symbols.len(),
        config.policy.name()
    );

    let store = Arc::new(SqliteStore::new(&config.database_path)?);
    info!("Signal log at {} ({} rows)", config.database_path, store.count()?);

    let provider = Arc::new(YahooFinanceClient::new()?);
    let cache = RankingCache::new();

    // Start the refresh loop; the first cycle runs right away
    let scheduler = RefreshScheduler::new(
        provider.clone(),
        store.clone(),
        cache.clone(),
        config.calculator(),
        config.scheduler_settings(),
    );
    let scheduler_handle = scheduler.spawn();

    let state = AppState {
        config: config.clone(),
        cache,
        store,
        provider,
    };

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(api::router())
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start the server
    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("StockRank server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop();
    scheduler_handle.await?;
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
