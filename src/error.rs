use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Invalid configuration. Fatal at startup.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{key} must be at least {min}")]
    TooSmall { key: &'static str, min: usize },

    #[error("Symbol list is empty")]
    NoSymbols,

    #[error("MIN_HISTORY_BARS is {configured} but the {policy} policy needs at least {required} bars")]
    HistoryTooShort {
        configured: usize,
        required: usize,
        policy: &'static str,
    },
}

/// Failure talking to the price history provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Status(reqwest::StatusCode),

    #[error("Upstream error: {code} - {description}")]
    Upstream { code: String, description: String },

    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Failure of the signal store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store can no longer be used at all.
    #[error("Signal store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

/// What the refresh cycle does with a failed symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Expected outcome, drop the symbol quietly.
    Skip,
    /// Log and carry on with the next symbol.
    Fail,
    /// Stop the cycle and keep the previous ranking.
    Abort,
}

/// Per-symbol outcome of a refresh cycle.
#[derive(Error, Debug)]
pub enum SymbolError {
    #[error("Insufficient history: {bars} bars, {required} required")]
    InsufficientData { bars: usize, required: usize },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SymbolError {
    pub fn disposition(&self) -> Disposition {
        match self {
            SymbolError::InsufficientData { .. } => Disposition::Skip,
            SymbolError::Provider(_) => Disposition::Fail,
            SymbolError::Store(StoreError::Sqlite(_)) => Disposition::Fail,
            SymbolError::Store(StoreError::Unavailable(_)) => Disposition::Abort,
        }
    }

    /// Pipeline phase the error came from, for logging.
    pub fn phase(&self) -> &'static str {
        match self {
            SymbolError::InsufficientData { .. } => "compute",
            SymbolError::Provider(_) => "fetch",
            SymbolError::Store(_) => "persist",
        }
    }
}

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            AppError::Provider(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
