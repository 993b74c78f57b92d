//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use simulation::SimulationError;

/// Application error with an HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid request data (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Precondition failed, e.g. populate while busy (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal server error (500).
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<SimulationError> for AppError {
    fn from(err: SimulationError) -> Self {
        match err {
            SimulationError::UnknownSymbol(symbol) => {
                AppError::NotFound(format!("unknown symbol: {symbol}"))
            }
            SimulationError::Rejected(msg) => AppError::Conflict(msg),
            SimulationError::Config(msg) => AppError::BadRequest(msg),
            SimulationError::Core(core) => AppError::BadRequest(core.to_string()),
            SimulationError::Export(msg) => AppError::Internal(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = axum::Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));
        (status, body).into_response()
    }
}

/// Result alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
