use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Result type for lifecycle and collaborator operations
pub type GameResult<T> = Result<T, GameError>;

/// Errors surfaced by the game core.
///
/// Every variant leaves the session unchanged: validation happens before any
/// mutation, and a persistence failure means the mutation was not committed.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// Bad input (name length, unknown category, malformed words)
    #[error("invalid request: {0}")]
    Validation(String),

    /// Unknown session or player
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation is not legal in the session's current status. Usually
    /// means the caller's view is stale; callers should resync and retry.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// External store failure; retryable, nothing was committed
    #[error("storage failure: {0}")]
    Persistence(String),
}

impl GameError {
    /// Stable machine-readable code for the wire protocol
    pub fn code(&self) -> &'static str {
        match self {
            GameError::Validation(_) => "VALIDATION",
            GameError::NotFound(_) => "NOT_FOUND",
            GameError::InvalidTransition(_) => "INVALID_TRANSITION",
            GameError::Persistence(_) => "PERSISTENCE",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            GameError::Validation(_) => StatusCode::BAD_REQUEST,
            GameError::NotFound(_) => StatusCode::NOT_FOUND,
            GameError::InvalidTransition(_) => StatusCode::CONFLICT,
            GameError::Persistence(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    msg: String,
}

impl IntoResponse for GameError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code(),
            msg: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
