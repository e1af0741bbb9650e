use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// ApiError
///
/// The single error taxonomy shared by every handler. Each variant maps to one
/// HTTP status code, and every error body has the shape `{"message": string}`
/// so clients never need to branch on response structure.
///
/// Handlers construct these directly (or via `?` on fallible calls) and rely
/// on the `IntoResponse` impl below for serialization.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing, malformed, expired, or otherwise unverifiable credential.
    #[error("Unauthorized")]
    Unauthorized,

    /// Login attempt with an unknown email or wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Valid credential, but the caller's role is not in the endpoint's allow-list.
    #[error("{0}")]
    Forbidden(String),

    /// The referenced entity or request row does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Missing or malformed required field, non-positive capacity, unparseable date/time.
    #[error("{0}")]
    InvalidInput(String),

    /// Action attempted on a request that is no longer pending.
    #[error("{0}")]
    InvalidState(String),

    /// Duplicate unique key (name, building+room, email) on create.
    #[error("{0}")]
    Conflict(String),

    /// A booking target exists but its availability flag is false.
    #[error("{0}")]
    ResourceUnavailable(String),

    /// Catch-all for unexpected failures. The detail is logged server-side;
    /// the client only ever sees a generic message.
    #[error("Server error")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InvalidState(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::ResourceUnavailable(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(detail) => {
                // Never leak internals to the client.
                tracing::error!("internal error: {detail}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Handler result alias used throughout the routes/handlers modules.
pub type ApiResult<T> = Result<T, ApiError>;
