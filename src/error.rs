use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// ApiError
///
/// The application's full error taxonomy. Expected misses (unknown project
/// id, absent profile) are returned by the repository as `None`/`false` and
/// mapped to `NotFound` by the handlers; only invariant violations and
/// authorization failures are raised as errors directly. Nothing in this
/// taxonomy is ever retried automatically.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Permanent: the single-admin invariant already holds. Surfaced by the
    /// setup route once an admin account exists.
    #[error("Admin account already exists. Only one admin is allowed.")]
    AdminAlreadyExists,

    /// Uniform login failure. The same variant (and message) covers both an
    /// unknown username and a wrong password so responses cannot be used for
    /// account enumeration.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Missing, expired, or dangling session. Raised by the session gate
    /// before any store mutation is attempted.
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found")]
    NotFound,

    /// The notification relay could not deliver the contact submission. The
    /// submission is not persisted anywhere; the caller decides whether to
    /// retry.
    #[error("Failed to deliver contact message")]
    RelayDeliveryFailed(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::AdminAlreadyExists => (StatusCode::FORBIDDEN, self.to_string()),
            ApiError::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::RelayDeliveryFailed(reason) => {
                tracing::error!("Contact relay delivery failed: {}", reason);
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
