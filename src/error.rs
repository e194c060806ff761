use axum::{Json, http::StatusCode, response::IntoResponse, response::Response};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// ApiError
///
/// The single error taxonomy of the core. Every failure a request can hit maps
/// to exactly one of these variants, and every variant maps to exactly one
/// HTTP status code. All errors are terminal for the current request; the core
/// never retries internally (retry-on-conflict is the caller's job).
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, malformed, expired or otherwise invalid credential, or a
    /// credential naming a user that no longer exists.
    #[error("authentication required")]
    Unauthenticated,

    /// Authenticated, but the access policy denies the requested action.
    #[error("access denied")]
    Forbidden,

    /// Resource absent — or deliberately hidden (a closed todo is
    /// indistinguishable from an absent one to its non-admin owner).
    #[error("{0}")]
    NotFound(String),

    /// Version or id mismatch on a version-sensitive write, or a uniqueness
    /// violation on insert. The caller must re-fetch and retry.
    #[error("{0}")]
    Conflict(String),

    /// Malformed payload rejected before it reaches the decision logic.
    #[error("{0}")]
    Validation(String),

    /// Store failure. Logged with full detail, surfaced opaquely.
    #[error("internal error")]
    Internal(#[from] sqlx::Error),
}

/// ErrorBody
///
/// The JSON shape every error response carries.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(e) => {
                // The sqlx detail stays in the logs, not in the response body.
                tracing::error!("store error: {:?}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
