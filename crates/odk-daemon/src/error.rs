//! HTTP mapping for the store error taxonomy.
//!
//! Validation-class errors carry their message to the client verbatim (they
//! describe the caller's own input). Storage failures are logged and
//! replaced by an opaque 500 body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use odk_db::StoreError;
use tracing::error;

use crate::api_types::ErrorResponse;

#[derive(Debug)]
pub enum ApiError {
    /// Missing/invalid bearer token, or failed login.
    Unauthorized,
    /// Authenticated, but not allowed to touch this resource.
    Forbidden(&'static str),
    /// Request malformed in a way the store never saw.
    BadRequest(String),
    /// Anything the store reported.
    Store(StoreError),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Store(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "authentication required".to_string(),
            ),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "validation", msg),
            ApiError::Store(e) => match e {
                StoreError::Validation(_)
                | StoreError::Invalid(_)
                | StoreError::UnknownRole(_) => {
                    (StatusCode::BAD_REQUEST, "validation", e.to_string())
                }
                StoreError::BadCredentials => {
                    (StatusCode::UNAUTHORIZED, "unauthorized", e.to_string())
                }
                StoreError::NotFound { .. } => {
                    (StatusCode::NOT_FOUND, "not_found", e.to_string())
                }
                StoreError::Conflict(_) => (StatusCode::CONFLICT, "conflict", e.to_string()),
                StoreError::Db(db_err) => {
                    error!(error = %db_err, "storage failure");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal",
                        "internal storage error".to_string(),
                    )
                }
            },
        };

        (
            status,
            Json(ErrorResponse { error: message, kind: kind.to_string() }),
        )
            .into_response()
    }
}
