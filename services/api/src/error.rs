//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Custom error type for the API service
///
/// Every variant carries the stable error code returned to clients in
/// the `{"error": code}` body.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or invalid input field
    #[error("Validation error: {0}")]
    Validation(&'static str),

    /// Bad credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(&'static str),

    /// Record does not exist
    #[error("Not found")]
    NotFound,

    /// Internal failure; the detailed cause is logged server-side and
    /// only the generic code reaches the client
    #[error("Internal server error: {0}")]
    Internal(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match self {
            ApiError::Validation(code) => (StatusCode::BAD_REQUEST, code),
            ApiError::Unauthorized(code) => (StatusCode::UNAUTHORIZED, code),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Internal(code) => (StatusCode::INTERNAL_SERVER_ERROR, code),
        };

        let body = Json(json!({
            "error": code,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
