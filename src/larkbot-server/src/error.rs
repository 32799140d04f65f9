//! Error types for the server.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use larkbot::LarkError;
use serde::Serialize;
use thiserror::Error;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid server configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Failure talking to the Lark platform.
    #[error(transparent)]
    Lark(#[from] LarkError),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Lark(LarkError::RateLimited { .. }) => StatusCode::TOO_MANY_REQUESTS,
            Self::Lark(LarkError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            Self::Lark(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Get the error code string.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_error",
            Self::NotFound(_) => "not_found",
            Self::Lark(_) => "lark_error",
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type.
    pub error: ErrorDetail,
}

/// Error detail.
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// Error code.
    pub code: String,
    /// Error message.
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for the server.
pub type AppResult<T> = Result<T, AppError>;
