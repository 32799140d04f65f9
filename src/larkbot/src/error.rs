//! Error types for the Lark integration.

use thiserror::Error;

/// Errors that can occur while talking to the Lark open platform.
#[derive(Error, Debug)]
pub enum LarkError {
    /// Configuration error (missing or invalid config).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication error (no token yet, rejected credentials, ...).
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The platform answered with a non-zero code or an HTTP failure.
    #[error("Lark API error: {0}")]
    Api(String),

    /// API rate limited.
    #[error("Rate limited: retry after {retry_after_secs} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// Network/HTTP error.
    #[error("Network error: {0}")]
    Network(String),

    /// Request timed out.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Invalid payload received from Lark.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for LarkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LarkError::Timeout(err.to_string())
        } else if err.is_connect() {
            LarkError::Network(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            LarkError::InvalidPayload(err.to_string())
        } else {
            LarkError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LarkError {
    fn from(err: serde_json::Error) -> Self {
        LarkError::Json(err.to_string())
    }
}

/// Result type for Lark operations.
pub type LarkResult<T> = std::result::Result<T, LarkError>;

/// A non-zero `code` returned in a platform response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LarkApiError {
    /// Platform error code.
    pub code: i64,
    /// Platform error message.
    pub msg: String,
}

impl LarkApiError {
    /// Create a new API error.
    pub fn new(code: i64, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
        }
    }

    /// Whether the code means the tenant access token is missing or stale.
    pub fn is_token_error(&self) -> bool {
        // 99991661: missing token, 99991663/99991668: invalid or expired token
        matches!(self.code, 99991661 | 99991663 | 99991668)
    }
}

impl From<LarkApiError> for LarkError {
    fn from(err: LarkApiError) -> Self {
        if err.is_token_error() {
            LarkError::Auth(format!("{}: {}", err.code, err.msg))
        } else {
            LarkError::Api(format!("{}: {}", err.code, err.msg))
        }
    }
}
