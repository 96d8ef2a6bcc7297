//! Error handling module.
//!
//! Two layers of errors live here:
//!
//! - [`StorageError`] is what raw backends and strategies report. Read paths
//!   never surface it; they collapse every failure to "no value". Write and
//!   clear paths return it to the persistent item, which logs and swallows it.
//! - [`AppError`] is what the key/value service reports to HTTP callers,
//!   with an error code and status mapping.

pub mod codes;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

pub use codes::{ErrorCategory, ErrorCode};

/// Application-level error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(#[from] config::ConfigError),

    /// A strategy scope could not be built from configuration.
    #[error("Unsupported scope: {0}")]
    UnsupportedScope(String),

    /// The `key` query parameter is missing or empty.
    #[error("Missing required parameter: key")]
    MissingKey,

    /// Storage backend error.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the error code for this error.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Config(_) => ErrorCode::INVALID_CONFIG,
            Self::UnsupportedScope(_) => ErrorCode::UNSUPPORTED_SCOPE,
            Self::MissingKey => ErrorCode::MISSING_KEY,
            Self::Storage(_) => ErrorCode::STORAGE_ERROR,
            Self::Internal(_) => ErrorCode::INTERNAL_ERROR,
        }
    }

    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingKey => StatusCode::BAD_REQUEST,
            Self::Config(_) | Self::UnsupportedScope(_) | Self::Storage(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let code = error_code.as_i32();
        let category = error_code.category();
        let message = self.to_string();

        // Caller mistakes are not service faults.
        if category == ErrorCategory::Validation {
            tracing::warn!(
                error_code = code,
                %category,
                status = %status,
                message = %message,
                "Request rejected"
            );
        } else {
            tracing::error!(
                error_code = code,
                %category,
                status = %status,
                message = %message,
                "Request failed"
            );
        }

        let body = Json(json!({
            "code": code,
            "message": message,
            "data": null
        }));

        (status, body).into_response()
    }
}

/// Storage-specific error type.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Connection error.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Request could not be built or sent.
    #[error("Request failed: {0}")]
    Request(String),

    /// Remote service answered with a non-success status.
    #[error("Remote service returned status {0}")]
    Status(u16),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// File I/O error.
    #[error("File I/O error: {0}")]
    FileIO(String),

    /// Lock acquisition failed.
    #[error("Failed to acquire lock: {0}")]
    LockFailed(String),

    /// Backend not available.
    #[error("Storage backend unavailable")]
    Unavailable,
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::FileIO(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else if err.is_connect() || err.is_timeout() {
            Self::Connection(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias using `StorageError`.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
