//! Error types and handling for the villa server
//!
//! This module defines all error types used throughout the system, plus the
//! mapping from errors to HTTP responses used by the API handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Main result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the villa server
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Document store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// AI service errors
    #[error("AI service error: {0}")]
    Ai(#[from] AiError),

    /// Media library and image-processing errors
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Resource already exists
    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Too many requests from one client
    #[error("Too many requests")]
    RateLimited,

    /// A required collaborator is not configured or reachable
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Internal system errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// I/O errors from std
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Prometheus metrics errors
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Document-store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Writing the backing file failed; the in-memory mutation was kept
    /// but is not durable
    #[error("Failed to persist store: {0}")]
    Save(#[source] std::io::Error),

    /// Serializing the store to JSON failed
    #[error("Failed to serialize store: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A filter operator outside the supported set was requested
    #[error("Unsupported filter operator: {0:?} (supported: ==, !=)")]
    UnknownOperator(String),
}

/// AI collaborator errors
#[derive(Error, Debug)]
pub enum AiError {
    /// No API key configured
    #[error("AI service not configured")]
    NotConfigured,

    /// Transport-level failure talking to the API
    #[error("AI request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the API
    #[error("AI request rejected: HTTP {status}: {body}")]
    Status {
        /// HTTP status code returned by the API
        status: u16,
        /// Response body, truncated for logging
        body: String,
    },

    /// The completion contained no content
    #[error("Empty completion from AI service")]
    EmptyCompletion,

    /// The completion content was not parseable JSON
    #[error("Non-JSON response from AI service: {0}")]
    MalformedResponse(String),

    /// The parsed output failed schema validation
    #[error("AI output failed validation: {0}")]
    Schema(String),

    /// Supplied image data was not usable
    #[error("Invalid image data: {0}")]
    InvalidImage(String),

    /// All models and retries produced boilerplate or vague output
    #[error("AI output rejected after retries: {0}")]
    Rejected(String),
}

/// Media library and image-processor errors
#[derive(Error, Debug)]
pub enum MediaError {
    /// File type outside the upload allow-list
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    /// Object path escapes the media root or is malformed
    #[error("Invalid object path: {0}")]
    InvalidPath(String),

    /// Stored object missing
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Disk I/O failure
    #[error("Media I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The external image processor returned an error
    #[error("Image processor error: {0}")]
    Processor(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    /// Create an already exists error
    pub fn already_exists(resource: impl Into<String>) -> Self {
        Self::AlreadyExists(resource.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// HTTP status this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::AlreadyExists(_) => StatusCode::CONFLICT,
            Error::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Error::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Store(StoreError::UnknownOperator(_)) => StatusCode::BAD_REQUEST,
            Error::Ai(AiError::NotConfigured) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Ai(AiError::InvalidImage(_)) => StatusCode::BAD_REQUEST,
            Error::Media(MediaError::UnsupportedType(_))
            | Error::Media(MediaError::InvalidPath(_)) => StatusCode::BAD_REQUEST,
            Error::Media(MediaError::NotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this is a client error (4xx equivalent)
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}
