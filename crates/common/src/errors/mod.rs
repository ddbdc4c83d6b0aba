//! Error types for Observatory services
//!
//! Provides a comprehensive error handling system with:
//! - Distinct error types for different failure modes
//! - HTTP status code mapping
//! - Structured error responses
//! - Error codes for client handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,

    // Resource errors (4xxx)
    NotFound,
    ResearcherNotFound,
    SessionNotFound,

    // Conflict errors (5xxx)
    SearchInProgress,
    ChatInProgress,

    // Rate limiting (6xxx)
    RateLimited,

    // Data source errors (7xxx)
    DataLoadError,

    // External service errors (8xxx)
    UpstreamError,
    ModelError,
    ModelTimeout,
    MalformedModelReply,
    ModelUnavailable,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 1001,

            ErrorCode::NotFound => 4001,
            ErrorCode::ResearcherNotFound => 4002,
            ErrorCode::SessionNotFound => 4003,

            ErrorCode::SearchInProgress => 5001,
            ErrorCode::ChatInProgress => 5002,

            ErrorCode::RateLimited => 6001,

            ErrorCode::DataLoadError => 7001,

            ErrorCode::UpstreamError => 8001,
            ErrorCode::ModelError => 8002,
            ErrorCode::ModelTimeout => 8003,
            ErrorCode::MalformedModelReply => 8004,
            ErrorCode::ModelUnavailable => 8005,

            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    // Resource errors
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound { resource_type: String, id: String },

    #[error("Researcher not found: {id}")]
    ResearcherNotFound { id: String },

    #[error("Session not found: {id}")]
    SessionNotFound { id: String },

    // Conflict errors
    #[error("A search is already running for session {id}")]
    SearchInProgress { id: String },

    #[error("A chat question is already awaiting an answer")]
    ChatInProgress,

    // Rate limiting
    #[error("Rate limit exceeded: {limit} requests per second")]
    RateLimited { limit: u32 },

    // Data source errors
    #[error("Failed to load {source_name}: {message}")]
    DataLoad { source_name: String, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    // External service errors
    #[error("Language model error: {message}")]
    ModelError { message: String },

    #[error("Language model timeout after {timeout_ms}ms")]
    ModelTimeout { timeout_ms: u64 },

    #[error("Malformed model reply: {message}")]
    MalformedModelReply { message: String },

    #[error("Language model not configured")]
    ModelUnavailable,

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::ResearcherNotFound { .. } => ErrorCode::ResearcherNotFound,
            AppError::SessionNotFound { .. } => ErrorCode::SessionNotFound,
            AppError::SearchInProgress { .. } => ErrorCode::SearchInProgress,
            AppError::ChatInProgress => ErrorCode::ChatInProgress,
            AppError::RateLimited { .. } => ErrorCode::RateLimited,
            AppError::DataLoad { .. } | AppError::Csv(_) => ErrorCode::DataLoadError,
            AppError::ModelError { .. } => ErrorCode::ModelError,
            AppError::ModelTimeout { .. } => ErrorCode::ModelTimeout,
            AppError::MalformedModelReply { .. } => ErrorCode::MalformedModelReply,
            AppError::ModelUnavailable => ErrorCode::ModelUnavailable,
            AppError::HttpClient(_) => ErrorCode::UpstreamError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,

            // 404 Not Found
            AppError::NotFound { .. }
            | AppError::ResearcherNotFound { .. }
            | AppError::SessionNotFound { .. } => StatusCode::NOT_FOUND,

            // 409 Conflict
            AppError::SearchInProgress { .. } | AppError::ChatInProgress => StatusCode::CONFLICT,

            // 429 Too Many Requests
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,

            // 500 Internal Server Error
            AppError::DataLoad { .. }
            | AppError::Csv(_)
            | AppError::Internal { .. }
            | AppError::Configuration { .. }
            | AppError::Serialization(_)
            | AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,

            // 502 Bad Gateway
            AppError::ModelError { .. }
            | AppError::ModelTimeout { .. }
            | AppError::MalformedModelReply { .. }
            | AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable
            AppError::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Whether the search pipeline should degrade to the local fallback
    /// instead of surfacing this error
    pub fn is_classifier_failure(&self) -> bool {
        matches!(
            self,
            AppError::ModelError { .. }
                | AppError::ModelTimeout { .. }
                | AppError::MalformedModelReply { .. }
                | AppError::ModelUnavailable
                | AppError::HttpClient(_)
                | AppError::Serialization(_)
        )
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        // Log based on severity
        if self.is_server_error() {
            tracing::error!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let details = match &self {
            AppError::Validation { field: Some(field), .. } => {
                Some(serde_json::json!({ "field": field }))
            }
            _ => None,
        };

        let body = ErrorResponse {
            error: ErrorDetails {
                code,
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::ResearcherNotFound { id: "42".into() };
        assert_eq!(err.code(), ErrorCode::ResearcherNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.code().as_code(), 4002);
    }

    #[test]
    fn test_validation_error() {
        let err = AppError::Validation {
            message: "Empty query".into(),
            field: Some("query".into()),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.is_server_error());
        assert!(err.is_client_error());
    }

    #[test]
    fn test_search_in_progress_is_conflict() {
        let err = AppError::SearchInProgress { id: "abc".into() };
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let err = AppError::ChatInProgress;
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.code().as_code(), 5002);
        assert!(!err.to_string().contains("search"));
    }

    #[test]
    fn test_classifier_failures() {
        assert!(AppError::ModelUnavailable.is_classifier_failure());
        assert!(AppError::ModelTimeout { timeout_ms: 30_000 }.is_classifier_failure());
        let malformed = AppError::MalformedModelReply {
            message: "no json".into(),
        };
        assert!(malformed.is_classifier_failure());
        assert!(!AppError::Internal { message: "boom".into() }.is_classifier_failure());
    }
}
