//! Error types for export-stream
//!
//! This module provides comprehensive error handling for the library, including:
//! - Domain-specific error types (Validation, Streaming, Database, etc.)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes
//! - Context information (job id, format, column name, etc.)

use crate::types::ExportFormat;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for export-stream operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for export-stream
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "pool_size")
        key: Option<String>,
    },

    /// Request validation failed
    #[error("validation error: {message}")]
    Validation {
        /// Human-readable description of what is invalid
        message: String,
        /// Field-level context (e.g., which field failed and why)
        details: Option<serde_json::Value>,
    },

    /// Export job not found in the registry
    #[error("export job {0} not found")]
    NotFound(String),

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Streaming pipeline error (source, encoding, or sink stage)
    #[error("streaming error: {0}")]
    Streaming(#[from] StreamingError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

impl Error {
    /// Construct a validation error with a field-level detail entry
    pub fn validation_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let field = field.into();
        let message = message.into();
        Error::Validation {
            details: Some(serde_json::json!({ "field": field, "reason": message })),
            message,
        }
    }
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}

/// Errors raised by the streaming pipeline stages.
///
/// Whether one of these reaches the client as a structured response or as
/// a truncated stream depends on when it occurs: before the first output
/// byte it maps to a 500 body, afterwards the stream is simply cut off.
#[derive(Debug, Clone, Error)]
pub enum StreamingError {
    /// Cursor open or mid-stream read failure on the data source
    #[error("source error: {0}")]
    Source(String),

    /// A requested source column does not exist on the records table
    #[error("unknown source column: {column}")]
    UnknownColumn {
        /// The column name that failed catalog validation
        column: String,
    },

    /// Format encoder failed to encode a row or finalize the document
    #[error("encoding error ({format}): {message}")]
    Encoding {
        /// The format being encoded when the failure occurred
        format: ExportFormat,
        /// The underlying encoder failure
        message: String,
    },

    /// Sink write failed
    #[error("sink error: {0}")]
    Sink(String),

    /// The consumer closed the sink before the stream finished
    #[error("sink closed by consumer before stream completion")]
    SinkClosed,
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
/// It follows a standard format with machine-readable error codes,
/// human-readable messages, and optional contextual details.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "not_found",
///     "message": "export job 7f3a… not found",
///     "details": {
///       "export_id": "7f3a…"
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "validation_error")
    ///
    /// Clients can use this for programmatic error handling.
    pub code: String,

    /// Human-readable error message
    ///
    /// This is suitable for displaying to end users.
    pub message: String,

    /// Optional additional context about the error
    ///
    /// This can include fields like export_id, column names, validation errors, etc.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
///
/// This trait maps domain errors to appropriate HTTP status codes.
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::Validation { .. } => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,

            // 500 Internal Server Error - Server-side issues
            Error::Database(_) => 500,
            Error::Sqlx(_) => 500,
            Error::Streaming(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Validation { .. } => "validation_error",
            Error::NotFound(_) => "not_found",
            Error::Database(_) => "database_error",
            Error::Sqlx(_) => "database_error",
            Error::Streaming(e) => match e {
                StreamingError::Source(_) => "source_error",
                StreamingError::UnknownColumn { .. } => "unknown_column",
                StreamingError::Encoding { .. } => "encoding_error",
                StreamingError::Sink(_) => "sink_error",
                StreamingError::SinkClosed => "sink_closed",
            },
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        // Add contextual details for specific error types
        let details = match &error {
            Error::Validation { details, .. } => details.clone(),
            Error::NotFound(id) => Some(serde_json::json!({
                "export_id": id,
            })),
            Error::Streaming(StreamingError::UnknownColumn { column }) => {
                Some(serde_json::json!({
                    "column": column,
                }))
            }
            Error::Streaming(StreamingError::Encoding { format, .. }) => {
                Some(serde_json::json!({
                    "format": format.as_str(),
                }))
            }
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
