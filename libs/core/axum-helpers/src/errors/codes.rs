//! Type-safe error codes for API responses.
//!
//! Each code carries a SCREAMING_SNAKE_CASE identifier for clients, an integer for
//! logs and dashboards, and a default message.
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! let code = ErrorCode::DuplicateRequest;
//! assert_eq!(code.as_str(), "DUPLICATE_REQUEST");
//! assert_eq!(code.code(), 1013);
//! ```

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standardized error codes for API responses.
///
/// Ranges:
/// - 1000s: request and workflow errors
/// - 2000s: storage errors
/// - 4000s: I/O errors
/// - 5000s: serialization errors
/// - 6000s: scoring collaborator errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    InvalidUuid,
    JsonExtraction,
    NotFound,
    InternalError,
    Unauthorized,
    Forbidden,
    Conflict,
    UnprocessableEntity,
    InvalidJson,
    ServiceUnavailable,
    BadRequest,
    /// An active connection request already exists for the same idempotency key
    DuplicateRequest,
    /// The connection request is no longer pending
    InvalidTransition,

    StorageError,
    StorageUnavailable,

    IoError,

    SerdeJsonError,

    EmbeddingUnavailable,
    DimensionMismatch,
}

impl ErrorCode {
    /// String identifier returned to clients in the `error` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InvalidUuid => "INVALID_UUID",
            Self::JsonExtraction => "JSON_EXTRACTION",
            Self::NotFound => "NOT_FOUND",
            Self::InternalError => "INTERNAL_ERROR",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::Conflict => "CONFLICT",
            Self::UnprocessableEntity => "UNPROCESSABLE_ENTITY",
            Self::InvalidJson => "INVALID_JSON",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::BadRequest => "BAD_REQUEST",
            Self::DuplicateRequest => "DUPLICATE_REQUEST",
            Self::InvalidTransition => "INVALID_TRANSITION",
            Self::StorageError => "STORAGE_ERROR",
            Self::StorageUnavailable => "STORAGE_UNAVAILABLE",
            Self::IoError => "IO_ERROR",
            Self::SerdeJsonError => "SERDE_JSON_ERROR",
            Self::EmbeddingUnavailable => "EMBEDDING_UNAVAILABLE",
            Self::DimensionMismatch => "DIMENSION_MISMATCH",
        }
    }

    /// Integer code used in structured logs and metrics.
    pub fn code(&self) -> i32 {
        match self {
            Self::ValidationError => 1001,
            Self::InvalidUuid => 1002,
            Self::JsonExtraction => 1003,
            Self::NotFound => 1004,
            Self::InternalError => 1005,
            Self::Unauthorized => 1006,
            Self::Forbidden => 1007,
            Self::Conflict => 1008,
            Self::UnprocessableEntity => 1009,
            Self::InvalidJson => 1010,
            Self::ServiceUnavailable => 1011,
            Self::BadRequest => 1012,
            Self::DuplicateRequest => 1013,
            Self::InvalidTransition => 1014,

            Self::StorageError => 2001,
            Self::StorageUnavailable => 2002,

            Self::IoError => 4001,

            Self::SerdeJsonError => 5001,

            Self::EmbeddingUnavailable => 6001,
            Self::DimensionMismatch => 6002,
        }
    }

    /// Default human-readable message; handlers may override it.
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::ValidationError => "Request validation failed",
            Self::InvalidUuid => "Invalid UUID format",
            Self::JsonExtraction => "Failed to parse request body",
            Self::NotFound => "Resource not found",
            Self::InternalError => "An internal server error occurred",
            Self::Unauthorized => "Authentication required",
            Self::Forbidden => "Access forbidden",
            Self::Conflict => "Resource already exists",
            Self::UnprocessableEntity => "Request cannot be processed",
            Self::InvalidJson => "Invalid JSON format",
            Self::ServiceUnavailable => "Service is temporarily unavailable",
            Self::BadRequest => "Bad request",
            Self::DuplicateRequest => "A connection request for this pairing is already active",
            Self::InvalidTransition => "Connection request is no longer pending",
            Self::StorageError => "Storage error occurred",
            Self::StorageUnavailable => "Storage is temporarily unavailable",
            Self::IoError => "I/O error occurred",
            Self::SerdeJsonError => "JSON serialization error",
            Self::EmbeddingUnavailable => "Embedding service is unavailable",
            Self::DimensionMismatch => "Embedding dimensions do not match",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
