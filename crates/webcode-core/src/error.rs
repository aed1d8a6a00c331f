//! Error types for WebCode.

use serde::Serialize;
use thiserror::Error;

/// A shared error type for the entire WebCode workspace.
///
/// Variants follow the failure taxonomy of the service layer: validation
/// failures are rejected before any I/O, missing entities are reported as
/// `NotFound`, and storage failures on write paths are wrapped into
/// `OperationFailed` so the raw driver message never reaches the HTTP boundary.
#[derive(Error, Debug, Clone, Serialize)]
pub enum WebCodeError {
    /// Invalid or empty identifier / payload
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// A write path failed; `cause` carries the underlying error for logging
    #[error("Operation failed: {message}")]
    OperationFailed { message: String, cause: String },

    /// Data access error (repository/storage layer)
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Git command error
    #[error("Git error: {0}")]
    Git(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WebCodeError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an InvalidArgument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Wraps an underlying failure into an OperationFailed error
    pub fn operation_failed(message: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::OperationFailed {
            message: message.into(),
            cause: cause.to_string(),
        }
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is an InvalidArgument error
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an OperationFailed error
    pub fn is_operation_failed(&self) -> bool {
        matches!(self, Self::OperationFailed { .. })
    }

    /// Check if this is a Storage error
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for WebCodeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for WebCodeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for WebCodeError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<minijinja::Error> for WebCodeError {
    fn from(err: minijinja::Error) -> Self {
        Self::InvalidArgument(format!("template rendering failed: {}", err))
    }
}

impl From<anyhow::Error> for WebCodeError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, WebCodeError>`.
pub type Result<T> = std::result::Result<T, WebCodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_failed_hides_cause_from_display() {
        let err = WebCodeError::operation_failed("failed to save session", "disk I/O error");
        assert_eq!(err.to_string(), "Operation failed: failed to save session");
        match err {
            WebCodeError::OperationFailed { cause, .. } => assert_eq!(cause, "disk I/O error"),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: WebCodeError = io.into();
        assert!(matches!(err, WebCodeError::Io { .. }));
        assert!(err.to_string().contains("NotFound"));
    }
}
