//! Error types for the docchat service.
//!
//! This module defines a unified error enum that covers all error categories
//! in the service: configuration, corpus indexing, request validation,
//! provider calls, prompt rendering and I/O.

use thiserror::Error;

/// Unified error type for the docchat service.
///
/// All fallible functions return `Result<T, AppError>`.
/// Startup errors (`Config`, `EmptyCorpus`) terminate the process; request
/// errors are reported to the caller and the service keeps running.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (missing credential, invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The corpus produced no chunks to index
    #[error("Empty corpus: {0}")]
    EmptyCorpus(String),

    /// A document had no text to chunk
    #[error("Empty document: {0}")]
    EmptyDocument(String),

    /// Invalid caller input
    #[error("{0}")]
    Validation(String),

    /// Embedding or generation provider failures
    #[error("Provider error: {0}")]
    Provider(String),

    /// A provider call exceeded its time budget
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// Vector index and retrieval errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether the error was caused by the caller rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_validation_is_client_error() {
        assert!(AppError::Validation("Message cannot be empty".to_string()).is_client_error());
        assert!(!AppError::Provider("boom".to_string()).is_client_error());
        assert!(!AppError::EmptyCorpus("none".to_string()).is_client_error());
    }

    #[test]
    fn test_timeout_display() {
        let err = AppError::Timeout {
            operation: "generation".to_string(),
            timeout_ms: 1500,
        };
        assert_eq!(err.to_string(), "generation timed out after 1500ms");
    }

    #[test]
    fn test_validation_display_is_bare_message() {
        let err = AppError::Validation("Message cannot be empty".to_string());
        assert_eq!(err.to_string(), "Message cannot be empty");
    }
}
