//! Error types for the exam tutor.
//!
//! A single error enum covers configuration, corpus input, the embedding
//! model, the vector index and the retrieval boundary.

use thiserror::Error;

/// Unified error type for the exam tutor.
///
/// All fallible functions return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The corpus could not be read or is structurally invalid
    #[error("Corpus error: {0}")]
    Corpus(String),

    /// The embedding model cannot be loaded or invoked
    #[error("Embedding model unavailable: {0}")]
    ModelUnavailable(String),

    /// The vector index cannot be opened, written or queried
    #[error("Vector index unavailable: {0}")]
    IndexUnavailable(String),

    /// Opaque failure reported to retrieval callers
    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    /// Quiz generation and feedback errors
    #[error("Quiz error: {0}")]
    Quiz(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Collapse a model or index failure into the single retrieval failure
    /// seen by callers of the query pipeline.
    pub fn into_retrieval(self) -> Self {
        match self {
            AppError::Retrieval(_) => self,
            other => AppError::Retrieval(other.to_string()),
        }
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
    fn test_into_retrieval_wraps_index_failure() {
        let err = AppError::IndexUnavailable("table missing".to_string()).into_retrieval();
        match err {
            AppError::Retrieval(msg) => assert!(msg.contains("table missing")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_into_retrieval_is_idempotent() {
        let err = AppError::Retrieval("boom".to_string()).into_retrieval();
        assert_eq!(err.to_string(), "Retrieval failed: boom");
    }
}
