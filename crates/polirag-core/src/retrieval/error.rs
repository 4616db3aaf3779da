use thiserror::Error;

/// Errors that can occur while retrieving documents.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Failed to read document file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse document file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown party '{0}' in document file")]
    UnknownParty(String),

    #[error("Retrieval backend error: {0}")]
    Backend(String),
}

impl RetrievalError {
    /// Wraps an error from an external retrieval backend.
    pub fn backend(err: impl std::fmt::Display) -> Self {
        RetrievalError::Backend(err.to_string())
    }
}
