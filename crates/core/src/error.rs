// Error type shared by every service and adapter

use thiserror::Error;

/// Adapters map their own failures onto these; the RPC layer maps these
/// onto error codes.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Execution error: {0}")]
    Execution(#[from] crate::port::ExecutionError),

    #[error("LLM error: {0}")]
    Llm(#[from] crate::port::LlmError),

    #[error("Video search error: {0}")]
    VideoSearch(#[from] crate::port::VideoSearchError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Failures of a remote service rather than of the request or the store
    pub fn is_upstream(&self) -> bool {
        matches!(self, AppError::Llm(_) | AppError::VideoSearch(_))
    }
}
