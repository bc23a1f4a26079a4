// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid job state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Unknown task type: {0}")]
    UnknownTaskType(String),

    #[error("Unsupported value: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
