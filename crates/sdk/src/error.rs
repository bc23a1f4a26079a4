//! SDK Error Types

use thiserror::Error;

/// SDK Result type
pub type Result<T> = std::result::Result<T, SdkError>;

/// Error codes the server returns
pub mod code {
    pub const VALIDATION: i32 = 4000;
    pub const NOT_FOUND: i32 = 4001;
    pub const CONFLICT: i32 = 4002;
    pub const THROTTLED: i32 = 4003;
    pub const INTERNAL: i32 = 5000;
    pub const DATABASE: i32 = 5001;
    pub const UPSTREAM: i32 = 5002;
}

/// SDK Error
#[derive(Debug, Error)]
pub enum SdkError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("RPC error ({code}): {message}")]
    Rpc { code: i32, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl SdkError {
    /// Server-side error code, if the server answered with an error object
    pub fn code(&self) -> Option<i32> {
        match self {
            SdkError::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.code() == Some(code::NOT_FOUND)
    }

    /// Throttled by the server; retrying later may succeed
    pub fn is_throttled(&self) -> bool {
        self.code() == Some(code::THROTTLED)
    }
}

impl From<jsonrpsee::core::ClientError> for SdkError {
    fn from(e: jsonrpsee::core::ClientError) -> Self {
        match e {
            jsonrpsee::core::ClientError::Call(call_err) => SdkError::Rpc {
                code: call_err.code(),
                message: call_err.message().to_string(),
            },
            jsonrpsee::core::ClientError::Transport(e) => SdkError::Transport(e.to_string()),
            jsonrpsee::core::ClientError::RestartNeeded(_) => {
                SdkError::Connection("Connection restart needed".to_string())
            }
            jsonrpsee::core::ClientError::ParseError(e) => SdkError::Serialization(e),
            _ => SdkError::Other(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let err = SdkError::Rpc {
            code: code::THROTTLED,
            message: "slow down".to_string(),
        };
        assert!(err.is_throttled());
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "RPC error (4003): slow down");

        assert_eq!(SdkError::Connection("refused".to_string()).code(), None);
    }
}
