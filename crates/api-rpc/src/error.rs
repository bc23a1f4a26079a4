//! RPC Error Types
//!
//! Maps application errors to JSON-RPC error codes.

use jsonrpsee::types::ErrorObjectOwned;
use solace_core::error::AppError;

/// RPC Error Codes
pub mod code {
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const NOT_FOUND: i32 = 4001;
    pub const CONFLICT: i32 = 4002;
    pub const THROTTLED: i32 = 4003;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const DB_ERROR: i32 = 5001;
    /// LLM or video provider failure
    pub const UPSTREAM_ERROR: i32 = 5002;
}

fn error(code: i32, message: impl Into<String>) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(code, message.into(), None::<()>)
}

/// Convert AppError to JSON-RPC ErrorObject
pub fn to_rpc_error(err: AppError) -> ErrorObjectOwned {
    if err.is_upstream() {
        return error(code::UPSTREAM_ERROR, err.to_string());
    }
    match err {
        AppError::Validation(msg) => error(code::VALIDATION_ERROR, msg),
        AppError::Domain(e) => error(code::VALIDATION_ERROR, e.to_string()),
        AppError::Serialization(e) => error(code::VALIDATION_ERROR, e.to_string()),
        AppError::NotFound(msg) => error(code::NOT_FOUND, msg),
        AppError::Conflict(msg) => error(code::CONFLICT, msg),
        AppError::InvalidState(msg) => error(code::CONFLICT, msg),
        AppError::Database(msg) => error(code::DB_ERROR, msg),
        AppError::Llm(_) | AppError::VideoSearch(_) => error(code::UPSTREAM_ERROR, err.to_string()),
        AppError::Execution(e) => error(code::INTERNAL_ERROR, e.to_string()),
        AppError::Io(e) => error(code::INTERNAL_ERROR, e.to_string()),
        AppError::Config(msg) => error(code::INTERNAL_ERROR, msg),
        AppError::Internal(msg) => error(code::INTERNAL_ERROR, msg),
    }
}

pub fn throttled() -> ErrorObjectOwned {
    error(code::THROTTLED, "Rate limit exceeded. Please slow down.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use solace_core::port::{LlmError, VideoSearchError};

    #[test]
    fn test_error_codes() {
        assert_eq!(to_rpc_error(AppError::Validation("x".into())).code(), 4000);
        assert_eq!(to_rpc_error(AppError::NotFound("x".into())).code(), 4001);
        assert_eq!(to_rpc_error(AppError::Conflict("x".into())).code(), 4002);
        assert_eq!(to_rpc_error(AppError::Database("x".into())).code(), 5001);
        assert_eq!(to_rpc_error(AppError::Llm(LlmError::EmptyResponse)).code(), 5002);
        assert_eq!(
            to_rpc_error(AppError::VideoSearch(VideoSearchError::QuotaExceeded)).code(),
            5002
        );
        assert_eq!(to_rpc_error(AppError::Internal("x".into())).code(), 5000);
        assert_eq!(throttled().code(), 4003);
    }

    #[test]
    fn test_message_is_kept() {
        let err = to_rpc_error(AppError::Validation("Message cannot be empty".into()));
        assert_eq!(err.message(), "Message cannot be empty");
    }
}
