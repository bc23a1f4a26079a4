// Task Executor Port
// Abstraction for running a queued job to completion

use crate::domain::Job;
use async_trait::async_trait;
use thiserror::Error;

/// Result of task execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub duration_ms: i64,
    /// Task output, stored as the job's result summary
    pub output: Option<serde_json::Value>,
}

impl ExecutionResult {
    pub fn success(duration_ms: i64, output: serde_json::Value) -> Self {
        Self {
            status: ExecutionStatus::Success,
            duration_ms,
            output: Some(output),
        }
    }
}

/// Execution status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    Success,
    Failed,
    Timeout,
}

/// Execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Unknown task type: {0}")]
    UnknownTask(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Task failed: {0}")]
    Failed(String),

    #[error("Task timeout after {0}ms")]
    Timeout(i64),
}

impl From<crate::error::AppError> for ExecutionError {
    fn from(err: crate::error::AppError) -> Self {
        ExecutionError::Failed(err.to_string())
    }
}

/// Task Executor trait
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Execute a job and return the result
    ///
    /// # Errors
    /// - ExecutionError::UnknownTask if the job type has no handler
    /// - ExecutionError::InvalidPayload if job payload is malformed
    /// - ExecutionError::Failed if the task itself failed (retryable)
    async fn execute(&self, job: &Job) -> Result<ExecutionResult, ExecutionError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock executor behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Always succeed
        Success,
        /// Always fail with message
        Fail(String),
        /// Panic with message (for panic isolation testing)
        Panic(String),
        /// Timeout after N ms
        Timeout(i64),
    }

    /// Mock Task Executor for testing
    pub struct MockTaskExecutor {
        behavior: Arc<Mutex<MockBehavior>>,
        call_count: Arc<Mutex<usize>>,
    }

    impl MockTaskExecutor {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior: Arc::new(Mutex::new(behavior)),
                call_count: Arc::new(Mutex::new(0)),
            }
        }
        pub fn new_panic_inducing(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Panic(message.into()))
        }
        pub fn new_success() -> Self {
            Self::new(MockBehavior::Success)
        }
        pub fn new_fail(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Fail(message.into()))
        }
        pub fn set_behavior(&self, behavior: MockBehavior) {
            *self.behavior.lock().unwrap() = behavior;
        }
        pub fn call_count(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl TaskExecutor for MockTaskExecutor {
        async fn execute(&self, _job: &Job) -> Result<ExecutionResult, ExecutionError> {
            *self.call_count.lock().unwrap() += 1;

            let behavior = self.behavior.lock().unwrap().clone();

            match behavior {
                MockBehavior::Success => Ok(ExecutionResult::success(
                    10,
                    serde_json::json!({"status": "mock"}),
                )),
                MockBehavior::Fail(msg) => Err(ExecutionError::Failed(msg)),
                MockBehavior::Panic(msg) => {
                    panic!("{}", msg);
                }
                MockBehavior::Timeout(ms) => Err(ExecutionError::Timeout(ms)),
            }
        }
    }
}
