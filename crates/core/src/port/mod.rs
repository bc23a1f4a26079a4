// Port Layer - Interfaces for external dependencies

pub mod cache;
pub mod content_repository;
pub mod conversation_repository;
pub mod id_provider; // For deterministic testing
pub mod job_repository;
pub mod llm;
pub mod maintenance;
pub mod task_executor;
pub mod time_provider;
pub mod topic_repository;
pub mod transaction;
pub mod video_search;

// Re-exports
pub use cache::{get_json, set_json, Cache, InMemoryCache};
pub use content_repository::ContentRepository;
pub use conversation_repository::{ConversationRepository, UserStats};
pub use id_provider::IdProvider;
pub use job_repository::JobRepository;
pub use llm::{CompletionRequest, LlmClient, LlmError};
pub use maintenance::{Maintenance, MaintenanceConfig, MaintenanceReport, MaintenanceStats};
pub use task_executor::{ExecutionError, ExecutionResult, ExecutionStatus, TaskExecutor};
pub use time_provider::TimeProvider;
pub use topic_repository::TopicRepository;
pub use transaction::{JobRepositoryTransaction, Transaction, TransactionalJobRepository};
pub use video_search::{VideoSearch, VideoSearchError};
