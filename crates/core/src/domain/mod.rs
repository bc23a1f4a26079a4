// Domain Layer - Pure business logic and entities

pub mod chat;
pub mod content;
pub mod error;
pub mod job;
pub mod task;
pub mod topic;
pub mod video;

// Re-exports
pub use chat::{ChatMessage, ChatMode, Language, Role};
pub use content::{Approach, Article, ContentType, Quote};
pub use error::DomainError;
pub use job::{Generation, Job, JobId, JobPayload, JobState, JobType, Priority, QueueId, SubjectKey};
pub use task::{
    ExtractTopicPayload, GenerateContentPayload, LanguagePayload, TaskKind,
    UpdateRecommendationsPayload,
};
pub use topic::TopicStat;
pub use video::Video;
