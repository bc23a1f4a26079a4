// Application Layer - Use Cases and Business Logic

pub mod beat;
pub mod cache_keys;
pub mod chat;
pub mod content;
pub mod executor;
pub mod prompts;
pub mod recommendations;
pub mod recovery;
pub mod retry;
pub mod services;
pub mod tasks;
pub mod topic;
pub mod videos;
pub mod worker;

// Re-exports
pub use beat::{Beat, BeatConfig, BeatEntry};
pub use chat::{ChatRequest, ChatResponse, ChatService};
pub use content::{ContentGenerator, ContentService, GeneratedContent, InitialContent, PersonalizedContent};
pub use executor::ContentTaskExecutor;
pub use recommendations::{RecommendationService, Recommendations, RecommendationsView};
pub use recovery::RecoveryService;
pub use retry::RetryPolicy;
pub use services::{Ports, ServiceSettings, Services};
pub use tasks::{EnqueueRequest, QueueCounts, TaskService, TaskStatus, DEFAULT_QUEUE};
pub use topic::TopicService;
pub use videos::{VideoCacheStatus, VideoService};
pub use worker::{shutdown_channel, ShutdownSender, ShutdownToken, Worker};
