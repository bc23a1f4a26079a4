// Solace Infrastructure - SQLite Adapter
// Implements: JobRepository, TransactionalJobRepository, ConversationRepository,
// TopicRepository, ContentRepository, Cache, Maintenance

mod cache_store;
mod connection;
mod content_store;
mod conversation_store;
mod error;
mod job_repository;
mod maintenance_impl;
mod migration;
mod topic_store;
mod transaction;

pub use cache_store::SqliteCache;
pub use connection::create_pool;
pub use content_store::SqliteContentStore;
pub use conversation_store::SqliteConversationStore;
pub use job_repository::SqliteJobRepository;
pub use maintenance_impl::SqliteMaintenance;
pub use migration::run_migrations;
pub use topic_store::SqliteTopicStore;
pub use transaction::SqliteJobTransaction;
