//! SDK Types
//!
//! Results of the methods whose shape is specific to the RPC layer. Domain
//! results (quotes, articles, task status, ...) come from `solace_core`.

use serde::{Deserialize, Serialize};
use solace_core::application::QueueCounts;
use solace_core::domain::{Article, Video};

/// system.health.v1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub cache_ok: bool,
    pub llm_configured: bool,
    pub video_api_configured: bool,
    pub queue: QueueCounts,
}

impl Health {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// chat.clear_history.v1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearHistoryResult {
    pub message: String,
    pub deleted: u64,
}

/// user.topic.v1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserTopic {
    pub user_id: String,
    pub topic: Option<String>,
}

/// user.topic.refresh.v1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicRefresh {
    pub user_id: String,
    pub previous_topic: Option<String>,
    pub message: String,
}

/// user.delete.v1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteUserResult {
    pub user_id: String,
    pub deleted: bool,
    pub message: String,
}

/// content.articles.v1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleList {
    pub articles: Vec<Article>,
    pub count: usize,
}

/// content.videos.v1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoList {
    pub videos: Vec<Video>,
    pub count: usize,
}

/// video.cache_clear.v1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheClearResult {
    pub cleared: usize,
}

/// video.force_retry.v1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResult {
    pub message: String,
}

/// admin.stats.v1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stats {
    pub queue: QueueCounts,
    pub db_size_mb: f64,
    pub job_count: i64,
    pub conversation_count: i64,
    pub article_count: i64,
    pub quote_count: i64,
    pub cache_entry_count: i64,
    pub fragmentation_percent: f64,
    pub uptime_secs: u64,
}

/// admin.maintenance.v1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceResult {
    pub vacuum_run: bool,
    pub deleted_jobs: i64,
    pub purged_cache_entries: u64,
    pub reclaimed_mb: f64,
    pub db_size_before_mb: f64,
    pub db_size_after_mb: f64,
}
