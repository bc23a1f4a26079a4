//! RPC Request/Response Types
//!
//! Parameters and results of the versioned JSON-RPC methods. Requests whose
//! fields all have defaults may be called without params.

use serde::{Deserialize, Serialize};
use solace_core::application::QueueCounts;
use solace_core::domain::{Article, ChatMode, Language, Video};

fn default_user_id() -> String {
    "default".to_string()
}

fn default_article_limit() -> usize {
    10
}

fn default_video_limit() -> u32 {
    5
}

/// system.health.v1
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// healthy | degraded
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub cache_ok: bool,
    pub llm_configured: bool,
    pub video_api_configured: bool,
    pub queue: QueueCounts,
}

/// chat.clear_history.v1
#[derive(Debug, Deserialize)]
pub struct ClearHistoryRequest {
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default)]
    pub mode: Option<ChatMode>,
}

impl Default for ClearHistoryRequest {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            mode: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClearHistoryResponse {
    pub message: String,
    pub deleted: u64,
}

/// task.status.v1 / task.cancel.v1
#[derive(Debug, Deserialize)]
pub struct TaskRequest {
    pub task_id: String,
}

/// user.topic.v1 / user.topic.refresh.v1 / user.delete.v1
#[derive(Debug, Deserialize)]
pub struct UserRequest {
    pub user_id: String,
}

/// user.recommendations.v1 / content.personalized.v1
#[derive(Debug, Deserialize)]
pub struct UserLanguageRequest {
    pub user_id: String,
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserTopicResponse {
    pub user_id: String,
    pub topic: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicRefreshResponse {
    pub user_id: String,
    pub previous_topic: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteUserResponse {
    pub user_id: String,
    pub deleted: bool,
    pub message: String,
}

/// content.daily_quote.v1
#[derive(Debug, Default, Deserialize)]
pub struct DailyQuoteRequest {
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub topic: Option<String>,
}

/// content.articles.v1
#[derive(Debug, Deserialize)]
pub struct ArticlesRequest {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub language: Language,
    #[serde(default = "default_article_limit")]
    pub limit: usize,
}

impl Default for ArticlesRequest {
    fn default() -> Self {
        Self {
            topic: None,
            language: Language::default(),
            limit: default_article_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ArticlesResponse {
    pub articles: Vec<Article>,
    pub count: usize,
}

/// content.videos.v1
#[derive(Debug, Deserialize)]
pub struct VideosRequest {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default = "default_video_limit")]
    pub limit: u32,
    #[serde(default)]
    pub language: Language,
}

impl Default for VideosRequest {
    fn default() -> Self {
        Self {
            topic: None,
            limit: default_video_limit(),
            language: Language::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VideosResponse {
    pub videos: Vec<Video>,
    pub count: usize,
}

/// content.generate.v1
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    /// article | quote
    pub content_type: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub language: Language,
}

/// content.initial.v1
#[derive(Debug, Default, Deserialize)]
pub struct LanguageRequest {
    #[serde(default)]
    pub language: Language,
}

/// video.cache_clear.v1
#[derive(Debug, Clone, Serialize)]
pub struct CacheClearResponse {
    pub cleared: usize,
}

/// video.force_retry.v1
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// admin.stats.v1
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
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
#[derive(Debug, Default, Deserialize)]
pub struct MaintenanceRequest {
    #[serde(default)]
    pub force_vacuum: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceResponse {
    pub vacuum_run: bool,
    pub deleted_jobs: i64,
    pub purged_cache_entries: u64,
    pub reclaimed_mb: f64,
    pub db_size_before_mb: f64,
    pub db_size_after_mb: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let req: ArticlesRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.limit, 10);
        assert_eq!(req.language, Language::Ru);

        let req: VideosRequest = serde_json::from_str(r#"{"language":"en"}"#).unwrap();
        assert_eq!(req.limit, 5);
        assert_eq!(req.language, Language::En);

        let req: ClearHistoryRequest = serde_json::from_str(r#"{"mode":"practice"}"#).unwrap();
        assert_eq!(req.user_id, "default");
        assert_eq!(req.mode, Some(ChatMode::Practice));
    }

    #[test]
    fn test_unknown_language_is_rejected() {
        let result = serde_json::from_str::<LanguageRequest>(r#"{"language":"de"}"#);
        tokio_test::assert_err!(result);
    }
}
