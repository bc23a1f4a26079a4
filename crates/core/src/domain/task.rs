// Background task catalogue
//
// Every job in the queue carries one of these kinds as its `job_type`
// and the matching payload struct as its JSON payload.

use crate::domain::chat::{ChatMode, Language};
use crate::domain::content::ContentType;
use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskKind {
    ExtractTopic,
    GenerateContent,
    UpdateRecommendations,
    GenerateDailyContent,
    GenerateAllTopicsContent,
    InitializeStartupContent,
    UpdatePopularTopics,
    CleanupOldContent,
}

impl TaskKind {
    pub const ALL: [TaskKind; 8] = [
        TaskKind::ExtractTopic,
        TaskKind::GenerateContent,
        TaskKind::UpdateRecommendations,
        TaskKind::GenerateDailyContent,
        TaskKind::GenerateAllTopicsContent,
        TaskKind::InitializeStartupContent,
        TaskKind::UpdatePopularTopics,
        TaskKind::CleanupOldContent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::ExtractTopic => "EXTRACT_TOPIC",
            TaskKind::GenerateContent => "GENERATE_CONTENT",
            TaskKind::UpdateRecommendations => "UPDATE_RECOMMENDATIONS",
            TaskKind::GenerateDailyContent => "GENERATE_DAILY_CONTENT",
            TaskKind::GenerateAllTopicsContent => "GENERATE_ALL_TOPICS_CONTENT",
            TaskKind::InitializeStartupContent => "INITIALIZE_STARTUP_CONTENT",
            TaskKind::UpdatePopularTopics => "UPDATE_POPULAR_TOPICS",
            TaskKind::CleanupOldContent => "CLEANUP_OLD_CONTENT",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        TaskKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| DomainError::UnknownTaskType(s.to_string()))
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractTopicPayload {
    pub message: String,
    pub user_id: String,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub mode: ChatMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateContentPayload {
    pub topic: String,
    pub content_type: ContentType,
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRecommendationsPayload {
    pub user_id: String,
    #[serde(default)]
    pub language: Language,
}

/// Payload for tasks that only need a language
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguagePayload {
    #[serde(default)]
    pub language: Language,
}
