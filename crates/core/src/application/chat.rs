// Chat Service - one conversational turn plus the background work it triggers

use crate::application::cache_keys;
use crate::application::prompts;
use crate::application::recommendations::RecommendationService;
use crate::application::tasks::{TaskService, INTERACTIVE_PRIORITY};
use crate::application::topic::TopicService;
use crate::domain::topic::keyword_topics;
use crate::domain::{ChatMessage, ChatMode, ExtractTopicPayload, Language, TaskKind};
use crate::error::{AppError, Result};
use crate::port::{Cache, CompletionRequest, ConversationRepository, LlmClient, TimeProvider, TopicRepository};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Messages of prior context sent with each turn
pub const HISTORY_LIMIT: u32 = 20;

fn default_user_id() -> String {
    "default".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub mode: ChatMode,
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default)]
    pub language: Language,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            mode: ChatMode::default(),
            user_id: default_user_id(),
            language: Language::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub mode: ChatMode,
    pub language: Language,
    pub topic: Option<String>,
    pub topic_task_id: Option<String>,
    pub recommendations_task_id: Option<String>,
    pub auto_generation_started: bool,
    pub is_first_message: bool,
}

pub struct ChatService {
    llm: Arc<dyn LlmClient>,
    conversations: Arc<dyn ConversationRepository>,
    topic_repo: Arc<dyn TopicRepository>,
    topics: Arc<TopicService>,
    recommendations: Arc<RecommendationService>,
    cache: Arc<dyn Cache>,
    tasks: Arc<TaskService>,
    time_provider: Arc<dyn TimeProvider>,
}

impl ChatService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        llm: Arc<dyn LlmClient>,
        conversations: Arc<dyn ConversationRepository>,
        topic_repo: Arc<dyn TopicRepository>,
        topics: Arc<TopicService>,
        recommendations: Arc<RecommendationService>,
        cache: Arc<dyn Cache>,
        tasks: Arc<TaskService>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            llm,
            conversations,
            topic_repo,
            topics,
            recommendations,
            cache,
            tasks,
            time_provider,
        }
    }

    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(AppError::Validation("Message cannot be empty".to_string()));
        }
        let user_id = request.user_id.as_str();
        let mode = request.mode;
        let language = Language::resolve(request.language, message);

        info!(
            user_id = %user_id,
            mode = %mode,
            language = %language,
            chars = message.chars().count(),
            "Processing chat message"
        );

        let history = self.conversations.history(user_id, mode, HISTORY_LIMIT).await?;
        let is_first_message = history.is_empty();

        let now = self.time_provider.now_millis();
        self.conversations
            .save_message(user_id, mode, &ChatMessage::user(message).at(now))
            .await?;

        let mentioned = keyword_topics(message);
        if !mentioned.is_empty() {
            self.topic_repo.record_mentions(&mentioned, mode).await?;
        }

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(prompts::system_prompt(mode, language)));
        messages.extend(history.into_iter().map(|m| ChatMessage::new(m.role, m.content)));
        messages.push(ChatMessage::user(message));

        let completion = self
            .llm
            .complete(CompletionRequest {
                messages,
                max_tokens: prompts::CHAT_MAX_TOKENS,
                temperature: prompts::CHAT_TEMPERATURE,
            })
            .await;

        let reply = match completion {
            Ok(reply) => reply.trim().to_string(),
            Err(e) => {
                error!(user_id = %user_id, error = %e, "Chat completion failed");
                return Ok(ChatResponse {
                    response: prompts::apology(language).to_string(),
                    mode,
                    language,
                    topic: self.topics.cached_topic(user_id).await?,
                    topic_task_id: None,
                    recommendations_task_id: None,
                    auto_generation_started: false,
                    is_first_message,
                });
            }
        };

        self.conversations
            .save_message(
                user_id,
                mode,
                &ChatMessage::assistant(reply.clone()).at(self.time_provider.now_millis()),
            )
            .await?;

        let topic_task_id = self
            .tasks
            .submit(
                TaskKind::ExtractTopic,
                format!("topic:{}", user_id),
                &ExtractTopicPayload {
                    message: message.to_string(),
                    user_id: user_id.to_string(),
                    language,
                    mode,
                },
                INTERACTIVE_PRIORITY,
                None,
            )
            .await?;

        let recommendations_task_id = if self.recommendations.cached(user_id, language).await?.is_some() {
            None
        } else {
            Some(self.recommendations.request_update(user_id, language, None).await?)
        };

        Ok(ChatResponse {
            response: reply,
            mode,
            language,
            topic: self.topics.cached_topic(user_id).await?,
            topic_task_id: Some(topic_task_id),
            recommendations_task_id,
            auto_generation_started: false,
            is_first_message,
        })
    }

    /// Delete stored messages for one mode, or every mode
    pub async fn clear_history(&self, user_id: &str, mode: Option<ChatMode>) -> Result<u64> {
        let deleted = self.conversations.clear_history(user_id, mode).await?;
        info!(
            user_id = %user_id,
            mode = mode.map(|m| m.as_str()).unwrap_or("all"),
            deleted = deleted,
            "Conversation history cleared"
        );
        Ok(deleted)
    }

    /// Remove everything stored about a user
    pub async fn delete_user(&self, user_id: &str) -> Result<()> {
        if !self.conversations.delete_user(user_id).await? {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }
        self.topic_repo.set_user_topic(user_id, None).await?;

        let keys = [
            cache_keys::user_topic(user_id),
            cache_keys::recommendations(user_id, Language::Ru),
            cache_keys::recommendations(user_id, Language::En),
        ];
        for key in &keys {
            if let Err(e) = self.cache.delete(key).await {
                warn!(key = %key, error = %e, "Failed to drop cache entry");
            }
        }
        info!(user_id = %user_id, "User deleted");
        Ok(())
    }
}
