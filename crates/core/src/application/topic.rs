// Topic Service - extraction and per-user topic tracking
//
// The user's current topic lives in two places: a short-lived cache entry
// that the chat path reads, and the `user_topics` table it is rebuilt from.

use crate::application::{cache_keys, prompts};
use crate::domain::topic::normalize_topic;
use crate::domain::{ChatMode, Language};
use crate::error::Result;
use crate::port::{Cache, LlmClient, TopicRepository};
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of recording a freshly extracted topic
#[derive(Debug, Clone, PartialEq)]
pub struct TopicUpdate {
    pub topic: String,
    pub previous: Option<String>,
    pub changed: bool,
}

pub struct TopicService {
    llm: Arc<dyn LlmClient>,
    topics: Arc<dyn TopicRepository>,
    cache: Arc<dyn Cache>,
}

impl TopicService {
    pub fn new(llm: Arc<dyn LlmClient>, topics: Arc<dyn TopicRepository>, cache: Arc<dyn Cache>) -> Self {
        Self { llm, topics, cache }
    }

    /// Ask the model for a one or two word topic.
    ///
    /// An answer naming no usable topic maps to the generic topic for the
    /// language. A failed model call is returned as an error and the stored
    /// topic is left alone.
    pub async fn extract(&self, message: &str, language: Language) -> Result<String> {
        let raw = self
            .llm
            .complete(prompts::topic_request(message, language))
            .await?;
        let topic = normalize_topic(&raw, language);
        debug!(raw = %raw.trim(), topic = %topic, "Topic extracted");
        Ok(topic)
    }

    /// Store the topic for the user and report whether it differs from the last one
    pub async fn remember(&self, user_id: &str, topic: &str, mode: ChatMode) -> Result<TopicUpdate> {
        let previous = self.topics.user_topic(user_id).await?;

        self.cache
            .set(&cache_keys::user_topic(user_id), topic, cache_keys::USER_TOPIC_TTL_SECS)
            .await?;
        self.topics.record_mentions(&[topic.to_string()], mode).await?;
        self.topics.set_user_topic(user_id, Some(topic)).await?;

        let changed = previous.as_deref() != Some(topic);
        if changed {
            info!(
                user_id = %user_id,
                previous = ?previous,
                topic = %topic,
                "User topic changed"
            );
        }
        Ok(TopicUpdate {
            topic: topic.to_string(),
            previous,
            changed,
        })
    }

    /// Topic from the cache only
    pub async fn cached_topic(&self, user_id: &str) -> Result<Option<String>> {
        self.cache.get(&cache_keys::user_topic(user_id)).await
    }

    /// Cached topic, else the stored one (which is cached again)
    pub async fn current_topic(&self, user_id: &str) -> Result<Option<String>> {
        if let Some(topic) = self.cached_topic(user_id).await? {
            return Ok(Some(topic));
        }
        let stored = self.topics.user_topic(user_id).await?;
        if let Some(topic) = &stored {
            self.cache
                .set(&cache_keys::user_topic(user_id), topic, cache_keys::USER_TOPIC_TTL_SECS)
                .await?;
        }
        Ok(stored)
    }

    /// Forget the user's topic so the next message extracts a new one
    pub async fn refresh(&self, user_id: &str) -> Result<Option<String>> {
        let previous = self.current_topic(user_id).await?;
        self.cache.delete(&cache_keys::user_topic(user_id)).await?;
        self.topics.set_user_topic(user_id, None).await?;
        info!(user_id = %user_id, previous = ?previous, "User topic cleared");
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::llm::mocks::ScriptedLlm;
    use crate::port::time_provider::FixedTimeProvider;
    use crate::port::topic_repository::mocks::InMemoryTopics;
    use crate::port::InMemoryCache;

    fn service(llm: ScriptedLlm) -> (TopicService, Arc<InMemoryTopics>, Arc<InMemoryCache>) {
        let topics = Arc::new(InMemoryTopics::default());
        let cache = Arc::new(InMemoryCache::new(Arc::new(FixedTimeProvider::new(1_000))));
        let service = TopicService::new(Arc::new(llm), topics.clone(), cache.clone());
        (service, topics, cache)
    }

    #[tokio::test]
    async fn test_extract_parses_marker() {
        let (service, _, _) = service(ScriptedLlm::new("TOPIC: \"sleep\""));
        assert_eq!(service.extract("I can't sleep", Language::En).await.unwrap(), "sleep");
    }

    #[tokio::test]
    async fn test_extract_blank_answer_uses_generic_topic() {
        let (service, _, _) = service(ScriptedLlm::new(""));
        assert_eq!(service.extract("привет", Language::Ru).await.unwrap(), "общение");
    }

    #[tokio::test]
    async fn test_extract_model_failure_is_an_error() {
        let (service, _, _) = service(ScriptedLlm::failing());
        let err = service.extract("I can't sleep", Language::En).await.unwrap_err();
        assert!(matches!(err, crate::error::AppError::Llm(_)));
    }

    #[tokio::test]
    async fn test_remember_reports_change() {
        let (service, topics, cache) = service(ScriptedLlm::failing());

        let first = service.remember("u1", "stress", ChatMode::Support).await.unwrap();
        assert!(first.changed);
        assert_eq!(first.previous, None);

        let same = service.remember("u1", "stress", ChatMode::Support).await.unwrap();
        assert!(!same.changed);

        let next = service.remember("u1", "sleep", ChatMode::Support).await.unwrap();
        assert!(next.changed);
        assert_eq!(next.previous.as_deref(), Some("stress"));

        assert_eq!(topics.user_topic("u1").await.unwrap().as_deref(), Some("sleep"));
        assert_eq!(cache.get("user_topic:u1").await.unwrap().as_deref(), Some("sleep"));
        assert_eq!(topics.popular(None, 1).await.unwrap()[0].frequency, 2);
    }

    #[tokio::test]
    async fn test_current_topic_recaches_stored_topic() {
        let (service, topics, cache) = service(ScriptedLlm::failing());
        topics.set_user_topic("u1", Some("work")).await.unwrap();

        assert_eq!(service.cached_topic("u1").await.unwrap(), None);
        assert_eq!(service.current_topic("u1").await.unwrap().as_deref(), Some("work"));
        assert_eq!(cache.get("user_topic:u1").await.unwrap().as_deref(), Some("work"));
    }

    #[tokio::test]
    async fn test_refresh_clears_both_copies() {
        let (service, topics, _) = service(ScriptedLlm::failing());
        service.remember("u1", "anger", ChatMode::Analysis).await.unwrap();

        let previous = service.refresh("u1").await.unwrap();

        assert_eq!(previous.as_deref(), Some("anger"));
        assert_eq!(service.current_topic("u1").await.unwrap(), None);
        assert_eq!(topics.user_topic("u1").await.unwrap(), None);
    }
}
