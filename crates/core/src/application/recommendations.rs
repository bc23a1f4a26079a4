// Recommendation Service - per-user bundles built around the current topic

use crate::application::cache_keys;
use crate::application::tasks::{TaskService, INTERACTIVE_PRIORITY};
use crate::application::topic::TopicService;
use crate::application::videos::VideoService;
use crate::domain::{Article, Language, Quote, TaskKind, UpdateRecommendationsPayload, Video};
use crate::error::Result;
use crate::port::{get_json, set_json, Cache, ContentRepository, TimeProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

const VIDEOS_PER_BUNDLE: u32 = 5;
const ARTICLES_PER_BUNDLE: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub user_id: String,
    pub topic: String,
    pub language: Language,
    pub videos: Vec<Video>,
    pub articles: Vec<Article>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<Quote>,
    pub generated_at: i64,
}

/// Cached bundle, or the task building one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RecommendationsView {
    Ready(Recommendations),
    Processing { message: String, task_id: String },
}

pub struct RecommendationService {
    topics: Arc<TopicService>,
    videos: Arc<VideoService>,
    content: Arc<dyn ContentRepository>,
    cache: Arc<dyn Cache>,
    tasks: Arc<TaskService>,
    time_provider: Arc<dyn TimeProvider>,
}

impl RecommendationService {
    pub fn new(
        topics: Arc<TopicService>,
        videos: Arc<VideoService>,
        content: Arc<dyn ContentRepository>,
        cache: Arc<dyn Cache>,
        tasks: Arc<TaskService>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            topics,
            videos,
            content,
            cache,
            tasks,
            time_provider,
        }
    }

    pub async fn cached(&self, user_id: &str, language: Language) -> Result<Option<Recommendations>> {
        get_json(self.cache.as_ref(), &cache_keys::recommendations(user_id, language)).await
    }

    /// Build and cache a bundle; None when the user has no topic yet
    pub async fn build(&self, user_id: &str, language: Language) -> Result<Option<Recommendations>> {
        let Some(topic) = self.topics.current_topic(user_id).await? else {
            info!(user_id = %user_id, "No topic yet, skipping recommendations");
            return Ok(None);
        };

        let now = self.time_provider.now_millis();
        let videos = self.videos.search(&topic, VIDEOS_PER_BUNDLE, language).await;
        let mut articles = self.content.articles(Some(&topic), language).await?;
        articles.truncate(ARTICLES_PER_BUNDLE);
        let quote_key = cache_keys::quote(&topic, language, &cache_keys::date_key(now));
        let quote = get_json::<Quote>(self.cache.as_ref(), &quote_key).await?;

        let bundle = Recommendations {
            user_id: user_id.to_string(),
            topic,
            language,
            videos,
            articles,
            quote,
            generated_at: now,
        };
        set_json(
            self.cache.as_ref(),
            &cache_keys::recommendations(user_id, language),
            &bundle,
            cache_keys::RECOMMENDATIONS_TTL_SECS,
        )
        .await?;

        info!(
            user_id = %user_id,
            topic = %bundle.topic,
            videos = bundle.videos.len(),
            articles = bundle.articles.len(),
            "Recommendations cached"
        );
        Ok(Some(bundle))
    }

    /// Enqueue a rebuild for the user
    pub async fn request_update(
        &self,
        user_id: &str,
        language: Language,
        parent_job_id: Option<&str>,
    ) -> Result<String> {
        self.tasks
            .submit(
                TaskKind::UpdateRecommendations,
                format!("recommendations:{}:{}", user_id, language),
                &UpdateRecommendationsPayload {
                    user_id: user_id.to_string(),
                    language,
                },
                INTERACTIVE_PRIORITY,
                parent_job_id,
            )
            .await
    }

    /// Cached bundle, otherwise start building one
    pub async fn get_or_request(&self, user_id: &str, language: Language) -> Result<RecommendationsView> {
        if let Some(bundle) = self.cached(user_id, language).await? {
            return Ok(RecommendationsView::Ready(bundle));
        }
        let task_id = self.request_update(user_id, language, None).await?;
        Ok(RecommendationsView::Processing {
            message: "Generating recommendations...".to_string(),
            task_id,
        })
    }
}
