// Content Task Executor - runs every background task kind
//
// Each handler returns a JSON summary that the worker stores as the job's
// result. Handler errors are retryable; malformed payloads are not.

use crate::application::cache_keys;
use crate::application::content::fallback::fallback_article;
use crate::application::content::{ContentService, InitialSnapshot};
use crate::application::recommendations::RecommendationService;
use crate::application::services::Ports;
use crate::application::tasks::{TaskService, INTERACTIVE_PRIORITY};
use crate::application::topic::TopicService;
use crate::domain::topic::common_topics;
use crate::domain::{
    Approach, Article, ContentType, ExtractTopicPayload, GenerateContentPayload, Job, Language,
    LanguagePayload, Quote, TaskKind, UpdateRecommendationsPayload,
};
use crate::error::Result;
use crate::port::{set_json, ExecutionError, ExecutionResult, MaintenanceConfig, TaskExecutor};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

/// Topics covered by one daily content run
const DAILY_TOPICS: u32 = 5;
/// Topics covered by one all-topics run
const ALL_TOPICS_LIMIT: u32 = 50;
/// Topics kept in the popular-topics cache entry
const POPULAR_TOPICS_LIMIT: u32 = 10;

/// Content generated for one topic in a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicContent {
    pub topic: String,
    pub articles: Vec<Article>,
    pub quote: Quote,
}

/// Summary cached under `daily_content:{date}` / `all_topics_content:{date}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchContent {
    pub date: String,
    pub topics: Vec<TopicContent>,
    pub generated_at: i64,
}

pub struct ContentTaskExecutor {
    topics: Arc<TopicService>,
    content: Arc<ContentService>,
    recommendations: Arc<RecommendationService>,
    tasks: Arc<TaskService>,
    ports: Ports,
    maintenance_config: MaintenanceConfig,
}

fn payload<T: DeserializeOwned>(job: &Job) -> std::result::Result<T, ExecutionError> {
    serde_json::from_value(job.payload.as_value().clone())
        .map_err(|e| ExecutionError::InvalidPayload(format!("{}: {}", job.job_type.as_str(), e)))
}

impl ContentTaskExecutor {
    pub fn new(
        topics: Arc<TopicService>,
        content: Arc<ContentService>,
        recommendations: Arc<RecommendationService>,
        tasks: Arc<TaskService>,
        ports: Ports,
        maintenance_config: MaintenanceConfig,
    ) -> Self {
        Self {
            topics,
            content,
            recommendations,
            tasks,
            ports,
            maintenance_config,
        }
    }

    fn now(&self) -> i64 {
        self.ports.time_provider.now_millis()
    }

    async fn extract_topic(&self, job: &Job, p: ExtractTopicPayload) -> Result<Value> {
        let topic = self.topics.extract(&p.message, p.language).await?;
        let update = self.topics.remember(&p.user_id, &topic, p.mode).await?;

        if !update.changed {
            return Ok(json!({
                "user_id": p.user_id,
                "topic": update.topic,
                "topic_changed": false,
                "auto_generation_started": false,
            }));
        }

        let mut content_task_ids = serde_json::Map::new();
        for content_type in [ContentType::Article, ContentType::Quote] {
            let task_id = self
                .tasks
                .submit(
                    TaskKind::GenerateContent,
                    format!("content:{}:{}:{}", update.topic, content_type.as_str(), p.language),
                    &GenerateContentPayload {
                        topic: update.topic.clone(),
                        content_type,
                        language: p.language,
                    },
                    INTERACTIVE_PRIORITY,
                    Some(&job.id),
                )
                .await?;
            content_task_ids.insert(content_type.as_str().to_string(), Value::String(task_id));
        }
        let recommendations_task_id = self
            .recommendations
            .request_update(&p.user_id, p.language, Some(&job.id))
            .await?;

        info!(
            job_id = %job.id,
            user_id = %p.user_id,
            topic = %update.topic,
            "Topic changed, content generation started"
        );
        Ok(json!({
            "user_id": p.user_id,
            "topic": update.topic,
            "previous_topic": update.previous,
            "topic_changed": true,
            "content_task_ids": content_task_ids,
            "recommendations_task_id": recommendations_task_id,
            "auto_generation_started": true,
        }))
    }

    async fn generate_content(&self, p: GenerateContentPayload) -> Result<Value> {
        match p.content_type {
            ContentType::Article => {
                let article = self.content.topic_article(&p.topic, p.language).await?;
                Ok(json!({
                    "topic": p.topic,
                    "content_type": p.content_type,
                    "article": article,
                }))
            }
            ContentType::Quote => {
                let quote = self.content.topic_quote(&p.topic, p.language).await?;
                Ok(json!({
                    "topic": p.topic,
                    "content_type": p.content_type,
                    "quote": quote,
                }))
            }
        }
    }

    async fn update_recommendations(&self, p: UpdateRecommendationsPayload) -> Result<Value> {
        match self.recommendations.build(&p.user_id, p.language).await? {
            None => Ok(json!({
                "user_id": p.user_id,
                "message": "No topic found for user",
            })),
            Some(bundle) => Ok(json!({
                "user_id": p.user_id,
                "topic": bundle.topic,
                "videos": bundle.videos.len(),
                "articles": bundle.articles.len(),
                "has_quote": bundle.quote.is_some(),
            })),
        }
    }

    /// Article set and quote for one popular topic, with the day's cache entries
    async fn daily_topic_content(&self, topic: &str, frequency: i64, language: Language, date: &str) -> Result<TopicContent> {
        let generator = self.content.generator();
        let set = generator.generate_article_set(topic, frequency, language).await;
        let articles = generator.save_articles(set).await?;
        // Templates are stored but never become the day's article
        if let Some(practical) = articles
            .iter()
            .find(|a| a.approach == Approach::Practical && !a.is_fallback)
        {
            set_json(
                self.ports.cache.as_ref(),
                &cache_keys::article(topic, language, date),
                practical,
                cache_keys::DAY_TTL_SECS,
            )
            .await?;
        }
        let quote = self.content.topic_quote(topic, language).await?;
        Ok(TopicContent {
            topic: topic.to_string(),
            articles,
            quote,
        })
    }

    async fn generate_daily_content(&self, p: LanguagePayload) -> Result<Value> {
        let now = self.now();
        let date = cache_keys::date_key(now);
        let mut topics = Vec::new();

        for stat in self.ports.topics.popular(None, DAILY_TOPICS).await? {
            match self
                .daily_topic_content(&stat.topic, stat.frequency, p.language, &date)
                .await
            {
                Ok(content) => topics.push(content),
                Err(e) => warn!(topic = %stat.topic, error = %e, "Daily content failed for topic"),
            }
        }

        let batch = BatchContent {
            date: date.clone(),
            topics,
            generated_at: now,
        };
        set_json(
            self.ports.cache.as_ref(),
            &cache_keys::daily_content(&date),
            &batch,
            cache_keys::DAY_TTL_SECS,
        )
        .await?;

        let articles: usize = batch.topics.iter().map(|t| t.articles.len()).sum();
        info!(date = %date, topics = batch.topics.len(), articles = articles, "Daily content generated");
        Ok(json!({
            "date": date,
            "topics": batch.topics.len(),
            "articles": articles,
        }))
    }

    async fn generate_all_topics_content(&self, p: LanguagePayload) -> Result<Value> {
        let now = self.now();
        let date = cache_keys::date_key(now);
        let mut topics = Vec::new();

        for topic in self.ports.topics.all(ALL_TOPICS_LIMIT).await? {
            let article = match self.content.topic_article(&topic, p.language).await {
                Ok(article) => article,
                Err(e) => {
                    warn!(topic = %topic, error = %e, "Article generation failed for topic");
                    continue;
                }
            };
            match self.content.topic_quote(&topic, p.language).await {
                Ok(quote) => topics.push(TopicContent {
                    topic,
                    articles: vec![article],
                    quote,
                }),
                Err(e) => warn!(topic = %topic, error = %e, "Quote generation failed for topic"),
            }
        }

        let batch = BatchContent {
            date: date.clone(),
            topics,
            generated_at: now,
        };
        set_json(
            self.ports.cache.as_ref(),
            &cache_keys::all_topics_content(&date),
            &batch,
            cache_keys::DAY_TTL_SECS,
        )
        .await?;

        info!(date = %date, topics = batch.topics.len(), "Content generated for all topics");
        Ok(json!({
            "date": date,
            "topics": batch.topics.len(),
        }))
    }

    async fn initialize_startup_content(&self, p: LanguagePayload) -> Result<Value> {
        let generator = self.content.generator();
        let seeded_quotes = generator.seed_default_quotes().await?;

        let mut articles = Vec::new();
        for topic in common_topics(p.language) {
            let article = match generator
                .generate_article(topic, 1, Approach::Practical, p.language)
                .await
            {
                Some(article) => article,
                None => fallback_article(topic, Approach::Practical, p.language),
            };
            articles.push(article);
        }
        let articles = generator.save_articles(articles).await?;

        let snapshot = InitialSnapshot {
            articles,
            generated_at: self.now(),
        };
        set_json(
            self.ports.cache.as_ref(),
            &cache_keys::initial_content(p.language),
            &snapshot,
            cache_keys::DAY_TTL_SECS,
        )
        .await?;

        info!(
            language = %p.language,
            articles = snapshot.articles.len(),
            seeded_quotes = seeded_quotes,
            "Startup content initialized"
        );
        Ok(json!({
            "language": p.language,
            "articles": snapshot.articles.len(),
            "seeded_quotes": seeded_quotes,
        }))
    }

    async fn update_popular_topics(&self) -> Result<Value> {
        let popular = self.ports.topics.popular(None, POPULAR_TOPICS_LIMIT).await?;
        set_json(
            self.ports.cache.as_ref(),
            cache_keys::POPULAR_TOPICS,
            &popular,
            cache_keys::POPULAR_TOPICS_TTL_SECS,
        )
        .await?;
        Ok(json!({ "topics": popular.len() }))
    }

    async fn cleanup_old_content(&self) -> Result<Value> {
        let report = self
            .ports
            .maintenance
            .run_full_maintenance(&self.maintenance_config)
            .await?;
        let deactivated = self.ports.content.deactivate_empty_articles().await?;

        info!(
            deleted_jobs = report.deleted_jobs,
            purged_cache_entries = report.purged_cache_entries,
            deactivated_articles = deactivated,
            "Old content cleaned up"
        );
        Ok(json!({
            "deleted_jobs": report.deleted_jobs,
            "purged_cache_entries": report.purged_cache_entries,
            "deactivated_articles": deactivated,
            "vacuum_run": report.vacuum_run,
        }))
    }
}

#[async_trait]
impl TaskExecutor for ContentTaskExecutor {
    async fn execute(&self, job: &Job) -> std::result::Result<ExecutionResult, ExecutionError> {
        let started = self.now();
        let kind = TaskKind::parse(job.job_type.as_str())
            .map_err(|_| ExecutionError::UnknownTask(job.job_type.as_str().to_string()))?;

        let output = match kind {
            TaskKind::ExtractTopic => self.extract_topic(job, payload(job)?).await?,
            TaskKind::GenerateContent => self.generate_content(payload(job)?).await?,
            TaskKind::UpdateRecommendations => self.update_recommendations(payload(job)?).await?,
            TaskKind::GenerateDailyContent => self.generate_daily_content(payload(job)?).await?,
            TaskKind::GenerateAllTopicsContent => {
                self.generate_all_topics_content(payload(job)?).await?
            }
            TaskKind::InitializeStartupContent => {
                self.initialize_startup_content(payload(job)?).await?
            }
            TaskKind::UpdatePopularTopics => self.update_popular_topics().await?,
            TaskKind::CleanupOldContent => self.cleanup_old_content().await?,
        };

        Ok(ExecutionResult::success(self.now() - started, output))
    }
}

#[cfg(test)]
mod tests;
