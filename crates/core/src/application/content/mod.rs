// Content Service - articles, quotes and bundles served to clients

pub mod fallback;
pub mod generator;
pub mod grouping;
pub mod parse;

pub use generator::{ContentGenerator, DEFAULT_QUOTE_GENERATION_CHANCE};
pub use grouping::group_articles;

use crate::application::cache_keys;
use crate::application::tasks::{TaskService, INTERACTIVE_PRIORITY};
use crate::application::videos::VideoService;
use crate::domain::{
    Approach, Article, ChatMode, ContentType, Language, LanguagePayload, Quote, TaskKind,
    TopicStat, Video,
};
use crate::error::{AppError, Result};
use crate::port::{
    get_json, set_json, Cache, ContentRepository, ConversationRepository, LlmError, TimeProvider,
    TopicRepository, UserStats,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Articles kept per topic in listings
pub const ARTICLES_PER_TOPIC: usize = 3;

/// Frequency recorded on articles generated on request
const ON_DEMAND_FREQUENCY: i64 = 3;

/// Result of an explicit generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub message: String,
    pub content_type: ContentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default)]
    pub articles: Vec<Article>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<Quote>,
}

/// Snapshot cached by the startup task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitialSnapshot {
    pub articles: Vec<Article>,
    pub generated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitialContent {
    pub daily_quote: Option<Quote>,
    pub random_articles: Vec<Article>,
    pub random_videos: Vec<Video>,
    pub language: Language,
    pub is_initial: bool,
    pub generation_triggered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalizedContent {
    pub user_stats: UserStats,
    pub most_used_mode: ChatMode,
    pub popular_topics: Vec<TopicStat>,
    pub recommended_articles: Vec<Article>,
    pub recommended_videos: Vec<Video>,
    pub daily_quote: Quote,
}

pub struct ContentService {
    generator: Arc<ContentGenerator>,
    content: Arc<dyn ContentRepository>,
    topics: Arc<dyn TopicRepository>,
    conversations: Arc<dyn ConversationRepository>,
    cache: Arc<dyn Cache>,
    videos: Arc<VideoService>,
    tasks: Arc<TaskService>,
    time_provider: Arc<dyn TimeProvider>,
}

impl ContentService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        generator: Arc<ContentGenerator>,
        content: Arc<dyn ContentRepository>,
        topics: Arc<dyn TopicRepository>,
        conversations: Arc<dyn ConversationRepository>,
        cache: Arc<dyn Cache>,
        videos: Arc<VideoService>,
        tasks: Arc<TaskService>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            generator,
            content,
            topics,
            conversations,
            cache,
            videos,
            tasks,
            time_provider,
        }
    }

    pub fn generator(&self) -> &ContentGenerator {
        &self.generator
    }

    fn today(&self) -> String {
        cache_keys::date_key(self.time_provider.now_millis())
    }

    /// Daily quote, or the quote of the day for a topic
    pub async fn daily_quote(&self, language: Language, topic: Option<&str>) -> Result<Quote> {
        match topic.map(str::trim).filter(|t| !t.is_empty()) {
            Some(topic) => self.topic_quote(topic, language).await,
            None => self.generator.daily_quote(language).await,
        }
    }

    /// Today's quote for a topic, generated and cached on first request
    pub async fn topic_quote(&self, topic: &str, language: Language) -> Result<Quote> {
        let key = cache_keys::quote(topic, language, &self.today());
        if let Some(quote) = get_json::<Quote>(self.cache.as_ref(), &key).await? {
            return Ok(quote);
        }
        let quote = self.generator.generate_quote(Some(topic), language).await?;
        set_json(self.cache.as_ref(), &key, &quote, cache_keys::DAY_TTL_SECS).await?;
        info!(topic = %topic, key = %key, "Cached topic quote");
        Ok(quote)
    }

    /// Today's practical article for a topic, generated, stored and cached on first request.
    ///
    /// Nothing is stored or cached when the model gives no usable article, so
    /// a later request tries again.
    pub async fn topic_article(&self, topic: &str, language: Language) -> Result<Article> {
        let key = cache_keys::article(topic, language, &self.today());
        if let Some(article) = get_json::<Article>(self.cache.as_ref(), &key).await? {
            return Ok(article);
        }
        let article = self
            .generator
            .generate_article(topic, 1, Approach::Practical, language)
            .await
            .ok_or_else(|| {
                AppError::Llm(LlmError::Request(format!("no usable article for topic '{}'", topic)))
            })?;
        let article = self
            .generator
            .save_articles(vec![article])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Internal("article was not saved".to_string()))?;
        set_json(self.cache.as_ref(), &key, &article, cache_keys::DAY_TTL_SECS).await?;
        info!(topic = %topic, key = %key, "Cached topic article");
        Ok(article)
    }

    /// Stored articles (grouped per topic); an unknown topic gets a fresh set
    pub async fn articles(&self, topic: Option<&str>, language: Language, limit: usize) -> Result<Vec<Article>> {
        let topic = topic.map(str::trim).filter(|t| !t.is_empty());
        let stored = self.content.articles(topic, language).await?;
        let mut articles = group_articles(stored, ARTICLES_PER_TOPIC);

        if let Some(topic) = topic {
            if articles.is_empty() {
                info!(topic = %topic, "No stored articles, generating a set");
                let set = self
                    .generator
                    .generate_article_set(&topic.to_lowercase(), ON_DEMAND_FREQUENCY, language)
                    .await;
                articles = self.generator.save_articles(set).await?;
            }
            articles.truncate(ARTICLES_PER_TOPIC);
        } else {
            articles.truncate(limit);
        }
        Ok(articles)
    }

    /// Generate content now, for one topic or for the most popular topics
    pub async fn generate_on_demand(
        &self,
        content_type: &str,
        topic: Option<&str>,
        language: Language,
    ) -> Result<GeneratedContent> {
        let content_type = ContentType::parse(content_type)
            .map_err(|_| AppError::Validation(format!("Invalid content type '{}'", content_type)))?;
        let topic = topic.map(str::trim).filter(|t| !t.is_empty());

        match (content_type, topic) {
            (ContentType::Article, Some(topic)) => {
                let set = self
                    .generator
                    .generate_article_set(&topic.to_lowercase(), ON_DEMAND_FREQUENCY, language)
                    .await;
                let articles = self.generator.save_articles(set).await?;
                Ok(GeneratedContent {
                    message: format!("Generated article for topic '{}'", topic),
                    content_type,
                    topic: Some(topic.to_string()),
                    articles,
                    quote: None,
                })
            }
            (ContentType::Article, None) => {
                let mut articles = Vec::new();
                for stat in self.topics.popular(None, 5).await? {
                    let set = self
                        .generator
                        .generate_article_set(&stat.topic, stat.frequency, language)
                        .await;
                    articles.extend(self.generator.save_articles(set).await?);
                }
                Ok(GeneratedContent {
                    message: format!("Generated {} articles", articles.len()),
                    content_type,
                    topic: None,
                    articles,
                    quote: None,
                })
            }
            (ContentType::Quote, topic) => {
                let quote = self.generator.generate_quote(topic, language).await?;
                Ok(GeneratedContent {
                    message: match topic {
                        Some(topic) => format!("Generated quote for topic '{}'", topic),
                        None => "Generated 1 quotes".to_string(),
                    },
                    content_type,
                    topic: topic.map(str::to_string),
                    articles: Vec::new(),
                    quote: Some(quote),
                })
            }
        }
    }

    /// Content for first-time users; a cache miss starts the startup task
    pub async fn initial_content(&self, language: Language) -> Result<InitialContent> {
        let key = cache_keys::initial_content(language);
        let Some(snapshot) = get_json::<InitialSnapshot>(self.cache.as_ref(), &key).await? else {
            let task_id = self
                .tasks
                .submit(
                    TaskKind::InitializeStartupContent,
                    format!("initial_content:{}", language),
                    &LanguagePayload { language },
                    INTERACTIVE_PRIORITY,
                    None,
                )
                .await?;
            info!(language = %language, task_id = %task_id, "No initial content, generation triggered");
            return Ok(InitialContent {
                daily_quote: None,
                random_articles: Vec::new(),
                random_videos: Vec::new(),
                language,
                is_initial: true,
                generation_triggered: true,
                task_id: Some(task_id),
            });
        };

        Ok(InitialContent {
            daily_quote: Some(self.generator.daily_quote(language).await?),
            random_articles: snapshot.articles,
            random_videos: Vec::new(),
            language,
            is_initial: true,
            generation_triggered: false,
            task_id: None,
        })
    }

    /// Content picked from the user's conversation history
    pub async fn personalized_content(&self, user_id: &str, language: Language) -> Result<PersonalizedContent> {
        let user_stats = self.conversations.user_stats(user_id).await?;
        let most_used_mode = user_stats.most_used_mode();
        let popular_topics = self.topics.popular(Some(most_used_mode), 3).await?;
        let recommended_articles = self.content.recent_articles(3).await?;

        let topic_names: Vec<String> = popular_topics.iter().map(|t| t.topic.clone()).collect();
        let recommended_videos = if topic_names.is_empty() {
            Vec::new()
        } else {
            self.videos.recommend(&topic_names, 3, language).await
        };

        let daily_quote = match self.generator.daily_quote(language).await {
            Ok(quote) => quote,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Daily quote unavailable");
                crate::domain::content::default_quote(language)
            }
        };

        Ok(PersonalizedContent {
            user_stats,
            most_used_mode,
            popular_topics,
            recommended_articles,
            recommended_videos,
            daily_quote,
        })
    }
}
