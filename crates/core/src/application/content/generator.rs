// Content Generator - articles and quotes from the LLM, with fallbacks

use super::fallback::{fallback_article, unknown_author, unparsed_quote_fallback};
use super::parse::{parse_article, parse_quote};
use crate::application::cache_keys::{day_of_year, iso_date};
use crate::application::prompts;
use crate::domain::content::{default_quote, seed_quotes};
use crate::domain::topic::default_topic;
use crate::domain::{Approach, Article, Language, Quote};
use crate::error::Result;
use crate::port::{ContentRepository, LlmClient, TimeProvider, TopicRepository};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Attempts per approach before the template article is used
pub const ARTICLE_ATTEMPTS: usize = 3;

/// Default probability that the daily quote is freshly generated
pub const DEFAULT_QUOTE_GENERATION_CHANCE: f64 = 0.3;

pub struct ContentGenerator {
    llm: Arc<dyn LlmClient>,
    content: Arc<dyn ContentRepository>,
    topics: Arc<dyn TopicRepository>,
    time_provider: Arc<dyn TimeProvider>,
    quote_generation_chance: f64,
}

impl ContentGenerator {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        content: Arc<dyn ContentRepository>,
        topics: Arc<dyn TopicRepository>,
        time_provider: Arc<dyn TimeProvider>,
        quote_generation_chance: f64,
    ) -> Self {
        Self {
            llm,
            content,
            topics,
            time_provider,
            quote_generation_chance: quote_generation_chance.clamp(0.0, 1.0),
        }
    }

    /// One LLM article, None when the call fails or the answer does not parse
    pub async fn generate_article(
        &self,
        topic: &str,
        frequency: i64,
        approach: Approach,
        language: Language,
    ) -> Option<Article> {
        let request = prompts::article_request(topic, approach, language);
        let raw = match self.llm.complete(request).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(topic = %topic, approach = %approach.as_str(), error = %e, "Article generation failed");
                return None;
            }
        };
        let Some((title, content)) = parse_article(&raw, language) else {
            debug!(topic = %topic, approach = %approach.as_str(), "Article answer did not parse");
            return None;
        };
        let mut article = Article::new(topic, approach, language, title, content);
        article.frequency = frequency;
        Some(article)
    }

    /// One article per approach; a template stands in after repeated failures
    pub async fn generate_article_set(&self, topic: &str, frequency: i64, language: Language) -> Vec<Article> {
        let mut articles = Vec::with_capacity(Approach::ALL.len());
        for approach in Approach::ALL {
            let mut generated = None;
            for attempt in 1..=ARTICLE_ATTEMPTS {
                generated = self.generate_article(topic, frequency, approach, language).await;
                if generated.is_some() {
                    break;
                }
                debug!(topic = %topic, approach = %approach.as_str(), attempt, "Retrying article");
            }
            let article = generated.unwrap_or_else(|| {
                warn!(topic = %topic, approach = %approach.as_str(), "Using template article");
                let mut article = fallback_article(topic, approach, language);
                article.frequency = frequency;
                article
            });
            articles.push(article);
        }
        info!(topic = %topic, language = %language, "Article set generated");
        articles
    }

    /// Persist articles and return them with ids and timestamps set
    pub async fn save_articles(&self, articles: Vec<Article>) -> Result<Vec<Article>> {
        let now = self.time_provider.now_millis();
        let mut saved = Vec::with_capacity(articles.len());
        for mut article in articles {
            article.created_at = Some(now);
            article.id = Some(self.content.save_article(&article).await?);
            saved.push(article);
        }
        Ok(saved)
    }

    /// Generated quote for a topic (the most popular topic when None)
    pub async fn generate_quote(&self, topic: Option<&str>, language: Language) -> Result<Quote> {
        let topic = match topic {
            Some(topic) => topic.to_string(),
            None => self
                .topics
                .popular(None, 5)
                .await?
                .into_iter()
                .next()
                .map(|t| t.topic)
                .unwrap_or_else(|| default_topic(language).to_string()),
        };
        let today = iso_date(self.time_provider.now_millis());

        let raw = match self.llm.complete(prompts::quote_request(&topic, language)).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(topic = %topic, error = %e, "Quote generation failed");
                return Ok(default_quote(language).on(today));
            }
        };

        let Some((text, author)) = parse_quote(&raw, language) else {
            debug!(topic = %topic, "Quote answer did not parse");
            return Ok(unparsed_quote_fallback(language).on(today));
        };

        let author = author.unwrap_or_else(|| unknown_author(language).to_string());
        let mut quote = Quote::new(text, author, topic, language).on(today);
        quote.is_generated = true;
        quote.id = Some(self.content.save_quote(&quote).await?);
        Ok(quote)
    }

    /// Insert the bundled quotes when the quote table is empty
    pub async fn seed_default_quotes(&self) -> Result<u64> {
        if self.content.quote_count(None).await? > 0 {
            return Ok(0);
        }
        let mut inserted = 0;
        for language in [Language::Ru, Language::En] {
            for (text, author, topic) in seed_quotes(language) {
                self.content
                    .save_quote(&Quote::new(*text, *author, *topic, language))
                    .await?;
                inserted += 1;
            }
        }
        info!(inserted, "Seeded default quotes");
        Ok(inserted)
    }

    /// Quote of the day: sometimes fresh, otherwise rotated through stored quotes
    pub async fn daily_quote(&self, language: Language) -> Result<Quote> {
        self.seed_default_quotes().await?;
        let now = self.time_provider.now_millis();

        if rand::random::<f64>() < self.quote_generation_chance {
            let quote = self.generate_quote(None, language).await?;
            if quote.is_generated {
                return Ok(quote);
            }
        }

        let count = self.content.quote_count(Some(language)).await?;
        if count > 0 {
            let offset = day_of_year(now) as i64 % count;
            if let Some(quote) = self.content.quote_at(language, offset).await? {
                return Ok(quote.on(iso_date(now)));
            }
        }
        warn!(language = %language, "No stored quote, using default");
        Ok(default_quote(language).on(iso_date(now)))
    }
}
