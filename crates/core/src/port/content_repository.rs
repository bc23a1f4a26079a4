// Content Repository Port (articles and quotes)

use crate::domain::{Article, Language, Quote};
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Persist an article, returns its row id
    async fn save_article(&self, article: &Article) -> Result<i64>;

    /// Active articles in a language, optionally for one topic, newest first
    async fn articles(&self, topic: Option<&str>, language: Language) -> Result<Vec<Article>>;

    /// Newest active articles in any language
    async fn recent_articles(&self, limit: u32) -> Result<Vec<Article>>;

    /// Hide articles whose content is blank, returns how many changed
    async fn deactivate_empty_articles(&self) -> Result<u64>;

    /// Persist a quote, returns its row id
    async fn save_quote(&self, quote: &Quote) -> Result<i64>;

    /// Active quotes, optionally for one topic, newest first
    async fn quotes(&self, topic: Option<&str>, language: Language, limit: u32) -> Result<Vec<Quote>>;

    /// Number of active quotes, optionally in one language
    async fn quote_count(&self, language: Option<Language>) -> Result<i64>;

    /// The quote at `offset` when ordered by id
    async fn quote_at(&self, language: Language, offset: i64) -> Result<Option<Quote>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// In-memory article and quote store; ids are insertion order
    #[derive(Default)]
    pub struct InMemoryContent {
        articles: Mutex<Vec<(Article, bool)>>,
        quotes: Mutex<Vec<Quote>>,
    }

    impl InMemoryContent {
        pub fn article_count(&self) -> usize {
            self.articles.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ContentRepository for InMemoryContent {
        async fn save_article(&self, article: &Article) -> Result<i64> {
            let mut articles = self.articles.lock().unwrap();
            let id = articles.len() as i64 + 1;
            let mut stored = article.clone();
            stored.id = Some(id);
            articles.push((stored, true));
            Ok(id)
        }

        async fn articles(&self, topic: Option<&str>, language: Language) -> Result<Vec<Article>> {
            let topic = topic.map(str::to_lowercase);
            Ok(self
                .articles
                .lock()
                .unwrap()
                .iter()
                .rev()
                .filter(|(a, active)| *active && a.language == language)
                .filter(|(a, _)| {
                    topic.as_deref().map_or(true, |t| {
                        a.source_topics.iter().any(|s| s.to_lowercase() == t)
                    })
                })
                .map(|(a, _)| a.clone())
                .collect())
        }

        async fn recent_articles(&self, limit: u32) -> Result<Vec<Article>> {
            Ok(self
                .articles
                .lock()
                .unwrap()
                .iter()
                .rev()
                .filter(|(_, active)| *active)
                .take(limit as usize)
                .map(|(a, _)| a.clone())
                .collect())
        }

        async fn deactivate_empty_articles(&self) -> Result<u64> {
            let mut changed = 0;
            for (article, active) in self.articles.lock().unwrap().iter_mut() {
                if *active && article.content.trim().is_empty() {
                    *active = false;
                    changed += 1;
                }
            }
            Ok(changed)
        }

        async fn save_quote(&self, quote: &Quote) -> Result<i64> {
            let mut quotes = self.quotes.lock().unwrap();
            let id = quotes.len() as i64 + 1;
            let mut stored = quote.clone();
            stored.id = Some(id);
            quotes.push(stored);
            Ok(id)
        }

        async fn quotes(&self, topic: Option<&str>, language: Language, limit: u32) -> Result<Vec<Quote>> {
            Ok(self
                .quotes
                .lock()
                .unwrap()
                .iter()
                .rev()
                .filter(|q| q.language == language)
                .filter(|q| topic.map_or(true, |t| q.topic == t))
                .take(limit as usize)
                .cloned()
                .collect())
        }

        async fn quote_count(&self, language: Option<Language>) -> Result<i64> {
            Ok(self
                .quotes
                .lock()
                .unwrap()
                .iter()
                .filter(|q| language.map_or(true, |l| q.language == l))
                .count() as i64)
        }

        async fn quote_at(&self, language: Language, offset: i64) -> Result<Option<Quote>> {
            Ok(self
                .quotes
                .lock()
                .unwrap()
                .iter()
                .filter(|q| q.language == language)
                .nth(offset.max(0) as usize)
                .cloned())
        }
    }
}
