// SQLite ContentRepository Implementation (articles and quotes)

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use solace_core::domain::{Approach, Article, Language, Quote};
use solace_core::error::Result;
use solace_core::port::{ContentRepository, TimeProvider};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::warn;

pub struct SqliteContentStore {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteContentStore {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }
}

/// Lookup key for topic queries.
///
/// Lowercased here because SQLite's LOWER() only folds ASCII.
fn topic_key(topic: &str) -> String {
    topic.trim().to_lowercase()
}

fn parse_language(s: &str) -> Language {
    Language::parse(s).unwrap_or_else(|_| {
        warn!(language = %s, "Unknown content language in database");
        Language::default()
    })
}

#[derive(Debug, sqlx::FromRow)]
struct ArticleRow {
    id: i64,
    title: String,
    content: String,
    topic: String,
    approach: String,
    language: String,
    frequency: i64,
    source_topics: String,
    is_fallback: bool,
    created_at: i64,
}

impl ArticleRow {
    fn into_article(self) -> Article {
        let source_topics: Vec<String> =
            serde_json::from_str(&self.source_topics).unwrap_or_else(|_| vec![self.topic.clone()]);

        Article {
            id: Some(self.id),
            title: self.title,
            content: self.content,
            topic: self.topic,
            approach: Approach::parse_lenient(&self.approach),
            language: parse_language(&self.language),
            frequency: self.frequency,
            source_topics,
            created_at: Some(self.created_at),
            is_fallback: self.is_fallback,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct QuoteRow {
    id: i64,
    text: String,
    author: String,
    topic: String,
    language: String,
    date: Option<String>,
    is_generated: bool,
}

impl QuoteRow {
    fn into_quote(self) -> Quote {
        Quote {
            id: Some(self.id),
            text: self.text,
            author: self.author,
            topic: self.topic,
            language: parse_language(&self.language),
            date: self.date,
            is_generated: self.is_generated,
        }
    }
}

const ARTICLE_COLUMNS: &str =
    "id, title, content, topic, approach, language, frequency, source_topics, is_fallback, created_at";
const QUOTE_COLUMNS: &str = "id, text, author, topic, language, date, is_generated";

#[async_trait]
impl ContentRepository for SqliteContentStore {
    async fn save_article(&self, article: &Article) -> Result<i64> {
        let created_at = article
            .created_at
            .unwrap_or_else(|| self.time_provider.now_millis());
        let source_topics = serde_json::to_string(&article.source_topics)?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO generated_content (
                title, content, topic, topic_key, approach, language,
                frequency, source_topics, is_fallback, is_active, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?)
            RETURNING id
            "#,
        )
        .bind(&article.title)
        .bind(&article.content)
        .bind(&article.topic)
        .bind(topic_key(article.primary_topic()))
        .bind(article.approach.as_str())
        .bind(article.language.as_str())
        .bind(article.frequency)
        .bind(source_topics)
        .bind(article.is_fallback)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(id)
    }

    async fn articles(&self, topic: Option<&str>, language: Language) -> Result<Vec<Article>> {
        let rows: Vec<ArticleRow> = match topic {
            Some(topic) => {
                sqlx::query_as(&format!(
                    "SELECT {} FROM generated_content \
                     WHERE is_active = 1 AND language = ? AND topic_key = ? \
                     ORDER BY created_at DESC, id DESC",
                    ARTICLE_COLUMNS
                ))
                .bind(language.as_str())
                .bind(topic_key(topic))
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as(&format!(
                    "SELECT {} FROM generated_content \
                     WHERE is_active = 1 AND language = ? \
                     ORDER BY created_at DESC, id DESC",
                    ARTICLE_COLUMNS
                ))
                .bind(language.as_str())
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ArticleRow::into_article).collect())
    }

    async fn recent_articles(&self, limit: u32) -> Result<Vec<Article>> {
        let rows: Vec<ArticleRow> = sqlx::query_as(&format!(
            "SELECT {} FROM generated_content WHERE is_active = 1 \
             ORDER BY created_at DESC, id DESC LIMIT ?",
            ARTICLE_COLUMNS
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ArticleRow::into_article).collect())
    }

    async fn deactivate_empty_articles(&self) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE generated_content SET is_active = 0 WHERE is_active = 1 AND TRIM(content) = ''",
        )
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn save_quote(&self, quote: &Quote) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO quotes (text, author, topic, language, date, is_generated, is_active, created_at)
            VALUES (?, ?, ?, ?, ?, ?, 1, ?)
            RETURNING id
            "#,
        )
        .bind(&quote.text)
        .bind(&quote.author)
        .bind(&quote.topic)
        .bind(quote.language.as_str())
        .bind(&quote.date)
        .bind(quote.is_generated)
        .bind(self.time_provider.now_millis())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(id)
    }

    async fn quotes(&self, topic: Option<&str>, language: Language, limit: u32) -> Result<Vec<Quote>> {
        let rows: Vec<QuoteRow> = match topic {
            Some(topic) => {
                sqlx::query_as(&format!(
                    "SELECT {} FROM quotes \
                     WHERE is_active = 1 AND language = ? AND topic = ? \
                     ORDER BY id DESC LIMIT ?",
                    QUOTE_COLUMNS
                ))
                .bind(language.as_str())
                .bind(topic)
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as(&format!(
                    "SELECT {} FROM quotes WHERE is_active = 1 AND language = ? \
                     ORDER BY id DESC LIMIT ?",
                    QUOTE_COLUMNS
                ))
                .bind(language.as_str())
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(QuoteRow::into_quote).collect())
    }

    async fn quote_count(&self, language: Option<Language>) -> Result<i64> {
        match language {
            Some(language) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM quotes WHERE is_active = 1 AND language = ?")
                    .bind(language.as_str())
                    .fetch_one(&self.pool)
                    .await
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM quotes WHERE is_active = 1")
                    .fetch_one(&self.pool)
                    .await
            }
        }
        .map_err(map_sqlx_error)
    }

    async fn quote_at(&self, language: Language, offset: i64) -> Result<Option<Quote>> {
        let row: Option<QuoteRow> = sqlx::query_as(&format!(
            "SELECT {} FROM quotes WHERE is_active = 1 AND language = ? \
             ORDER BY id ASC LIMIT 1 OFFSET ?",
            QUOTE_COLUMNS
        ))
        .bind(language.as_str())
        .bind(offset.max(0))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(QuoteRow::into_quote))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};
    use solace_core::port::time_provider::FixedTimeProvider;

    async fn setup() -> (SqliteContentStore, Arc<FixedTimeProvider>) {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        let time = Arc::new(FixedTimeProvider::new(1_000));
        (SqliteContentStore::new(pool, time.clone()), time)
    }

    #[tokio::test]
    async fn test_article_round_trip() {
        let (store, _) = setup().await;
        let mut article = Article::new("Стресс", Approach::Theoretical, Language::Ru, "Заголовок", "Текст");
        article.source_topics = vec!["Стресс".into(), "сон".into()];
        article.frequency = 4;

        let id = store.save_article(&article).await.unwrap();

        let found = store.articles(Some("стресс"), Language::Ru).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, Some(id));
        assert_eq!(found[0].approach, Approach::Theoretical);
        assert_eq!(found[0].source_topics, vec!["Стресс", "сон"]);
        assert_eq!(found[0].frequency, 4);
        assert_eq!(found[0].created_at, Some(1_000));

        assert!(store.articles(Some("стресс"), Language::En).await.unwrap().is_empty());
        assert!(store.articles(Some("сон"), Language::Ru).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_articles_newest_first() {
        let (store, time) = setup().await;
        store
            .save_article(&Article::new("work", Approach::Practical, Language::En, "Old", "a"))
            .await
            .unwrap();
        time.advance(10);
        store
            .save_article(&Article::new("sleep", Approach::Practical, Language::En, "New", "b"))
            .await
            .unwrap();

        let all = store.articles(None, Language::En).await.unwrap();
        assert_eq!(all[0].title, "New");
        assert_eq!(store.recent_articles(1).await.unwrap()[0].title, "New");
    }

    #[tokio::test]
    async fn test_deactivate_empty_articles() {
        let (store, _) = setup().await;
        store
            .save_article(&Article::new("work", Approach::Practical, Language::En, "Empty", "   "))
            .await
            .unwrap();
        store
            .save_article(&Article::new("work", Approach::Practical, Language::En, "Full", "text"))
            .await
            .unwrap();

        assert_eq!(store.deactivate_empty_articles().await.unwrap(), 1);
        let remaining = store.articles(Some("work"), Language::En).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].title, "Full");
    }

    #[tokio::test]
    async fn test_quotes_by_offset_and_topic() {
        let (store, _) = setup().await;
        for (text, topic) in [("first", "calm"), ("second", "focus"), ("third", "calm")] {
            store
                .save_quote(&Quote::new(text, "Anon", topic, Language::En))
                .await
                .unwrap();
        }
        store
            .save_quote(&Quote::new("первая", "Аноним", "покой", Language::Ru).on("2026-01-01"))
            .await
            .unwrap();

        assert_eq!(store.quote_count(Some(Language::En)).await.unwrap(), 3);
        assert_eq!(store.quote_count(None).await.unwrap(), 4);

        let second = store.quote_at(Language::En, 1).await.unwrap().unwrap();
        assert_eq!(second.text, "second");
        assert!(store.quote_at(Language::En, 3).await.unwrap().is_none());

        let calm = store.quotes(Some("calm"), Language::En, 10).await.unwrap();
        let texts: Vec<&str> = calm.iter().map(|q| q.text.as_str()).collect();
        assert_eq!(texts, vec!["third", "first"]);

        let ru = store.quotes(None, Language::Ru, 10).await.unwrap();
        assert_eq!(ru[0].date.as_deref(), Some("2026-01-01"));
    }
}
