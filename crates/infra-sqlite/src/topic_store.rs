// SQLite TopicRepository Implementation

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use solace_core::domain::{ChatMode, TopicStat};
use solace_core::error::Result;
use solace_core::port::{TimeProvider, TopicRepository};
use sqlx::SqlitePool;
use std::sync::Arc;

pub struct SqliteTopicStore {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteTopicStore {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TopicRow {
    topic: String,
    mode: String,
    frequency: i64,
    last_mentioned: i64,
}

impl From<TopicRow> for TopicStat {
    fn from(row: TopicRow) -> Self {
        TopicStat {
            topic: row.topic,
            frequency: row.frequency,
            last_mentioned: row.last_mentioned,
            mode: ChatMode::parse(&row.mode).ok(),
        }
    }
}

#[async_trait]
impl TopicRepository for SqliteTopicStore {
    async fn record_mentions(&self, topics: &[String], mode: ChatMode) -> Result<()> {
        if topics.is_empty() {
            return Ok(());
        }
        let now = self.time_provider.now_millis();
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        for topic in topics {
            sqlx::query(
                r#"
                INSERT INTO topics (topic, mode, frequency, last_mentioned)
                VALUES (?, ?, 1, ?)
                ON CONFLICT(topic, mode) DO UPDATE SET
                    frequency = frequency + 1,
                    last_mentioned = excluded.last_mentioned
                "#,
            )
            .bind(topic)
            .bind(mode.as_str())
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn popular(&self, mode: Option<ChatMode>, limit: u32) -> Result<Vec<TopicStat>> {
        let rows: Vec<TopicRow> = match mode {
            Some(mode) => {
                sqlx::query_as(
                    r#"
                    SELECT topic, mode, frequency, last_mentioned FROM topics
                    WHERE mode = ?
                    ORDER BY frequency DESC, last_mentioned DESC
                    LIMIT ?
                    "#,
                )
                .bind(mode.as_str())
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as(
                    r#"
                    SELECT topic, mode, frequency, last_mentioned FROM topics
                    ORDER BY frequency DESC, last_mentioned DESC
                    LIMIT ?
                    "#,
                )
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TopicStat::from).collect())
    }

    async fn all(&self, limit: u32) -> Result<Vec<String>> {
        sqlx::query_scalar(
            r#"
            SELECT topic FROM topics
            GROUP BY topic
            ORDER BY MAX(last_mentioned) DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn set_user_topic(&self, user_id: &str, topic: Option<&str>) -> Result<()> {
        match topic {
            Some(topic) => {
                sqlx::query(
                    r#"
                    INSERT INTO user_topics (user_id, topic, updated_at) VALUES (?, ?, ?)
                    ON CONFLICT(user_id) DO UPDATE SET
                        topic = excluded.topic,
                        updated_at = excluded.updated_at
                    "#,
                )
                .bind(user_id)
                .bind(topic)
                .bind(self.time_provider.now_millis())
                .execute(&self.pool)
                .await
            }
            None => {
                sqlx::query("DELETE FROM user_topics WHERE user_id = ?")
                    .bind(user_id)
                    .execute(&self.pool)
                    .await
            }
        }
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn user_topic(&self, user_id: &str) -> Result<Option<String>> {
        sqlx::query_scalar("SELECT topic FROM user_topics WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};
    use solace_core::port::time_provider::FixedTimeProvider;

    async fn setup() -> (SqliteTopicStore, Arc<FixedTimeProvider>) {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        let time = Arc::new(FixedTimeProvider::new(1_000));
        (SqliteTopicStore::new(pool, time.clone()), time)
    }

    fn topics(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_mentions_accumulate_per_mode() {
        let (store, time) = setup().await;
        store.record_mentions(&topics(&["sleep", "stress"]), ChatMode::Support).await.unwrap();
        time.advance(10);
        store.record_mentions(&topics(&["stress"]), ChatMode::Support).await.unwrap();
        store.record_mentions(&topics(&["stress"]), ChatMode::Practice).await.unwrap();

        let popular = store.popular(Some(ChatMode::Support), 10).await.unwrap();
        assert_eq!(popular[0].topic, "stress");
        assert_eq!(popular[0].frequency, 2);
        assert_eq!(popular[0].last_mentioned, 1_010);
        assert_eq!(popular[0].mode, Some(ChatMode::Support));
        assert_eq!(popular.len(), 2);

        assert_eq!(store.popular(None, 10).await.unwrap().len(), 3);
        assert_eq!(store.popular(None, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_all_is_distinct_and_recent_first() {
        let (store, time) = setup().await;
        store.record_mentions(&topics(&["sleep"]), ChatMode::Support).await.unwrap();
        time.advance(10);
        store.record_mentions(&topics(&["work"]), ChatMode::Analysis).await.unwrap();
        time.advance(10);
        store.record_mentions(&topics(&["sleep"]), ChatMode::Practice).await.unwrap();

        assert_eq!(store.all(10).await.unwrap(), vec!["sleep", "work"]);
    }

    #[tokio::test]
    async fn test_user_topic_set_and_clear() {
        let (store, _) = setup().await;
        assert!(store.user_topic("u1").await.unwrap().is_none());

        store.set_user_topic("u1", Some("тревога")).await.unwrap();
        store.set_user_topic("u1", Some("сон")).await.unwrap();
        assert_eq!(store.user_topic("u1").await.unwrap().as_deref(), Some("сон"));

        store.set_user_topic("u1", None).await.unwrap();
        assert!(store.user_topic("u1").await.unwrap().is_none());
    }
}
