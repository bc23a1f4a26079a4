// SQLite Cache Implementation (kv_cache table)

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use solace_core::error::Result;
use solace_core::port::{Cache, TimeProvider};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Persistent key-value cache; survives restarts, unlike `InMemoryCache`
pub struct SqliteCache {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteCache {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }
}

#[async_trait]
impl Cache for SqliteCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        sqlx::query_scalar("SELECT value FROM kv_cache WHERE key = ? AND expires_at > ?")
            .bind(key)
            .bind(self.time_provider.now_millis())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        let expires_at = self
            .time_provider
            .now_millis()
            .saturating_add((ttl_secs as i64).saturating_mul(1000));

        sqlx::query("INSERT OR REPLACE INTO kv_cache (key, value, expires_at) VALUES (?, ?, ?)")
            .bind(key)
            .bind(value)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM kv_cache WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM kv_cache WHERE expires_at <= ?")
            .bind(self.time_provider.now_millis())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn entry_count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM kv_cache WHERE expires_at > ?")
            .bind(self.time_provider.now_millis())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};
    use solace_core::port::time_provider::FixedTimeProvider;
    use solace_core::port::{get_json, set_json};

    async fn setup() -> (SqliteCache, Arc<FixedTimeProvider>) {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        let time = Arc::new(FixedTimeProvider::new(1_000_000));
        (SqliteCache::new(pool, time.clone()), time)
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let (cache, time) = setup().await;
        cache.set("user_topic:u1", "sleep", 300).await.unwrap();
        assert_eq!(cache.get("user_topic:u1").await.unwrap().as_deref(), Some("sleep"));

        time.advance(300_000);
        assert!(cache.get("user_topic:u1").await.unwrap().is_none());
        assert_eq!(cache.entry_count().await.unwrap(), 0);
        assert_eq!(cache.purge_expired().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_set_replaces_and_extends() {
        let (cache, time) = setup().await;
        cache.set("k", "one", 10).await.unwrap();
        time.advance(5_000);
        cache.set("k", "two", 10).await.unwrap();
        time.advance(8_000);

        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("two"));
        assert_eq!(cache.entry_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_and_json() {
        let (cache, _) = setup().await;
        set_json(&cache, "popular_topics", &vec!["stress", "sleep"], 60)
            .await
            .unwrap();

        let topics: Vec<String> = get_json(&cache, "popular_topics").await.unwrap().unwrap();
        assert_eq!(topics, vec!["stress", "sleep"]);

        assert!(cache.delete("popular_topics").await.unwrap());
        assert!(!cache.delete("popular_topics").await.unwrap());
    }
}
