// SQLite Maintenance Implementation
use crate::error::map_sqlx_error;
use async_trait::async_trait;
use solace_core::domain::JobState;
use solace_core::error::Result;
use solace_core::port::{Maintenance, MaintenanceStats, TimeProvider};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::info;

/// SQLite maintenance implementation
pub struct SqliteMaintenance {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteMaintenance {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }

    /// Page count and free-page count times the page size
    async fn page_stats(&self) -> Result<(i64, i64)> {
        let page_count: i64 = sqlx::query_scalar("PRAGMA page_count")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let freelist_count: i64 = sqlx::query_scalar("PRAGMA freelist_count")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let page_size: i64 = sqlx::query_scalar("PRAGMA page_size")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok((page_count * page_size, freelist_count * page_size))
    }

    async fn count(&self, sql: &str) -> Result<i64> {
        sqlx::query_scalar(sql)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }
}

fn to_mb(bytes: i64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

#[async_trait]
impl Maintenance for SqliteMaintenance {
    async fn vacuum(&self) -> Result<f64> {
        info!("Running VACUUM to optimize database...");

        let (size_before, _) = self.page_stats().await?;

        sqlx::query("VACUUM")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let (size_after, _) = self.page_stats().await?;
        let reclaimed = to_mb((size_before - size_after).max(0));

        info!(
            size_before_mb = to_mb(size_before),
            size_after_mb = to_mb(size_after),
            reclaimed_mb = reclaimed,
            "VACUUM completed"
        );

        Ok(reclaimed)
    }

    async fn gc_finished_jobs(&self, retention_days: i64) -> Result<i64> {
        let now = self.time_provider.now_millis();
        let cutoff_time = now - retention_days * 24 * 60 * 60 * 1000;

        let result = sqlx::query(
            r#"
            DELETE FROM jobs
            WHERE state IN (?, ?, ?, ?)
            AND finished_at IS NOT NULL
            AND finished_at < ?
            "#,
        )
        .bind(JobState::Done.to_string())
        .bind(JobState::Failed.to_string())
        .bind(JobState::Superseded.to_string())
        .bind(JobState::Cancelled.to_string())
        .bind(cutoff_time)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let deleted = result.rows_affected() as i64;
        info!(
            retention_days = retention_days,
            deleted_jobs = deleted,
            "Finished job GC completed"
        );

        Ok(deleted)
    }

    async fn purge_expired_cache(&self) -> Result<u64> {
        let now = self.time_provider.now_millis();
        let result = sqlx::query("DELETE FROM kv_cache WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn get_stats(&self) -> Result<MaintenanceStats> {
        let (db_size_bytes, free_bytes) = self.page_stats().await?;

        let job_count = self.count("SELECT COUNT(*) FROM jobs").await?;
        let finished_job_count = self
            .count(
                "SELECT COUNT(*) FROM jobs \
                 WHERE state IN ('DONE', 'FAILED', 'SUPERSEDED', 'CANCELLED')",
            )
            .await?;
        let conversation_count = self.count("SELECT COUNT(*) FROM conversations").await?;
        let article_count = self
            .count("SELECT COUNT(*) FROM generated_content WHERE is_active = 1")
            .await?;
        let quote_count = self
            .count("SELECT COUNT(*) FROM quotes WHERE is_active = 1")
            .await?;
        let cache_entry_count = self.count("SELECT COUNT(*) FROM kv_cache").await?;

        let fragmentation_percent = if db_size_bytes > 0 {
            free_bytes as f64 / db_size_bytes as f64 * 100.0
        } else {
            0.0
        };

        Ok(MaintenanceStats {
            db_size_mb: to_mb(db_size_bytes),
            db_size_bytes,
            job_count,
            finished_job_count,
            conversation_count,
            article_count,
            quote_count,
            cache_entry_count,
            fragmentation_percent,
        })
    }
}
