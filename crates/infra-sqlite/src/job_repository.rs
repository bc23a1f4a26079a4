// SQLite JobRepository Implementation

use crate::error::map_sqlx_error;
use crate::SqliteJobTransaction;
use async_trait::async_trait;
use solace_core::domain::{Job, JobId, JobPayload, JobState, JobType};
use solace_core::error::Result;
use solace_core::port::{
    JobRepository, JobRepositoryTransaction, TimeProvider, TransactionalJobRepository,
};
use sqlx::{Executor, Sqlite, SqlitePool};
use std::sync::Arc;
use tracing::warn;

/// Insert a job through any executor (pool or open transaction)
pub(crate) async fn insert_job<'e, E>(executor: E, job: &Job) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO jobs (
            id, queue, job_type, subject_key, generation,
            priority, state, created_at, started_at, finished_at,
            payload, attempts, max_attempts, backoff_factor,
            ttl_ms, schedule_at, parent_job_id, result_summary, last_error
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&job.id)
    .bind(&job.queue)
    .bind(job.job_type.as_str())
    .bind(&job.subject_key)
    .bind(job.generation)
    .bind(job.priority)
    .bind(job.state.to_string())
    .bind(job.created_at)
    .bind(job.started_at)
    .bind(job.finished_at)
    .bind(job.payload.as_value().to_string())
    .bind(job.attempts)
    .bind(job.max_attempts)
    .bind(job.backoff_factor)
    .bind(job.ttl_ms)
    .bind(job.schedule_at)
    .bind(&job.parent_job_id)
    .bind(&job.result_summary)
    .bind(&job.last_error)
    .execute(executor)
    .await
    .map_err(map_sqlx_error)?;

    Ok(())
}

pub struct SqliteJobRepository {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteJobRepository {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }
}

#[async_trait]
impl JobRepository for SqliteJobRepository {
    async fn insert(&self, job: &Job) -> Result<()> {
        insert_job(&self.pool, job).await
    }

    async fn find_by_id(&self, id: &JobId) -> Result<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(|r| r.into_job()))
    }

    async fn update(&self, job: &Job) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET state = ?, started_at = ?, finished_at = ?,
                attempts = ?, schedule_at = ?, parent_job_id = ?, result_summary = ?, last_error = ?
            WHERE id = ?
            "#,
        )
        .bind(job.state.to_string())
        .bind(job.started_at)
        .bind(job.finished_at)
        .bind(job.attempts)
        .bind(job.schedule_at)
        .bind(&job.parent_job_id)
        .bind(&job.result_summary)
        .bind(&job.last_error)
        .bind(&job.id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn pop_next(&self, queue: &str) -> Result<Option<Job>> {
        // Only the latest generation of a subject is ever popped, and retries
        // wait until their schedule_at has passed.
        let now = self.time_provider.now_millis();

        let row = sqlx::query_as::<_, JobRow>(
            r#"
            UPDATE jobs
            SET state = ?, started_at = ?
            WHERE id = (
                SELECT j.id FROM jobs j
                WHERE j.queue = ? AND j.state = ?
                  AND (j.schedule_at IS NULL OR j.schedule_at <= ?)
                  AND j.generation = (
                      SELECT MAX(generation)
                      FROM jobs
                      WHERE subject_key = j.subject_key
                  )
                ORDER BY j.priority DESC, j.created_at ASC, j.id ASC
                LIMIT 1
            )
            RETURNING *
            "#,
        )
        .bind(JobState::Running.to_string())
        .bind(now)
        .bind(queue)
        .bind(JobState::Queued.to_string())
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|r| r.into_job()))
    }

    async fn get_latest_generation(&self, subject_key: &str) -> Result<i64> {
        let gen: Option<i64> =
            sqlx::query_scalar("SELECT latest_generation FROM subjects WHERE subject_key = ?")
                .bind(subject_key)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(gen.unwrap_or(0))
    }

    async fn mark_superseded(&self, subject_key: &str, below_generation: i64) -> Result<u64> {
        let now = self.time_provider.now_millis();

        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET state = ?, finished_at = ?
            WHERE subject_key = ? AND generation < ? AND state = ?
            "#,
        )
        .bind(JobState::Superseded.to_string())
        .bind(now)
        .bind(subject_key)
        .bind(below_generation)
        .bind(JobState::Queued.to_string())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        sqlx::query(
            r#"
            INSERT INTO subjects (subject_key, latest_generation) VALUES (?, ?)
            ON CONFLICT(subject_key) DO UPDATE SET latest_generation = excluded.latest_generation
            "#,
        )
        .bind(subject_key)
        .bind(below_generation)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn count_by_state(&self, queue: &str, state: JobState) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE queue = ? AND state = ?")
                .bind(queue)
                .bind(state.to_string())
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(count)
    }

    async fn find_by_state(&self, state: JobState) -> Result<Vec<Job>> {
        let rows: Vec<JobRow> = sqlx::query_as(
            r#"
            SELECT * FROM jobs
            WHERE state = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(state.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(|row| row.into_job()).collect())
    }

    async fn cancel(&self, id: &JobId, now_millis: i64) -> Result<bool> {
        // Conditional update so a finished job keeps its final state
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET state = ?, finished_at = ?
            WHERE id = ? AND state IN (?, ?)
            "#,
        )
        .bind(JobState::Cancelled.to_string())
        .bind(now_millis)
        .bind(id)
        .bind(JobState::Queued.to_string())
        .bind(JobState::Running.to_string())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TransactionalJobRepository for SqliteJobRepository {
    async fn begin_transaction(&self) -> Result<Box<dyn JobRepositoryTransaction>> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(Box::new(SqliteJobTransaction::new(
            tx,
            Arc::clone(&self.time_provider),
        )))
    }
}

/// SQLite row representation
#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    id: String,
    queue: String,
    job_type: String,
    subject_key: String,
    generation: i64,
    priority: i32,
    state: String,
    created_at: i64,
    started_at: Option<i64>,
    finished_at: Option<i64>,
    payload: String,
    attempts: i32,
    max_attempts: i32,
    backoff_factor: f64,
    ttl_ms: Option<i64>,
    schedule_at: Option<i64>,
    parent_job_id: Option<String>,
    result_summary: Option<String>,
    last_error: Option<String>,
}

impl JobRow {
    fn into_job(self) -> Job {
        let state = JobState::parse(&self.state).unwrap_or_else(|| {
            warn!(job_id = %self.id, state = %self.state, "Unknown job state in database");
            JobState::Failed
        });

        let payload: serde_json::Value =
            serde_json::from_str(&self.payload).unwrap_or(serde_json::json!({}));

        Job {
            id: self.id,
            queue: self.queue,
            job_type: JobType::new(self.job_type),
            subject_key: self.subject_key,
            generation: self.generation,
            priority: self.priority,
            state,
            created_at: self.created_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
            payload: JobPayload::new(payload),
            attempts: self.attempts,
            max_attempts: self.max_attempts,
            backoff_factor: self.backoff_factor,
            ttl_ms: self.ttl_ms,
            schedule_at: self.schedule_at,
            parent_job_id: self.parent_job_id,
            result_summary: self.result_summary,
            last_error: self.last_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};
    use solace_core::port::time_provider::FixedTimeProvider;

    const NOW: i64 = 1_700_000_000_000;

    async fn setup_test_db() -> (SqliteJobRepository, Arc<FixedTimeProvider>) {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        let time_provider = Arc::new(FixedTimeProvider::new(NOW));
        (SqliteJobRepository::new(pool, time_provider.clone()), time_provider)
    }

    fn job(id: &str, subject: &str, generation: i64) -> Job {
        Job::new(
            id,
            NOW,
            "default",
            JobType::new("EXTRACT_TOPIC"),
            subject,
            generation,
            JobPayload::new(serde_json::json!({"user_id": "u1"})),
        )
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let (repo, _) = setup_test_db().await;
        let mut j = job("a", "topic:u1", 1);
        j.parent_job_id = Some("parent".to_string());
        j.ttl_ms = Some(60_000);

        repo.insert(&j).await.unwrap();

        let found = repo.find_by_id(&"a".to_string()).await.unwrap().unwrap();
        assert_eq!(found.job_type.as_str(), "EXTRACT_TOPIC");
        assert_eq!(found.payload.as_value()["user_id"], "u1");
        assert_eq!(found.parent_job_id.as_deref(), Some("parent"));
        assert_eq!(found.ttl_ms, Some(60_000));
        assert_eq!(found.state, JobState::Queued);
    }

    #[tokio::test]
    async fn test_pop_next_by_priority() {
        let (repo, _) = setup_test_db().await;
        let low = job("low", "s1", 1);
        let mut high = job("high", "s2", 1);
        high.priority = 10;
        repo.insert(&low).await.unwrap();
        repo.insert(&high).await.unwrap();

        let popped = repo.pop_next("default").await.unwrap().unwrap();
        assert_eq!(popped.id, "high");
        assert_eq!(popped.state, JobState::Running);
        assert_eq!(popped.started_at, Some(NOW));

        assert_eq!(repo.pop_next("default").await.unwrap().unwrap().id, "low");
        assert!(repo.pop_next("default").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pop_skips_older_generations() {
        let (repo, _) = setup_test_db().await;
        repo.insert(&job("old", "topic:u1", 1)).await.unwrap();
        repo.insert(&job("new", "topic:u1", 2)).await.unwrap();

        assert_eq!(repo.pop_next("default").await.unwrap().unwrap().id, "new");
        assert!(repo.pop_next("default").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pop_waits_for_schedule_at() {
        let (repo, time) = setup_test_db().await;
        let mut j = job("later", "s", 1);
        j.schedule_at = Some(NOW + 5_000);
        repo.insert(&j).await.unwrap();

        assert!(repo.pop_next("default").await.unwrap().is_none());
        time.advance(5_000);
        assert_eq!(repo.pop_next("default").await.unwrap().unwrap().id, "later");
    }

    #[tokio::test]
    async fn test_supersede() {
        let (repo, _) = setup_test_db().await;
        for gen in 1..=3 {
            repo.insert(&job(&format!("j{}", gen), "same::subject", gen)).await.unwrap();
        }

        let count = repo.mark_superseded("same::subject", 3).await.unwrap();
        assert_eq!(count, 2);

        assert_eq!(repo.count_by_state("default", JobState::Queued).await.unwrap(), 1);
        assert_eq!(repo.count_by_state("default", JobState::Superseded).await.unwrap(), 2);
        assert_eq!(repo.get_latest_generation("same::subject").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_update_round_trips_results() {
        let (repo, _) = setup_test_db().await;
        repo.insert(&job("a", "s", 1)).await.unwrap();
        let mut popped = repo.pop_next("default").await.unwrap().unwrap();
        popped.complete(NOW + 10).unwrap();
        popped.result_summary = Some(r#"{"topic":"sleep"}"#.to_string());

        repo.update(&popped).await.unwrap();

        let found = repo.find_by_id(&"a".to_string()).await.unwrap().unwrap();
        assert_eq!(found.state, JobState::Done);
        assert_eq!(found.finished_at, Some(NOW + 10));
        assert_eq!(found.result_summary.as_deref(), Some(r#"{"topic":"sleep"}"#));
    }

    #[tokio::test]
    async fn test_cancel_only_unfinished() {
        let (repo, _) = setup_test_db().await;
        repo.insert(&job("a", "s1", 1)).await.unwrap();
        let mut done = job("b", "s2", 1);
        done.state = JobState::Done;
        repo.insert(&done).await.unwrap();

        assert!(repo.cancel(&"a".to_string(), NOW).await.unwrap());
        assert!(!repo.cancel(&"b".to_string(), NOW).await.unwrap());
        assert!(!repo.cancel(&"missing".to_string(), NOW).await.unwrap());

        let a = repo.find_by_id(&"a".to_string()).await.unwrap().unwrap();
        assert_eq!(a.state, JobState::Cancelled);
    }

    #[tokio::test]
    async fn test_transaction_commit_and_rollback() {
        let (repo, _) = setup_test_db().await;

        let mut tx = repo.begin_transaction().await.unwrap();
        assert_eq!(tx.get_latest_generation("s").await.unwrap(), 0);
        tx.insert(&job("kept", "s", 1)).await.unwrap();
        tx.mark_superseded("s", 1).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = repo.begin_transaction().await.unwrap();
        assert_eq!(tx.get_latest_generation("s").await.unwrap(), 1);
        tx.insert(&job("dropped", "s", 2)).await.unwrap();
        tx.rollback().await.unwrap();

        assert!(repo.find_by_id(&"kept".to_string()).await.unwrap().is_some());
        assert!(repo.find_by_id(&"dropped".to_string()).await.unwrap().is_none());
    }
}
