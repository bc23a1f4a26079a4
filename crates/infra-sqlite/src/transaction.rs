// Enqueue transaction on SQLite

use crate::error::map_sqlx_error;
use crate::job_repository::insert_job;
use async_trait::async_trait;
use solace_core::domain::{Job, JobState};
use solace_core::error::Result;
use solace_core::port::{JobRepositoryTransaction, TimeProvider, Transaction};
use sqlx::{Sqlite, Transaction as SqlxTransaction};
use std::sync::Arc;

pub struct SqliteJobTransaction<'a> {
    tx: SqlxTransaction<'a, Sqlite>,
    time_provider: Arc<dyn TimeProvider>,
}

impl<'a> SqliteJobTransaction<'a> {
    pub fn new(tx: SqlxTransaction<'a, Sqlite>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self { tx, time_provider }
    }
}

#[async_trait]
impl Transaction for SqliteJobTransaction<'_> {
    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await.map_err(map_sqlx_error)
    }
}

const CLAIM_SUBJECT: &str =
    "INSERT INTO subjects (subject_key, latest_generation) VALUES (?, 0) ON CONFLICT(subject_key) DO NOTHING";

const SUPERSEDE_OLDER: &str = r#"
    UPDATE jobs
    SET state = ?, finished_at = ?
    WHERE subject_key = ? AND generation < ? AND state = ?
"#;

#[async_trait]
impl JobRepositoryTransaction for SqliteJobTransaction<'_> {
    async fn get_latest_generation(&mut self, subject_key: &str) -> Result<i64> {
        // The write takes the database lock, so concurrent enqueues for a
        // subject serialize here instead of reading the same generation
        sqlx::query(CLAIM_SUBJECT)
            .bind(subject_key)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        sqlx::query_scalar("SELECT latest_generation FROM subjects WHERE subject_key = ?")
            .bind(subject_key)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)
    }

    async fn insert(&mut self, job: &Job) -> Result<()> {
        insert_job(&mut *self.tx, job).await
    }

    async fn mark_superseded(&mut self, subject_key: &str, below_generation: i64) -> Result<u64> {
        let superseded = sqlx::query(SUPERSEDE_OLDER)
            .bind(JobState::Superseded.to_string())
            .bind(self.time_provider.now_millis())
            .bind(subject_key)
            .bind(below_generation)
            .bind(JobState::Queued.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();

        sqlx::query("UPDATE subjects SET latest_generation = ? WHERE subject_key = ?")
            .bind(below_generation)
            .bind(subject_key)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        Ok(superseded)
    }
}
