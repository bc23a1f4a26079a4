// Task Service - enqueueing background work and reporting on it

pub mod enqueue;

pub use enqueue::{validate_request, EnqueueRequest};

use crate::domain::{JobState, TaskKind};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, JobRepository, TimeProvider, TransactionalJobRepository};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Queue every background task runs on
pub const DEFAULT_QUEUE: &str = "default";

/// Priority of tasks triggered by a user request
pub const INTERACTIVE_PRIORITY: i32 = 10;

/// Priority of periodic and startup tasks
pub const BACKGROUND_PRIORITY: i32 = 0;

/// Externally visible task status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub task_id: String,
    /// pending | completed | failed | superseded
    pub status: String,
    pub state: JobState,
    pub job_type: String,
    pub attempts: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn status_label(state: JobState) -> &'static str {
    match state {
        JobState::Queued | JobState::Running => "pending",
        JobState::Done => "completed",
        JobState::Failed | JobState::Cancelled => "failed",
        JobState::Superseded => "superseded",
    }
}

pub struct TaskService {
    job_repo: Arc<dyn JobRepository>,
    tx_repo: Arc<dyn TransactionalJobRepository>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl TaskService {
    pub fn new(
        job_repo: Arc<dyn JobRepository>,
        tx_repo: Arc<dyn TransactionalJobRepository>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            job_repo,
            tx_repo,
            id_provider,
            time_provider,
        }
    }

    /// Enqueue a new job
    pub async fn enqueue(&self, req: EnqueueRequest) -> Result<String> {
        let job_type = req.job_type.clone();
        let subject_key = req.subject_key.clone();
        let job_id = enqueue::execute(
            self.tx_repo.as_ref(),
            self.id_provider.as_ref(),
            self.time_provider.as_ref(),
            req,
        )
        .await?;

        info!(
            job_id = %job_id,
            job_type = %job_type,
            subject_key = %subject_key,
            "Task enqueued"
        );
        Ok(job_id)
    }

    /// Enqueue a known task kind with a typed payload
    pub async fn submit<P: Serialize + Sync>(
        &self,
        kind: TaskKind,
        subject_key: impl Into<String>,
        payload: &P,
        priority: i32,
        parent_job_id: Option<&str>,
    ) -> Result<String> {
        let mut req = EnqueueRequest::for_task(kind, subject_key, payload)?.with_priority(priority);
        if let Some(parent) = parent_job_id {
            req = req.with_parent(parent);
        }
        self.enqueue(req).await
    }

    pub async fn status(&self, task_id: &str) -> Result<TaskStatus> {
        let job = self
            .job_repo
            .find_by_id(&task_id.to_string())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Task {}", task_id)))?;

        let result = match (job.state, job.result_summary.as_deref()) {
            (JobState::Done, Some(raw)) => {
                Some(serde_json::from_str(raw).unwrap_or(serde_json::Value::String(raw.to_string())))
            }
            _ => None,
        };
        let error = match job.state {
            JobState::Failed => job.last_error.clone(),
            JobState::Cancelled => Some("cancelled".to_string()),
            _ => None,
        };

        Ok(TaskStatus {
            task_id: job.id,
            status: status_label(job.state).to_string(),
            state: job.state,
            job_type: job.job_type.as_str().to_string(),
            attempts: job.attempts,
            result,
            error,
        })
    }

    /// Cancel a job that has not finished yet
    pub async fn cancel(&self, task_id: &str) -> Result<TaskStatus> {
        let now = self.time_provider.now_millis();
        let cancelled = self.job_repo.cancel(&task_id.to_string(), now).await?;
        let status = self.status(task_id).await?;
        if !cancelled {
            return Err(AppError::Conflict(format!(
                "Task {} already finished ({})",
                task_id, status.state
            )));
        }
        info!(job_id = %task_id, "Task cancelled");
        Ok(status)
    }

    /// Job counts for one queue, by state
    pub async fn queue_counts(&self, queue: &str) -> Result<QueueCounts> {
        Ok(QueueCounts {
            queued: self.job_repo.count_by_state(queue, JobState::Queued).await?,
            running: self.job_repo.count_by_state(queue, JobState::Running).await?,
            done: self.job_repo.count_by_state(queue, JobState::Done).await?,
            failed: self.job_repo.count_by_state(queue, JobState::Failed).await?,
            superseded: self
                .job_repo
                .count_by_state(queue, JobState::Superseded)
                .await?,
            cancelled: self
                .job_repo
                .count_by_state(queue, JobState::Cancelled)
                .await?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub queued: i64,
    pub running: i64,
    pub done: i64,
    pub failed: i64,
    pub superseded: i64,
    pub cancelled: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        assert_eq!(status_label(JobState::Queued), "pending");
        assert_eq!(status_label(JobState::Running), "pending");
        assert_eq!(status_label(JobState::Done), "completed");
        assert_eq!(status_label(JobState::Cancelled), "failed");
        assert_eq!(status_label(JobState::Superseded), "superseded");
    }
}
