// Enqueue Use Case

use crate::domain::{Job, JobPayload, JobType, TaskKind};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, TimeProvider, TransactionalJobRepository};
use serde::{Deserialize, Serialize};

const MAX_QUEUE_NAME_LEN: usize = 64;
const MAX_PAYLOAD_DEPTH: usize = 32;
const PRIORITY_RANGE: std::ops::RangeInclusive<i32> = -100..=100;

/// Enqueue request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnqueueRequest {
    pub job_type: String,
    pub queue: String,
    pub subject_key: String,
    pub payload: serde_json::Value,

    #[serde(default)]
    pub priority: i32,

    #[serde(default)]
    pub parent_job_id: Option<String>,
}

impl EnqueueRequest {
    /// Request for a background task on the default queue
    pub fn for_task<P: Serialize>(
        kind: TaskKind,
        subject_key: impl Into<String>,
        payload: &P,
    ) -> Result<Self> {
        Ok(Self {
            job_type: kind.as_str().to_string(),
            queue: super::DEFAULT_QUEUE.to_string(),
            subject_key: subject_key.into(),
            payload: serde_json::to_value(payload)?,
            priority: 0,
            parent_job_id: None,
        })
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_parent(mut self, parent_job_id: impl Into<String>) -> Self {
        self.parent_job_id = Some(parent_job_id.into());
        self
    }
}

/// Reject requests the queue cannot store sensibly
pub fn validate_request(req: &EnqueueRequest) -> Result<()> {
    if req.queue.is_empty() {
        return Err(AppError::Validation("Queue name cannot be empty".to_string()));
    }
    if req.queue.len() > MAX_QUEUE_NAME_LEN {
        return Err(AppError::Validation(format!(
            "Queue name too long (max {} chars)",
            MAX_QUEUE_NAME_LEN
        )));
    }
    if !req
        .queue
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(AppError::Validation(
            "Queue name must be alphanumeric (plus '_' and '-')".to_string(),
        ));
    }
    if req.job_type.is_empty() {
        return Err(AppError::Validation("Job type cannot be empty".to_string()));
    }
    if !PRIORITY_RANGE.contains(&req.priority) {
        return Err(AppError::Validation(format!(
            "Priority {} out of range ({}..={})",
            req.priority,
            PRIORITY_RANGE.start(),
            PRIORITY_RANGE.end()
        )));
    }
    if json_depth(&req.payload) > MAX_PAYLOAD_DEPTH {
        return Err(AppError::Validation(format!(
            "Payload too deeply nested (max depth {})",
            MAX_PAYLOAD_DEPTH
        )));
    }
    Ok(())
}

fn json_depth(value: &serde_json::Value) -> usize {
    match value {
        serde_json::Value::Array(items) => 1 + items.iter().map(json_depth).max().unwrap_or(0),
        serde_json::Value::Object(map) => 1 + map.values().map(json_depth).max().unwrap_or(0),
        _ => 0,
    }
}

/// Execute enqueue use case (with transaction for atomicity)
///
/// # Arguments
///
/// * `job_repo` - Transactional job repository
/// * `id_provider` - ID generator (injected for determinism)
/// * `time_provider` - Time provider (injected for determinism)
/// * `req` - Enqueue request
pub async fn execute(
    job_repo: &dyn TransactionalJobRepository,
    id_provider: &dyn IdProvider,
    time_provider: &dyn TimeProvider,
    req: EnqueueRequest,
) -> Result<String> {
    validate_request(&req)?;

    // Start transaction to prevent generation conflicts
    let mut tx = job_repo.begin_transaction().await?;

    let latest_gen = tx.get_latest_generation(&req.subject_key).await?;
    let new_gen = latest_gen + 1;

    let job_id = id_provider.generate_id();
    let created_at = time_provider.now_millis();

    let mut job = Job::new(
        job_id.clone(),
        created_at,
        req.queue,
        JobType::new(req.job_type),
        req.subject_key.clone(),
        new_gen,
        JobPayload::new(req.payload),
    );
    job.priority = req.priority;
    job.parent_job_id = req.parent_job_id;

    tx.insert(&job).await?;

    // Older queued generations of the same subject will never run
    tx.mark_superseded(&req.subject_key, new_gen).await?;

    tx.commit().await?;

    Ok(job_id)
}
