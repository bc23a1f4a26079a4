// Job Domain Model

use serde::{Deserialize, Serialize};

/// Job ID (UUID v4)
pub type JobId = String;

/// Queue identifier
pub type QueueId = String;

/// Job State
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Queued,
    Running,
    Done,
    Failed,
    Superseded,
    Cancelled,
}

impl JobState {
    /// Parse the persisted representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "QUEUED" => Some(JobState::Queued),
            "RUNNING" => Some(JobState::Running),
            "DONE" => Some(JobState::Done),
            "FAILED" => Some(JobState::Failed),
            "SUPERSEDED" => Some(JobState::Superseded),
            "CANCELLED" => Some(JobState::Cancelled),
            _ => None,
        }
    }

    /// Terminal states never transition again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Done | JobState::Failed | JobState::Superseded | JobState::Cancelled
        )
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Queued => write!(f, "QUEUED"),
            JobState::Running => write!(f, "RUNNING"),
            JobState::Done => write!(f, "DONE"),
            JobState::Failed => write!(f, "FAILED"),
            JobState::Superseded => write!(f, "SUPERSEDED"),
            JobState::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Job Type (the task name, see `TaskKind`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobType(String);

impl JobType {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Priority (higher number = higher priority)
pub type Priority = i32;

/// Subject Key (for supersede logic)
pub type SubjectKey = String;

/// Generation (for supersede logic)
pub type Generation = i64;

/// Job Payload (JSON serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPayload(serde_json::Value);

impl JobPayload {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

/// Job Entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    // Identity
    pub id: JobId,
    pub queue: QueueId,
    pub job_type: JobType,
    pub subject_key: SubjectKey,
    pub generation: Generation,

    pub priority: Priority,
    pub state: JobState,

    pub created_at: i64, // epoch ms
    pub started_at: Option<i64>,
    pub finished_at: Option<i64>,

    pub payload: JobPayload,

    // Retry
    pub attempts: i32,
    pub max_attempts: i32,
    pub backoff_factor: f64,

    // Expiry
    pub ttl_ms: Option<i64>,

    // Scheduling
    pub schedule_at: Option<i64>, // epoch ms, job is not popped before this

    // Chaining & results
    pub parent_job_id: Option<String>,
    pub result_summary: Option<String>, // JSON output of the task
    pub last_error: Option<String>,
}

impl Job {
    /// Create a test job with deterministic ID and timestamp.
    ///
    /// Uses a simple counter for deterministic test IDs (test-1, test-2, ...).
    /// Timestamps start at 1000 and increment by 1000.
    ///
    /// **Note**: This method should only be used in tests. For production code,
    /// always inject ID and time via providers.
    pub fn new_test(
        queue: impl Into<String>,
        job_type: JobType,
        subject_key: impl Into<String>,
        generation: Generation,
        payload: JobPayload,
    ) -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static TEST_COUNTER: AtomicU64 = AtomicU64::new(1);

        let counter = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let id = format!("test-{}", counter);
        let created_at = (counter * 1000) as i64;

        Self::new(
            id,
            created_at,
            queue,
            job_type,
            subject_key,
            generation,
            payload,
        )
    }

    /// Create a new Job
    ///
    /// # Arguments
    ///
    /// * `id` - Unique job ID (injected, not generated)
    /// * `created_at` - Creation timestamp in epoch ms (injected, not system time)
    /// * `queue` - Queue name
    /// * `job_type` - Job type
    /// * `subject_key` - Subject key for supersede logic
    /// * `generation` - Generation number
    /// * `payload` - Job payload
    pub fn new(
        id: impl Into<String>,
        created_at: i64,
        queue: impl Into<String>,
        job_type: JobType,
        subject_key: impl Into<String>,
        generation: Generation,
        payload: JobPayload,
    ) -> Self {
        Self {
            id: id.into(),
            queue: queue.into(),
            job_type,
            subject_key: subject_key.into(),
            generation,
            priority: 0,
            state: JobState::Queued,
            created_at,
            started_at: None,
            finished_at: None,
            payload,
            attempts: 0,
            max_attempts: 3,
            backoff_factor: 2.0,
            ttl_ms: None,
            schedule_at: None,
            parent_job_id: None,
            result_summary: None,
            last_error: None,
        }
    }

    /// Transition to Running state with explicit timestamp
    pub fn start(&mut self, now_millis: i64) -> crate::domain::error::Result<()> {
        if self.state != JobState::Queued {
            return Err(crate::domain::error::DomainError::InvalidStateTransition {
                from: self.state.to_string(),
                to: "RUNNING".to_string(),
            });
        }
        self.state = JobState::Running;
        self.started_at = Some(now_millis);
        Ok(())
    }

    /// Transition to Done state with explicit timestamp
    pub fn complete(&mut self, now_millis: i64) -> crate::domain::error::Result<()> {
        if self.state != JobState::Running {
            return Err(crate::domain::error::DomainError::InvalidStateTransition {
                from: self.state.to_string(),
                to: "DONE".to_string(),
            });
        }
        self.state = JobState::Done;
        self.finished_at = Some(now_millis);
        Ok(())
    }

    /// Mark as Superseded with explicit timestamp
    pub fn supersede(&mut self, now_millis: i64) {
        self.state = JobState::Superseded;
        self.finished_at = Some(now_millis);
    }

    /// Mark as Failed with explicit timestamp and reason
    pub fn fail(&mut self, now_millis: i64, reason: impl Into<String>) {
        self.state = JobState::Failed;
        self.finished_at = Some(now_millis);
        self.last_error = Some(reason.into());
    }

    /// Whether the job waited in the queue longer than its TTL
    pub fn is_expired(&self, now_millis: i64) -> bool {
        matches!(self.ttl_ms, Some(ttl) if now_millis - self.created_at > ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> Job {
        Job::new(
            "job-1",
            1_000,
            "default",
            JobType::new("EXTRACT_TOPIC"),
            "topic:alice",
            1,
            JobPayload::new(serde_json::json!({})),
        )
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut job = job();
        job.start(2_000).unwrap();
        assert_eq!(job.state, JobState::Running);
        assert_eq!(job.started_at, Some(2_000));

        job.complete(3_000).unwrap();
        assert_eq!(job.state, JobState::Done);
        assert_eq!(job.finished_at, Some(3_000));
    }

    #[test]
    fn test_complete_requires_running() {
        let mut job = job();
        let err = job.complete(2_000).unwrap_err();
        assert!(err.to_string().contains("QUEUED -> DONE"));
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let mut job = job();
        job.start(2_000).unwrap();
        assert!(job.start(2_500).is_err());
    }

    #[test]
    fn test_fail_records_reason() {
        let mut job = job();
        job.fail(5_000, "llm unavailable");
        assert_eq!(job.state, JobState::Failed);
        assert_eq!(job.last_error.as_deref(), Some("llm unavailable"));
        assert!(job.state.is_terminal());
    }

    #[test]
    fn test_ttl_expiry() {
        let mut job = job();
        assert!(!job.is_expired(1_000_000));
        job.ttl_ms = Some(500);
        assert!(!job.is_expired(1_400));
        assert!(job.is_expired(1_600));
    }

    #[test]
    fn test_state_parse_matches_display() {
        for state in [
            JobState::Queued,
            JobState::Running,
            JobState::Done,
            JobState::Failed,
            JobState::Superseded,
            JobState::Cancelled,
        ] {
            assert_eq!(JobState::parse(&state.to_string()), Some(state));
        }
        assert_eq!(JobState::parse("BOGUS"), None);
    }
}
