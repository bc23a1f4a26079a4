// Retry logic
use crate::domain::{Job, JobState};
use crate::port::TimeProvider;
use std::sync::Arc;
use tracing::{info, warn};

/// Retry decision result
#[derive(Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the job (with backoff delay in ms)
    Retry(i64),
    /// Do not retry, job has failed permanently
    Failed,
}

/// Retry policy
///
/// Determines if a job should be retried based on:
/// - Current attempt count
/// - Maximum attempts allowed
/// - Backoff factor for exponential delay
pub struct RetryPolicy {
    time_provider: Arc<dyn TimeProvider>,
    base_delay_ms: i64,
}

impl RetryPolicy {
    /// Create a new retry policy
    ///
    /// # Arguments
    /// * `time_provider` - Time provider for current time
    /// * `base_delay_ms` - Base delay in milliseconds (default: 1000)
    pub fn new(time_provider: Arc<dyn TimeProvider>, base_delay_ms: i64) -> Self {
        Self {
            time_provider,
            base_delay_ms,
        }
    }

    /// Determine if a job should be retried
    ///
    /// Returns:
    /// - `RetryDecision::Retry(delay_ms)` if job should be retried with calculated backoff
    /// - `RetryDecision::Failed` if max attempts reached
    ///
    /// Backoff formula:
    /// delay = base_delay * (backoff_factor ^ attempt) * (1.0 ± 0.1)
    pub fn should_retry(&self, job: &Job) -> RetryDecision {
        // attempts counts retries already scheduled, the current run is attempts + 1
        if job.attempts + 1 >= job.max_attempts {
            warn!(
                job_id = %job.id,
                attempts = %job.attempts,
                max_attempts = %job.max_attempts,
                "Max retry attempts reached"
            );
            return RetryDecision::Failed;
        }

        let base_delay_ms = self.base_delay_ms as f64 * job.backoff_factor.powi(job.attempts);

        // Deterministic ±10% jitter seeded by the job id
        let jitter_seed = job.id.chars().map(|c| c as u32).sum::<u32>();
        let jitter_factor = 0.9 + ((jitter_seed % 21) as f64 / 100.0);

        let delay_ms = (base_delay_ms * jitter_factor) as i64;

        info!(
            job_id = %job.id,
            attempt = %job.attempts,
            max_attempts = %job.max_attempts,
            delay_ms = %delay_ms,
            "Scheduling retry"
        );

        RetryDecision::Retry(delay_ms)
    }

    /// Put a job back in the queue, not runnable before `delay_ms` has passed
    pub fn prepare_for_retry(&self, job: &mut Job, delay_ms: i64, error: impl Into<String>) {
        job.attempts += 1;
        job.state = JobState::Queued;
        job.started_at = None;
        job.schedule_at = Some(self.time_provider.now_millis() + delay_ms);
        job.last_error = Some(error.into());

        info!(
            job_id = %job.id,
            attempt = %job.attempts,
            schedule_at = ?job.schedule_at,
            "Job prepared for retry"
        );
    }

    /// Check if a job waited in the queue longer than its TTL
    pub fn is_ttl_exceeded(&self, job: &Job) -> bool {
        let now = self.time_provider.now_millis();
        if job.is_expired(now) {
            warn!(
                job_id = %job.id,
                ttl_ms = ?job.ttl_ms,
                age_ms = %(now - job.created_at),
                "Job TTL exceeded"
            );
            return true;
        }
        false
    }
}
