// Worker - Job execution loop

pub mod constants;
mod shutdown;

use constants::*;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use crate::application::retry::{RetryDecision, RetryPolicy};
use crate::domain::{Job, JobState};
use crate::error::Result;
use crate::port::{ExecutionError, ExecutionResult, ExecutionStatus, JobRepository, TaskExecutor, TimeProvider};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Worker processes jobs from a queue
pub struct Worker {
    name: String,
    queue: String,
    job_repo: Arc<dyn JobRepository>,
    task_executor: Arc<dyn TaskExecutor>,
    retry_policy: Arc<RetryPolicy>,
    time_provider: Arc<dyn TimeProvider>,
}

impl Worker {
    pub fn new(
        queue: impl Into<String>,
        job_repo: Arc<dyn JobRepository>,
        task_executor: Arc<dyn TaskExecutor>,
        retry_policy: Arc<RetryPolicy>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        let queue = queue.into();
        Self {
            name: queue.clone(),
            queue,
            job_repo,
            task_executor,
            retry_policy,
            time_provider,
        }
    }

    /// Name used in log lines (several workers may share a queue)
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Run worker loop with graceful shutdown support
    pub async fn run(&self, mut shutdown: ShutdownToken) -> Result<()> {
        info!(worker = %self.name, queue = %self.queue, "Worker started");
        loop {
            if shutdown.is_shutdown() {
                break;
            }
            match self.process_next_job().await {
                Ok(true) => {}
                Ok(false) => {
                    tokio::select! {
                        _ = sleep(IDLE_SLEEP_DURATION) => {},
                        _ = shutdown.wait() => {
                            info!(worker = %self.name, "Worker interrupted during idle");
                            break;
                        }
                    }
                }
                Err(e) => {
                    error!(worker = %self.name, error = %e, "Worker error");
                    tokio::select! {
                        _ = sleep(ERROR_RECOVERY_SLEEP_DURATION) => {},
                        _ = shutdown.wait() => {
                            info!(worker = %self.name, "Worker interrupted during error recovery");
                            break;
                        }
                    }
                }
            }
        }
        info!(worker = %self.name, queue = %self.queue, "Worker stopped");
        Ok(())
    }

    /// Process next job from queue (returns true if a job was taken)
    pub async fn process_next_job(&self) -> Result<bool> {
        // Pop next job (already atomically set to RUNNING in DB)
        let Some(job) = self.job_repo.pop_next(&self.queue).await? else {
            return Ok(false);
        };

        if self.retry_policy.is_ttl_exceeded(&job) {
            let mut job = job;
            job.fail(self.time_provider.now_millis(), "expired before execution");
            self.job_repo.update(&job).await?;
            return Ok(true);
        }

        info!(
            worker = %self.name,
            job_id = %job.id,
            job_type = %job.job_type.as_str(),
            attempt = %job.attempts,
            "Processing job"
        );

        // A panicking task must not take the worker down with it
        let job_arc = Arc::new(job);
        let job_for_exec = Arc::clone(&job_arc);
        let task_executor = Arc::clone(&self.task_executor);
        let handle =
            tokio::task::spawn(async move { task_executor.execute(&job_for_exec).await });
        let execution_result = handle.await;

        let mut job = Arc::try_unwrap(job_arc).unwrap_or_else(|arc| (*arc).clone());

        if self.was_cancelled(&job).await? {
            info!(job_id = %job.id, "Job was cancelled while running, result dropped");
            return Ok(true);
        }

        match execution_result {
            Ok(Ok(result)) if result.status == ExecutionStatus::Success => {
                self.complete(&mut job, result).await?;
            }
            Ok(Ok(result)) => {
                let reason = format!("Task reported {:?}", result.status);
                self.retry_or_fail(&mut job, reason).await?;
            }
            Ok(Err(e @ (ExecutionError::UnknownTask(_) | ExecutionError::InvalidPayload(_)))) => {
                // Re-running cannot fix these
                error!(job_id = %job.id, error = %e, "Job rejected");
                job.fail(self.time_provider.now_millis(), e.to_string());
                self.job_repo.update(&job).await?;
            }
            Ok(Err(e)) => {
                self.retry_or_fail(&mut job, e.to_string()).await?;
            }
            Err(join_err) => {
                let reason = if join_err.is_panic() {
                    "task panicked"
                } else {
                    "task aborted"
                };
                error!(job_id = %job.id, error = ?join_err, "{}", reason);
                job.fail(self.time_provider.now_millis(), reason);
                self.job_repo.update(&job).await?;
            }
        }
        Ok(true)
    }

    async fn complete(&self, job: &mut Job, result: ExecutionResult) -> Result<()> {
        let now = self.time_provider.now_millis();
        job.complete(now)?;
        job.result_summary = result.output.map(|output| output.to_string());
        job.last_error = None;
        self.job_repo.update(job).await?;
        info!(
            job_id = %job.id,
            job_type = %job.job_type.as_str(),
            duration_ms = %result.duration_ms,
            "Job completed"
        );
        Ok(())
    }

    async fn retry_or_fail(&self, job: &mut Job, reason: String) -> Result<()> {
        match self.retry_policy.should_retry(job) {
            RetryDecision::Retry(delay_ms) => {
                warn!(
                    job_id = %job.id,
                    attempt = %job.attempts,
                    delay_ms = %delay_ms,
                    error = %reason,
                    "Retrying job after failure"
                );
                self.retry_policy.prepare_for_retry(job, delay_ms, reason);
                supersede_if_overtaken(self.job_repo.as_ref(), job, self.time_provider.now_millis())
                    .await?;
            }
            RetryDecision::Failed => {
                error!(job_id = %job.id, error = %reason, "Job failed after max retries");
                job.fail(self.time_provider.now_millis(), reason);
            }
        }
        self.job_repo.update(job).await
    }

    async fn was_cancelled(&self, job: &Job) -> Result<bool> {
        Ok(matches!(
            self.job_repo.find_by_id(&job.id).await?,
            Some(current) if current.state == JobState::Cancelled
        ))
    }
}

/// A requeued job whose subject has a newer generation can never be popped
/// again, so it is closed as SUPERSEDED instead of going back to the queue.
pub(crate) async fn supersede_if_overtaken(
    job_repo: &dyn JobRepository,
    job: &mut Job,
    now_millis: i64,
) -> Result<()> {
    let latest = job_repo.get_latest_generation(&job.subject_key).await?;
    if job.generation < latest {
        info!(
            job_id = %job.id,
            generation = %job.generation,
            latest_generation = %latest,
            "Requeued job overtaken by a newer submission"
        );
        job.supersede(now_millis);
    }
    Ok(())
}
