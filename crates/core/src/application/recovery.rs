// Crash recovery logic
use crate::domain::JobState;
use crate::port::{JobRepository, TimeProvider};
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::worker::constants::DEFAULT_RECOVERY_WINDOW_MS;
use crate::application::worker::supersede_if_overtaken;

/// Crash recovery service
///
/// On daemon startup, requeues jobs that were RUNNING when the daemon stopped
pub struct RecoveryService {
    job_repo: Arc<dyn JobRepository>,
    time_provider: Arc<dyn TimeProvider>,
    recovery_window_ms: i64,
}

impl RecoveryService {
    /// Create a new recovery service
    ///
    /// # Arguments
    /// * `job_repo` - Job repository
    /// * `time_provider` - Time provider
    /// * `recovery_window_ms` - Optional custom recovery window (default: 5 minutes)
    pub fn new(
        job_repo: Arc<dyn JobRepository>,
        time_provider: Arc<dyn TimeProvider>,
        recovery_window_ms: Option<i64>,
    ) -> Self {
        Self {
            job_repo,
            time_provider,
            recovery_window_ms: recovery_window_ms.unwrap_or(DEFAULT_RECOVERY_WINDOW_MS),
        }
    }

    /// Recover orphaned jobs on daemon startup
    ///
    /// 1. RUNNING jobs with `started_at < now - recovery_window` go back to QUEUED
    /// 2. RUNNING jobs without `started_at` are inconsistent and marked FAILED
    ///
    /// # Returns
    /// Number of jobs recovered
    pub async fn recover_orphaned_jobs(&self) -> crate::error::Result<usize> {
        let now = self.time_provider.now_millis();
        let cutoff = now - self.recovery_window_ms;

        info!(
            cutoff_time = %cutoff,
            recovery_window_ms = %self.recovery_window_ms,
            "Starting orphaned job recovery"
        );

        let running_jobs = self.job_repo.find_by_state(JobState::Running).await?;
        let mut recovered_count = 0;

        for mut job in running_jobs {
            match job.started_at {
                Some(started_at) if started_at < cutoff => {
                    job.state = JobState::Queued;
                    job.started_at = None;
                    supersede_if_overtaken(self.job_repo.as_ref(), &mut job, now).await?;
                    self.job_repo.update(&job).await?;
                    recovered_count += 1;

                    info!(
                        job_id = %job.id,
                        job_type = %job.job_type.as_str(),
                        started_at = %started_at,
                        state = %job.state,
                        "Orphaned job requeued"
                    );
                }
                Some(_) => {}
                None => {
                    warn!(
                        job_id = %job.id,
                        "RUNNING job without started_at, marking as FAILED"
                    );
                    job.fail(now, "recovered without start time");
                    self.job_repo.update(&job).await?;
                    recovered_count += 1;
                }
            }
        }

        info!(recovered_count = %recovered_count, "Orphaned job recovery complete");
        Ok(recovered_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Job, JobPayload, JobType};
    use crate::port::job_repository::mocks::InMemoryJobs;
    use crate::port::time_provider::FixedTimeProvider;

    const NOW: i64 = 1_709_294_400_000;

    fn running(id: &str, started_at: Option<i64>) -> Job {
        let mut job = Job::new(
            id,
            NOW - 600_000,
            "default",
            JobType::new("UPDATE_POPULAR_TOPICS"),
            format!("subject-{}", id),
            1,
            JobPayload::new(serde_json::json!({})),
        );
        job.state = JobState::Running;
        job.started_at = started_at;
        job
    }

    #[tokio::test]
    async fn test_stale_jobs_requeued_fresh_jobs_kept() {
        let time = Arc::new(FixedTimeProvider::new(NOW));
        let jobs = Arc::new(InMemoryJobs::new(time.clone()));
        jobs.insert(&running("stale", Some(NOW - 10 * 60 * 1000))).await.unwrap();
        jobs.insert(&running("fresh", Some(NOW - 1000))).await.unwrap();
        jobs.insert(&running("broken", None)).await.unwrap();

        let recovery = RecoveryService::new(jobs.clone(), time, None);
        assert_eq!(recovery.recover_orphaned_jobs().await.unwrap(), 2);

        let state = |id: &str| {
            jobs.all()
                .into_iter()
                .find(|j| j.id == id)
                .map(|j| j.state)
                .unwrap()
        };
        assert_eq!(state("stale"), JobState::Queued);
        assert_eq!(state("fresh"), JobState::Running);
        assert_eq!(state("broken"), JobState::Failed);
    }

    #[tokio::test]
    async fn test_stale_job_overtaken_by_newer_generation_is_superseded() {
        let time = Arc::new(FixedTimeProvider::new(NOW));
        let jobs = Arc::new(InMemoryJobs::new(time.clone()));
        let mut old = running("old", Some(NOW - 10 * 60 * 1000));
        old.subject_key = "topic:u1".to_string();
        jobs.insert(&old).await.unwrap();
        let newer = Job::new(
            "newer",
            NOW - 1000,
            "default",
            JobType::new("UPDATE_POPULAR_TOPICS"),
            "topic:u1",
            2,
            JobPayload::new(serde_json::json!({})),
        );
        jobs.insert(&newer).await.unwrap();

        let recovery = RecoveryService::new(jobs.clone(), time, None);
        assert_eq!(recovery.recover_orphaned_jobs().await.unwrap(), 1);

        let old = jobs.find_by_id(&"old".to_string()).await.unwrap().unwrap();
        assert_eq!(old.state, JobState::Superseded);
        assert_eq!(old.finished_at, Some(NOW));
        assert_eq!(jobs.count_by_state("default", JobState::Queued).await.unwrap(), 1);
    }
}
