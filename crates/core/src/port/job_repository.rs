// Job Repository Port (Interface)

use crate::domain::{Job, JobId, JobState};
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface for Job persistence
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Insert a new job
    async fn insert(&self, job: &Job) -> Result<()>;

    /// Find job by ID
    async fn find_by_id(&self, id: &JobId) -> Result<Option<Job>>;

    /// Update job
    async fn update(&self, job: &Job) -> Result<()>;

    /// Pop next due job from queue (priority, then FIFO), atomically marking it RUNNING
    async fn pop_next(&self, queue: &str) -> Result<Option<Job>>;

    /// Get latest generation for subject_key
    async fn get_latest_generation(&self, subject_key: &str) -> Result<i64>;

    /// Mark queued jobs below `below_generation` as superseded
    async fn mark_superseded(&self, subject_key: &str, below_generation: i64) -> Result<u64>;

    /// Count jobs by state
    async fn count_by_state(&self, queue: &str, state: JobState) -> Result<i64>;

    /// Find all jobs by state (used by recovery)
    async fn find_by_state(&self, state: JobState) -> Result<Vec<Job>>;

    /// Cancel a job that has not reached a terminal state.
    ///
    /// Returns false when the job is already finished.
    async fn cancel(&self, id: &JobId, now_millis: i64) -> Result<bool>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::port::transaction::{JobRepositoryTransaction, Transaction, TransactionalJobRepository};
    use crate::port::TimeProvider;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// In-memory job table with the same pop and supersede rules as the SQL store
    pub struct InMemoryJobs {
        jobs: Arc<Mutex<HashMap<JobId, Job>>>,
        time_provider: Arc<dyn TimeProvider>,
    }

    impl InMemoryJobs {
        pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
            Self {
                jobs: Arc::new(Mutex::new(HashMap::new())),
                time_provider,
            }
        }

        /// All jobs, oldest first
        pub fn all(&self) -> Vec<Job> {
            let mut jobs: Vec<Job> = self.jobs.lock().unwrap().values().cloned().collect();
            jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            jobs
        }

        /// Jobs of one type, oldest first
        pub fn of_type(&self, job_type: &str) -> Vec<Job> {
            self.all()
                .into_iter()
                .filter(|j| j.job_type.as_str() == job_type)
                .collect()
        }
    }

    fn latest_generation(jobs: &HashMap<JobId, Job>, subject_key: &str) -> i64 {
        jobs.values()
            .filter(|j| j.subject_key == subject_key)
            .map(|j| j.generation)
            .max()
            .unwrap_or(0)
    }

    fn supersede(jobs: &mut HashMap<JobId, Job>, subject_key: &str, below: i64, now: i64) -> u64 {
        let mut count = 0;
        for job in jobs.values_mut() {
            if job.subject_key == subject_key && job.generation < below && job.state == JobState::Queued {
                job.supersede(now);
                count += 1;
            }
        }
        count
    }

    #[async_trait]
    impl JobRepository for InMemoryJobs {
        async fn insert(&self, job: &Job) -> Result<()> {
            self.jobs.lock().unwrap().insert(job.id.clone(), job.clone());
            Ok(())
        }

        async fn find_by_id(&self, id: &JobId) -> Result<Option<Job>> {
            Ok(self.jobs.lock().unwrap().get(id).cloned())
        }

        async fn update(&self, job: &Job) -> Result<()> {
            self.jobs.lock().unwrap().insert(job.id.clone(), job.clone());
            Ok(())
        }

        async fn pop_next(&self, queue: &str) -> Result<Option<Job>> {
            let now = self.time_provider.now_millis();
            let mut jobs = self.jobs.lock().unwrap();
            let next = jobs
                .values()
                .filter(|j| j.queue == queue && j.state == JobState::Queued)
                .filter(|j| j.schedule_at.map_or(true, |at| at <= now))
                .filter(|j| j.generation == latest_generation(&jobs, &j.subject_key))
                .max_by(|a, b| {
                    a.priority
                        .cmp(&b.priority)
                        .then(b.created_at.cmp(&a.created_at))
                        .then(b.id.cmp(&a.id))
                })
                .map(|j| j.id.clone());

            Ok(next.and_then(|id| {
                let job = jobs.get_mut(&id)?;
                job.state = JobState::Running;
                job.started_at = Some(now);
                Some(job.clone())
            }))
        }

        async fn get_latest_generation(&self, subject_key: &str) -> Result<i64> {
            Ok(latest_generation(&self.jobs.lock().unwrap(), subject_key))
        }

        async fn mark_superseded(&self, subject_key: &str, below_generation: i64) -> Result<u64> {
            let now = self.time_provider.now_millis();
            Ok(supersede(&mut self.jobs.lock().unwrap(), subject_key, below_generation, now))
        }

        async fn count_by_state(&self, queue: &str, state: JobState) -> Result<i64> {
            Ok(self
                .jobs
                .lock()
                .unwrap()
                .values()
                .filter(|j| j.queue == queue && j.state == state)
                .count() as i64)
        }

        async fn find_by_state(&self, state: JobState) -> Result<Vec<Job>> {
            Ok(self.all().into_iter().filter(|j| j.state == state).collect())
        }

        async fn cancel(&self, id: &JobId, now_millis: i64) -> Result<bool> {
            let mut jobs = self.jobs.lock().unwrap();
            match jobs.get_mut(id) {
                Some(job) if !job.state.is_terminal() => {
                    job.state = JobState::Cancelled;
                    job.finished_at = Some(now_millis);
                    Ok(true)
                }
                _ => Ok(false),
            }
        }
    }

    /// Writes are applied to the shared table on commit
    struct InMemoryTx {
        jobs: Arc<Mutex<HashMap<JobId, Job>>>,
        inserts: Vec<Job>,
        supersedes: Vec<(String, i64)>,
        now: i64,
    }

    #[async_trait]
    impl Transaction for InMemoryTx {
        async fn commit(self: Box<Self>) -> Result<()> {
            let tx = *self;
            let mut jobs = tx.jobs.lock().unwrap();
            for job in tx.inserts {
                jobs.insert(job.id.clone(), job);
            }
            for (subject_key, below) in &tx.supersedes {
                supersede(&mut jobs, subject_key, *below, tx.now);
            }
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl JobRepositoryTransaction for InMemoryTx {
        async fn get_latest_generation(&mut self, subject_key: &str) -> Result<i64> {
            let committed = latest_generation(&self.jobs.lock().unwrap(), subject_key);
            let pending = self
                .inserts
                .iter()
                .filter(|j| j.subject_key == subject_key)
                .map(|j| j.generation)
                .max()
                .unwrap_or(0);
            Ok(committed.max(pending))
        }

        async fn insert(&mut self, job: &Job) -> Result<()> {
            self.inserts.push(job.clone());
            Ok(())
        }

        async fn mark_superseded(&mut self, subject_key: &str, below_generation: i64) -> Result<u64> {
            self.supersedes.push((subject_key.to_string(), below_generation));
            Ok(0)
        }
    }

    #[async_trait]
    impl TransactionalJobRepository for InMemoryJobs {
        async fn begin_transaction(&self) -> Result<Box<dyn JobRepositoryTransaction>> {
            Ok(Box::new(InMemoryTx {
                jobs: self.jobs.clone(),
                inserts: Vec::new(),
                supersedes: Vec::new(),
                now: self.time_provider.now_millis(),
            }))
        }
    }
}
