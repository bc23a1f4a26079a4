// Atomic enqueue: generation bump, insert and supersede in one unit

use crate::domain::Job;
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait Transaction: Send {
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Dropping without commit also rolls back
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Job store that can open an enqueue transaction
#[async_trait]
pub trait TransactionalJobRepository: Send + Sync {
    async fn begin_transaction(&self) -> Result<Box<dyn JobRepositoryTransaction>>;
}

/// Steps of one enqueue. Two submissions for the same subject must never
/// observe the same latest generation.
#[async_trait]
pub trait JobRepositoryTransaction: Transaction {
    /// Highest generation handed out for the subject so far (0 if none)
    async fn get_latest_generation(&mut self, subject_key: &str) -> Result<i64>;

    /// Store the job and record its generation as the subject's latest
    async fn insert(&mut self, job: &Job) -> Result<()>;

    /// Queued jobs of the subject below `below_generation` become SUPERSEDED
    async fn mark_superseded(&mut self, subject_key: &str, below_generation: i64) -> Result<u64>;
}
