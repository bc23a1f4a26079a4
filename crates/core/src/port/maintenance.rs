// DB Maintenance port
use crate::error::Result;
use async_trait::async_trait;

/// Database maintenance statistics
#[derive(Debug, Clone)]
pub struct MaintenanceStats {
    pub db_size_mb: f64,
    pub db_size_bytes: i64,
    pub job_count: i64,
    pub finished_job_count: i64,
    pub conversation_count: i64,
    pub article_count: i64,
    pub quote_count: i64,
    pub cache_entry_count: i64,
    pub fragmentation_percent: f64,
}

/// Maintenance configuration
#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    /// Retention period for finished jobs (days)
    pub finished_job_retention_days: i64,

    /// Maximum DB size before forcing VACUUM (MB)
    pub max_db_size_mb: f64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            finished_job_retention_days: 7,
            max_db_size_mb: 1000.0,
        }
    }
}

/// Summary of a full maintenance pass
#[derive(Debug, Clone)]
pub struct MaintenanceReport {
    pub deleted_jobs: i64,
    pub purged_cache_entries: u64,
    pub vacuum_run: bool,
    pub reclaimed_mb: f64,
    pub stats: MaintenanceStats,
}

/// Database maintenance operations
#[async_trait]
pub trait Maintenance: Send + Sync {
    /// Run VACUUM to reclaim space and optimize DB
    ///
    /// # Returns
    /// Space reclaimed in MB
    async fn vacuum(&self) -> Result<f64>;

    /// Delete finished jobs older than retention period
    ///
    /// # Returns
    /// Number of jobs deleted
    async fn gc_finished_jobs(&self, retention_days: i64) -> Result<i64>;

    /// Delete expired key-value cache rows
    async fn purge_expired_cache(&self) -> Result<u64>;

    /// Get maintenance statistics
    async fn get_stats(&self) -> Result<MaintenanceStats>;

    /// Run full maintenance (GC + VACUUM when the DB is large)
    async fn run_full_maintenance(&self, config: &MaintenanceConfig) -> Result<MaintenanceReport> {
        let stats_before = self.get_stats().await?;

        let deleted_jobs = self
            .gc_finished_jobs(config.finished_job_retention_days)
            .await?;

        let purged_cache_entries = self.purge_expired_cache().await?;

        let vacuum_run = stats_before.db_size_mb > config.max_db_size_mb;
        let reclaimed_mb = if vacuum_run { self.vacuum().await? } else { 0.0 };

        let stats = self.get_stats().await?;

        tracing::info!(
            deleted_jobs = deleted_jobs,
            purged_cache_entries = purged_cache_entries,
            reclaimed_mb = reclaimed_mb,
            db_size_mb = stats.db_size_mb,
            "Maintenance completed"
        );

        Ok(MaintenanceReport {
            deleted_jobs,
            purged_cache_entries,
            vacuum_run,
            reclaimed_mb,
            stats,
        })
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Maintenance that touches nothing and counts full runs
    #[derive(Default)]
    pub struct NoopMaintenance {
        runs: AtomicUsize,
    }

    impl NoopMaintenance {
        pub fn runs(&self) -> usize {
            self.runs.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Maintenance for NoopMaintenance {
        async fn vacuum(&self) -> Result<f64> {
            Ok(0.0)
        }

        async fn gc_finished_jobs(&self, _retention_days: i64) -> Result<i64> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(0)
        }

        async fn purge_expired_cache(&self) -> Result<u64> {
            Ok(0)
        }

        async fn get_stats(&self) -> Result<MaintenanceStats> {
            Ok(MaintenanceStats {
                db_size_mb: 0.0,
                db_size_bytes: 0,
                job_count: 0,
                finished_job_count: 0,
                conversation_count: 0,
                article_count: 0,
                quote_count: 0,
                cache_entry_count: 0,
                fragmentation_percent: 0.0,
            })
        }
    }
}
