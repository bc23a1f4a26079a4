// Beat - periodic enqueueing of background tasks
//
// Each entry gets its own interval loop. Entries use a fixed subject key, so
// a tick that lands while the previous run is still queued supersedes it.

use crate::application::tasks::{TaskService, BACKGROUND_PRIORITY};
use crate::application::worker::ShutdownToken;
use crate::domain::{LanguagePayload, TaskKind};
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

#[derive(Debug, Clone)]
pub struct BeatEntry {
    pub kind: TaskKind,
    pub every: Duration,
    pub subject_key: String,
    pub payload: serde_json::Value,
}

impl BeatEntry {
    pub fn new(kind: TaskKind, every: Duration) -> Self {
        Self {
            kind,
            every,
            subject_key: format!("beat:{}", kind.as_str().to_lowercase()),
            payload: serde_json::json!({}),
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Tick intervals in seconds
#[derive(Debug, Clone)]
pub struct BeatConfig {
    pub daily_content_secs: u64,
    pub all_topics_content_secs: u64,
    pub popular_topics_secs: u64,
    pub cleanup_secs: u64,
}

impl Default for BeatConfig {
    fn default() -> Self {
        Self {
            daily_content_secs: 1_800,
            all_topics_content_secs: 3_600,
            popular_topics_secs: 900,
            cleanup_secs: 86_400,
        }
    }
}

impl BeatConfig {
    pub fn entries(&self) -> Vec<BeatEntry> {
        let payload = serde_json::to_value(LanguagePayload::default())
            .unwrap_or_else(|_| serde_json::json!({}));
        vec![
            BeatEntry::new(
                TaskKind::GenerateDailyContent,
                Duration::from_secs(self.daily_content_secs),
            )
            .with_payload(payload.clone()),
            BeatEntry::new(
                TaskKind::GenerateAllTopicsContent,
                Duration::from_secs(self.all_topics_content_secs),
            )
            .with_payload(payload),
            BeatEntry::new(
                TaskKind::UpdatePopularTopics,
                Duration::from_secs(self.popular_topics_secs),
            ),
            BeatEntry::new(
                TaskKind::CleanupOldContent,
                Duration::from_secs(self.cleanup_secs),
            ),
        ]
    }
}

pub struct Beat {
    tasks: Arc<TaskService>,
    entries: Vec<BeatEntry>,
}

impl Beat {
    pub fn new(tasks: Arc<TaskService>, entries: Vec<BeatEntry>) -> Self {
        Self { tasks, entries }
    }

    /// Enqueue one entry now
    pub async fn fire(tasks: &TaskService, entry: &BeatEntry) -> Result<String> {
        tasks
            .submit(
                entry.kind,
                entry.subject_key.clone(),
                &entry.payload,
                BACKGROUND_PRIORITY,
                None,
            )
            .await
    }

    /// Spawn one loop per entry. The first tick of each loop waits a full interval.
    pub fn spawn(self, shutdown: ShutdownToken) -> Vec<JoinHandle<()>> {
        self.entries
            .into_iter()
            .map(|entry| {
                let tasks = Arc::clone(&self.tasks);
                let mut shutdown = shutdown.clone();
                tokio::spawn(async move {
                    info!(
                        task = %entry.kind,
                        every_secs = entry.every.as_secs(),
                        "Beat entry scheduled"
                    );
                    let mut tick = interval(entry.every);
                    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    // interval fires immediately, skip that tick
                    tick.tick().await;

                    loop {
                        tokio::select! {
                            _ = tick.tick() => {
                                match Self::fire(&tasks, &entry).await {
                                    Ok(job_id) => info!(task = %entry.kind, job_id = %job_id, "Beat enqueued task"),
                                    Err(e) => error!(task = %entry.kind, error = %e, "Beat failed to enqueue task"),
                                }
                            }
                            _ = shutdown.wait() => break,
                        }
                    }
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule() {
        let entries = BeatConfig::default().entries();
        let schedule: Vec<(TaskKind, u64)> = entries
            .iter()
            .map(|e| (e.kind, e.every.as_secs()))
            .collect();
        assert_eq!(
            schedule,
            vec![
                (TaskKind::GenerateDailyContent, 1_800),
                (TaskKind::GenerateAllTopicsContent, 3_600),
                (TaskKind::UpdatePopularTopics, 900),
                (TaskKind::CleanupOldContent, 86_400),
            ]
        );
        assert_eq!(entries[2].subject_key, "beat:update_popular_topics");
    }
}
