// Topic Repository Port

use crate::domain::{ChatMode, TopicStat};
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait TopicRepository: Send + Sync {
    /// Bump the frequency of each topic for the mode, creating rows as needed
    async fn record_mentions(&self, topics: &[String], mode: ChatMode) -> Result<()>;

    /// Most frequent topics, optionally restricted to one mode
    async fn popular(&self, mode: Option<ChatMode>, limit: u32) -> Result<Vec<TopicStat>>;

    /// Distinct topics across modes, most recently mentioned first
    async fn all(&self, limit: u32) -> Result<Vec<String>>;

    /// Store (or clear with None) the user's current topic
    async fn set_user_topic(&self, user_id: &str, topic: Option<&str>) -> Result<()>;

    async fn user_topic(&self, user_id: &str) -> Result<Option<String>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory topic store; mention order stands in for time
    #[derive(Default)]
    pub struct InMemoryTopics {
        // (topic, mode) -> (frequency, last_mentioned)
        stats: Mutex<HashMap<(String, ChatMode), (i64, i64)>>,
        user_topics: Mutex<HashMap<String, String>>,
        clock: Mutex<i64>,
    }

    #[async_trait]
    impl TopicRepository for InMemoryTopics {
        async fn record_mentions(&self, topics: &[String], mode: ChatMode) -> Result<()> {
            let mut clock = self.clock.lock().unwrap();
            let mut stats = self.stats.lock().unwrap();
            for topic in topics {
                *clock += 1;
                let entry = stats.entry((topic.clone(), mode)).or_insert((0, 0));
                entry.0 += 1;
                entry.1 = *clock;
            }
            Ok(())
        }

        async fn popular(&self, mode: Option<ChatMode>, limit: u32) -> Result<Vec<TopicStat>> {
            let stats = self.stats.lock().unwrap();
            let mut rows: Vec<TopicStat> = stats
                .iter()
                .filter(|((_, m), _)| mode.map_or(true, |wanted| wanted == *m))
                .map(|((topic, m), (frequency, last))| TopicStat {
                    topic: topic.clone(),
                    frequency: *frequency,
                    last_mentioned: *last,
                    mode: Some(*m),
                })
                .collect();
            rows.sort_by(|a, b| {
                b.frequency
                    .cmp(&a.frequency)
                    .then(b.last_mentioned.cmp(&a.last_mentioned))
            });
            rows.truncate(limit as usize);
            Ok(rows)
        }

        async fn all(&self, limit: u32) -> Result<Vec<String>> {
            let stats = self.stats.lock().unwrap();
            let mut latest: HashMap<&str, i64> = HashMap::new();
            for ((topic, _), (_, last)) in stats.iter() {
                let slot = latest.entry(topic.as_str()).or_insert(0);
                *slot = (*slot).max(*last);
            }
            let mut rows: Vec<(&str, i64)> = latest.into_iter().collect();
            rows.sort_by(|a, b| b.1.cmp(&a.1));
            Ok(rows
                .into_iter()
                .take(limit as usize)
                .map(|(t, _)| t.to_string())
                .collect())
        }

        async fn set_user_topic(&self, user_id: &str, topic: Option<&str>) -> Result<()> {
            let mut users = self.user_topics.lock().unwrap();
            match topic {
                Some(topic) => users.insert(user_id.to_string(), topic.to_string()),
                None => users.remove(user_id),
            };
            Ok(())
        }

        async fn user_topic(&self, user_id: &str) -> Result<Option<String>> {
            Ok(self.user_topics.lock().unwrap().get(user_id).cloned())
        }
    }
}
