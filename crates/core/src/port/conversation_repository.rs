// Conversation Repository Port

use crate::domain::{ChatMessage, ChatMode};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-user conversation statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub user_id: String,
    pub total_messages: i64,
    pub messages_by_mode: BTreeMap<ChatMode, i64>,
    pub first_message_at: Option<i64>,
    pub last_message_at: Option<i64>,
}

impl UserStats {
    /// Mode with the most messages (ties resolve to the first mode in order)
    pub fn most_used_mode(&self) -> ChatMode {
        let mut best = ChatMode::default();
        let mut best_count = 0;
        for (mode, count) in &self.messages_by_mode {
            if *count > best_count {
                best = *mode;
                best_count = *count;
            }
        }
        best
    }
}

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Append a message and touch the user's session row
    async fn save_message(&self, user_id: &str, mode: ChatMode, message: &ChatMessage) -> Result<()>;

    /// Most recent `limit` messages for (user, mode), oldest first
    async fn history(&self, user_id: &str, mode: ChatMode, limit: u32) -> Result<Vec<ChatMessage>>;

    /// Delete messages for one mode, or all modes when `mode` is None
    async fn clear_history(&self, user_id: &str, mode: Option<ChatMode>) -> Result<u64>;

    async fn user_stats(&self, user_id: &str) -> Result<UserStats>;

    /// Remove conversations, sessions and the stored topic.
    ///
    /// Returns false when the user has no conversation rows.
    async fn delete_user(&self, user_id: &str) -> Result<bool>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// In-memory conversation log
    #[derive(Default)]
    pub struct InMemoryConversations {
        messages: Mutex<Vec<(String, ChatMode, ChatMessage)>>,
    }

    #[async_trait]
    impl ConversationRepository for InMemoryConversations {
        async fn save_message(&self, user_id: &str, mode: ChatMode, message: &ChatMessage) -> Result<()> {
            self.messages
                .lock()
                .unwrap()
                .push((user_id.to_string(), mode, message.clone()));
            Ok(())
        }

        async fn history(&self, user_id: &str, mode: ChatMode, limit: u32) -> Result<Vec<ChatMessage>> {
            let messages = self.messages.lock().unwrap();
            let matching: Vec<ChatMessage> = messages
                .iter()
                .filter(|(u, m, _)| u == user_id && *m == mode)
                .map(|(_, _, msg)| msg.clone())
                .collect();
            let skip = matching.len().saturating_sub(limit as usize);
            Ok(matching.into_iter().skip(skip).collect())
        }

        async fn clear_history(&self, user_id: &str, mode: Option<ChatMode>) -> Result<u64> {
            let mut messages = self.messages.lock().unwrap();
            let before = messages.len();
            messages.retain(|(u, m, _)| !(u == user_id && mode.map_or(true, |wanted| wanted == *m)));
            Ok((before - messages.len()) as u64)
        }

        async fn user_stats(&self, user_id: &str) -> Result<UserStats> {
            let messages = self.messages.lock().unwrap();
            let mut stats = UserStats {
                user_id: user_id.to_string(),
                ..UserStats::default()
            };
            for (_, mode, msg) in messages.iter().filter(|(u, _, _)| u == user_id) {
                stats.total_messages += 1;
                *stats.messages_by_mode.entry(*mode).or_insert(0) += 1;
                if let Some(ts) = msg.timestamp {
                    stats.first_message_at = Some(stats.first_message_at.map_or(ts, |f| f.min(ts)));
                    stats.last_message_at = Some(stats.last_message_at.map_or(ts, |l| l.max(ts)));
                }
            }
            Ok(stats)
        }

        async fn delete_user(&self, user_id: &str) -> Result<bool> {
            Ok(self.clear_history(user_id, None).await? > 0)
        }
    }
}
