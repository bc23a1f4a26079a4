// SQLite ConversationRepository Implementation

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use solace_core::domain::{ChatMessage, ChatMode, Role};
use solace_core::error::Result;
use solace_core::port::{ConversationRepository, TimeProvider, UserStats};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct SqliteConversationStore {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteConversationStore {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    role: String,
    content: String,
    timestamp: i64,
}

impl MessageRow {
    fn into_message(self) -> ChatMessage {
        let role = Role::parse(&self.role).unwrap_or_else(|_| {
            warn!(role = %self.role, "Unknown message role in database");
            Role::User
        });
        ChatMessage::new(role, self.content).at(self.timestamp)
    }
}

#[async_trait]
impl ConversationRepository for SqliteConversationStore {
    async fn save_message(&self, user_id: &str, mode: ChatMode, message: &ChatMessage) -> Result<()> {
        let now = self.time_provider.now_millis();
        let timestamp = message.timestamp.unwrap_or(now);

        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        sqlx::query(
            "INSERT INTO conversations (user_id, mode, role, content, timestamp) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(mode.as_str())
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(timestamp)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        sqlx::query(
            r#"
            INSERT INTO user_sessions (user_id, created_at, last_active, message_count)
            VALUES (?, ?, ?, 1)
            ON CONFLICT(user_id) DO UPDATE SET
                last_active = excluded.last_active,
                message_count = message_count + 1
            "#,
        )
        .bind(user_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn history(&self, user_id: &str, mode: ChatMode, limit: u32) -> Result<Vec<ChatMessage>> {
        let mut rows: Vec<MessageRow> = sqlx::query_as(
            r#"
            SELECT role, content, timestamp FROM conversations
            WHERE user_id = ? AND mode = ?
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(mode.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.reverse();
        Ok(rows.into_iter().map(MessageRow::into_message).collect())
    }

    async fn clear_history(&self, user_id: &str, mode: Option<ChatMode>) -> Result<u64> {
        let result = match mode {
            Some(mode) => {
                sqlx::query("DELETE FROM conversations WHERE user_id = ? AND mode = ?")
                    .bind(user_id)
                    .bind(mode.as_str())
                    .execute(&self.pool)
                    .await
            }
            None => {
                sqlx::query("DELETE FROM conversations WHERE user_id = ?")
                    .bind(user_id)
                    .execute(&self.pool)
                    .await
            }
        }
        .map_err(map_sqlx_error)?;

        debug!(user_id = %user_id, deleted = result.rows_affected(), "History cleared");
        Ok(result.rows_affected())
    }

    async fn user_stats(&self, user_id: &str) -> Result<UserStats> {
        let rows: Vec<(String, i64, i64, i64)> = sqlx::query_as(
            r#"
            SELECT mode, COUNT(*), MIN(timestamp), MAX(timestamp)
            FROM conversations
            WHERE user_id = ?
            GROUP BY mode
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let mut stats = UserStats {
            user_id: user_id.to_string(),
            ..UserStats::default()
        };
        for (mode, count, first, last) in rows {
            let Ok(mode) = ChatMode::parse(&mode) else {
                warn!(mode = %mode, "Unknown chat mode in database");
                continue;
            };
            stats.total_messages += count;
            stats.messages_by_mode.insert(mode, count);
            stats.first_message_at = Some(stats.first_message_at.map_or(first, |f| f.min(first)));
            stats.last_message_at = Some(stats.last_message_at.map_or(last, |l| l.max(last)));
        }
        Ok(stats)
    }

    async fn delete_user(&self, user_id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let deleted = sqlx::query("DELETE FROM conversations WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();

        for sql in [
            "DELETE FROM user_sessions WHERE user_id = ?",
            "DELETE FROM user_topics WHERE user_id = ?",
        ] {
            sqlx::query(sql)
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(deleted > 0)
    }
}
