// Key-Value Cache Port
//
// String values with a per-entry time-to-live. Structured values go through
// the JSON helpers below.

use crate::error::Result;
use crate::port::TimeProvider;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::warn;

#[async_trait]
pub trait Cache: Send + Sync {
    /// Get a live entry (expired entries read as missing)
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` for `ttl_secs` seconds, replacing any previous entry
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()>;

    /// Remove an entry, returns whether it existed
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Drop expired entries, returns how many were removed
    async fn purge_expired(&self) -> Result<u64>;

    /// Number of live entries
    async fn entry_count(&self) -> Result<u64>;
}

/// Read and decode a JSON entry.
///
/// Entries that no longer decode are treated as a miss.
pub async fn get_json<T: DeserializeOwned>(cache: &dyn Cache, key: &str) -> Result<Option<T>> {
    let Some(raw) = cache.get(key).await? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(key = %key, error = %e, "Discarding undecodable cache entry");
            Ok(None)
        }
    }
}

/// Encode and store a JSON entry
pub async fn set_json<T: Serialize + ?Sized>(
    cache: &dyn Cache,
    key: &str,
    value: &T,
    ttl_secs: u64,
) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    cache.set(key, &raw, ttl_secs).await
}

/// Process-local cache, used in tests and when no persistent store is wanted
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, (String, i64)>>,
    time_provider: Arc<dyn TimeProvider>,
}

impl InMemoryCache {
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            time_provider,
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, (String, i64)>>> {
        self.entries
            .lock()
            .map_err(|_| crate::error::AppError::Internal("cache lock poisoned".to_string()))
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = self.time_provider.now_millis();
        let entries = self.lock()?;
        Ok(entries
            .get(key)
            .filter(|(_, expires_at)| *expires_at > now)
            .map(|(value, _)| value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        let expires_at = self.time_provider.now_millis() + (ttl_secs as i64) * 1000;
        self.lock()?
            .insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.lock()?.remove(key).is_some())
    }

    async fn purge_expired(&self) -> Result<u64> {
        let now = self.time_provider.now_millis();
        let mut entries = self.lock()?;
        let before = entries.len();
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        Ok((before - entries.len()) as u64)
    }

    async fn entry_count(&self) -> Result<u64> {
        let now = self.time_provider.now_millis();
        Ok(self
            .lock()?
            .values()
            .filter(|(_, expires_at)| *expires_at > now)
            .count() as u64)
    }
}
