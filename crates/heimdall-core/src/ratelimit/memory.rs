use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::RateLimitStore;
use crate::error::StoreError;

#[derive(Debug, Clone, Copy)]
struct RateLimitEntry {
    count: u64,
    expires_at: Instant,
}

impl RateLimitEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

/// Single-process counter store.
///
/// Writers take the exclusive lock, readers the shared one. Expired entries
/// are purged at the start of every `increment`; there is no background
/// sweep, so a key that is never touched again lingers until the next write.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, RateLimitEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl RateLimitStore for MemoryStore {
    async fn increment(&self, key: &str, window: Duration) -> Result<u64, StoreError> {
        let mut entries = self.entries.write().await;
        let now = Instant::now();

        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let purged = before - entries.len();
        if purged > 0 {
            tracing::debug!("Purged {purged} expired rate limit entries");
        }

        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| RateLimitEntry {
                count: 0,
                expires_at: now + window,
            });
        entry.count += 1;
        Ok(entry.count)
    }

    async fn get_count(&self, key: &str) -> Result<u64, StoreError> {
        let entries = self.entries.read().await;
        let now = Instant::now();
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map_or(0, |entry| entry.count))
    }
}
