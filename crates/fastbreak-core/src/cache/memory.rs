//! In-process fallback cache backend.

use dashmap::DashMap;
use serde_json::Value;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{debug, trace};

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: Value,
    expires_at: Instant,
}

/// In-process key/value cache with per-entry TTLs.
///
/// Used when the shared Redis store is disabled or unreachable at startup.
/// Expiry is enforced lazily on every read; an optional background task
/// additionally sweeps expired entries so an idle process does not retain
/// dead data indefinitely.
pub struct MemoryCache {
    entries: Arc<DashMap<String, MemoryEntry>>,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self { entries: Arc::new(DashMap::new()) }
    }

    /// Returns the value for `key`, or `None` if absent or expired.
    ///
    /// An expired entry is removed on the way out (lazy expiry).
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        self.entries.remove_if(key, |_, entry| now >= entry.expires_at);
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Writes `value` under `key` with the given TTL, replacing any
    /// previous entry and resetting its expiry.
    pub fn set(&self, key: &str, value: Value, ttl: Duration) {
        trace!(key, ttl_secs = ttl.as_secs(), "memory cache set");
        self.entries
            .insert(key.to_string(), MemoryEntry { value, expires_at: Instant::now() + ttl });
    }

    /// Removes `key`; returns `true` if an entry was present.
    pub fn delete(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Removes every key containing `needle` as a substring; returns the
    /// number of entries removed.
    pub fn delete_matching(&self, needle: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.contains(needle));
        before - self.entries.len()
    }

    /// Removes all expired entries; returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| now < entry.expires_at);
        before - self.entries.len()
    }

    /// Number of live entries (expired entries not yet purged count).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Spawns a background task sweeping expired entries every `interval`.
    pub fn start_cleanup_task(&self, interval: Duration) {
        let entries = self.entries.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);

            loop {
                ticker.tick().await;

                let now = Instant::now();
                let before = entries.len();
                entries.retain(|_, entry| now < entry.expires_at);
                let removed = before - entries.len();
                if removed > 0 {
                    debug!(removed, "memory cache sweep");
                }
            }
        });
    }
}
