//! Shared Redis cache backend.

use redis::{aio::ConnectionManager, AsyncCommands, RedisError};
use serde_json::Value;
use std::time::Duration;
use tracing::trace;

/// Redis-backed cache using the store's native TTL support.
///
/// Values are stored as JSON strings. The connection manager reconnects
/// on its own after transient drops; individual command failures surface
/// as errors and are downgraded to misses by [`CacheStore`].
///
/// [`CacheStore`]: crate::cache::CacheStore
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connects to Redis and probes reachability with a `PING`.
    ///
    /// # Errors
    ///
    /// Returns the underlying error if the URL is invalid, the connection
    /// cannot be established, or the probe fails.
    pub async fn connect(url: &str) -> Result<Self, RedisError> {
        let client = redis::Client::open(url)?;
        let mut conn = ConnectionManager::new(client).await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(Self { conn })
    }

    /// Returns the decoded value for `key`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns the underlying error on command or decode failure.
    pub async fn get(&self, key: &str) -> Result<Option<Value>, RedisError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(key).await?;
        match raw {
            Some(payload) => {
                let value = serde_json::from_str(&payload).map_err(|e| {
                    RedisError::from((
                        redis::ErrorKind::TypeError,
                        "stored payload is not valid JSON",
                        e.to_string(),
                    ))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Writes `value` under `key` with the given TTL (`SET ... EX`).
    ///
    /// # Errors
    ///
    /// Returns the underlying error on command failure.
    pub async fn set(&self, key: &str, value: &Value, ttl: Duration) -> Result<(), RedisError> {
        let mut conn = self.conn.clone();
        let payload = value.to_string();
        // Redis EX takes whole seconds; round sub-second TTLs up so an
        // entry is never written already expired.
        let seconds = ttl.as_secs().max(1);
        trace!(key, ttl_secs = seconds, "redis cache set");
        let _: () = conn.set_ex(key, payload, seconds).await?;
        Ok(())
    }

    /// Removes `key`; returns `true` if an entry was present.
    ///
    /// # Errors
    ///
    /// Returns the underlying error on command failure.
    pub async fn delete(&self, key: &str) -> Result<bool, RedisError> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    /// Removes every key containing `needle` as a substring; returns the
    /// number removed.
    ///
    /// Keys are listed and filtered client-side so the matched set is
    /// identical to the in-memory backend's substring semantics.
    ///
    /// # Errors
    ///
    /// Returns the underlying error on command failure.
    pub async fn delete_matching(&self, needle: &str) -> Result<usize, RedisError> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn.keys("*").await?;
        let matched: Vec<String> = keys.into_iter().filter(|k| k.contains(needle)).collect();
        if matched.is_empty() {
            return Ok(0);
        }
        let removed: i64 = conn.del(matched).await?;
        Ok(usize::try_from(removed).unwrap_or(0))
    }
}
