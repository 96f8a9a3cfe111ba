//! Backend selection and the degrade-to-miss cache façade.

use crate::cache::{memory::MemoryCache, redis::RedisCache};
use crate::config::CacheConfig;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info, warn};

/// Sweep interval for the in-memory backend's background cleanup.
const MEMORY_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

enum Backend {
    Redis(RedisCache),
    Memory(MemoryCache),
    Disabled,
}

/// Cache store with a backend chosen once at startup.
///
/// If Redis is configured and the startup `PING` probe succeeds, the
/// shared store is used for the process lifetime. Otherwise the process
/// stays on the in-process fallback; there is no runtime re-probing. A
/// failed probe is not fatal, it logs a single warning and downgrades the
/// deployment to local-only caching.
///
/// Every operation swallows backend errors: `get` degrades to a miss,
/// mutations report failure through their return value. Callers can treat
/// the cache as infallible.
pub struct CacheStore {
    backend: Backend,
}

impl CacheStore {
    /// Selects and initializes the backend from configuration.
    pub async fn connect(config: &CacheConfig) -> Self {
        if !config.enabled {
            info!("caching disabled by configuration");
            return Self { backend: Backend::Disabled };
        }

        if config.redis_enabled {
            match RedisCache::connect(&config.redis_url).await {
                Ok(redis) => {
                    info!("redis cache initialized");
                    return Self { backend: Backend::Redis(redis) };
                }
                Err(e) => {
                    warn!(error = %e, "redis connection failed, using in-memory cache");
                }
            }
        }

        let memory = MemoryCache::new();
        memory.start_cleanup_task(MEMORY_SWEEP_INTERVAL);
        Self { backend: Backend::Memory(memory) }
    }

    /// Builds a store on the in-process backend without probing Redis.
    #[must_use]
    pub fn in_memory() -> Self {
        Self { backend: Backend::Memory(MemoryCache::new()) }
    }

    /// Backend name for logs and diagnostics.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Redis(_) => "redis",
            Backend::Memory(_) => "memory",
            Backend::Disabled => "disabled",
        }
    }

    /// Returns the value for `key`, or `None` if absent, expired, or the
    /// backend failed (failures are logged, never propagated).
    pub async fn get(&self, key: &str) -> Option<Value> {
        match &self.backend {
            Backend::Redis(redis) => match redis.get(key).await {
                Ok(value) => value,
                Err(e) => {
                    error!(key, error = %e, "cache get failed");
                    None
                }
            },
            Backend::Memory(memory) => memory.get(key),
            Backend::Disabled => None,
        }
    }

    /// Writes `key` with the given TTL; returns `false` if the write did
    /// not happen (backend error or caching disabled).
    pub async fn set(&self, key: &str, value: &Value, ttl: Duration) -> bool {
        match &self.backend {
            Backend::Redis(redis) => match redis.set(key, value, ttl).await {
                Ok(()) => true,
                Err(e) => {
                    error!(key, error = %e, "cache set failed");
                    false
                }
            },
            Backend::Memory(memory) => {
                memory.set(key, value.clone(), ttl);
                true
            }
            Backend::Disabled => false,
        }
    }

    /// Removes `key`; returns `true` if an entry was present and removed.
    pub async fn delete(&self, key: &str) -> bool {
        match &self.backend {
            Backend::Redis(redis) => match redis.delete(key).await {
                Ok(removed) => removed,
                Err(e) => {
                    error!(key, error = %e, "cache delete failed");
                    false
                }
            },
            Backend::Memory(memory) => memory.delete(key),
            Backend::Disabled => false,
        }
    }

    /// Removes every key containing `needle` as a substring; returns the
    /// number removed. Both backends match the identical key set.
    pub async fn delete_matching(&self, needle: &str) -> usize {
        match &self.backend {
            Backend::Redis(redis) => match redis.delete_matching(needle).await {
                Ok(count) => count,
                Err(e) => {
                    error!(pattern = needle, error = %e, "cache pattern delete failed");
                    0
                }
            },
            Backend::Memory(memory) => memory.delete_matching(needle),
            Backend::Disabled => 0,
        }
    }
}
