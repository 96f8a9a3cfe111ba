//! Application configuration with layered loading.
//!
//! Configuration is loaded in this order (later overrides earlier):
//!
//! 1. **Compiled defaults**: hardcoded in the builder below
//! 2. **Config file**: TOML file specified by `FASTBREAK_CONFIG` env var
//!    (default `config/config.toml`, missing file is fine)
//! 3. **Environment variables**: `FASTBREAK_*` vars override single fields
//!    (e.g. `FASTBREAK_CACHE__REDIS_URL`)
//!
//! # Example
//!
//! ```toml
//! [server]
//! bind_address = "0.0.0.0"
//! bind_port = 8000
//!
//! [upstream]
//! rate_limit_calls = 30
//! rate_limit_period_seconds = 60
//! max_retries = 3
//!
//! [cache]
//! enabled = true
//! redis_url = "redis://localhost:6379"
//! ```

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

/// HTTP server configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// IP address to bind the server to. Defaults to `127.0.0.1`.
    pub bind_address: String,

    /// Port number to listen on. Defaults to `8000`.
    pub bind_port: u16,

    /// Maximum number of concurrent requests the server accepts. Defaults to `100`.
    pub max_concurrent_requests: usize,

    /// Maximum request body size in bytes. Defaults to `65536`.
    pub max_body_bytes: usize,

    /// Inbound per-client rate limit: allowed calls per window. Defaults to `30`.
    pub client_rate_limit_calls: usize,

    /// Inbound per-client rate limit window in seconds. Defaults to `60`.
    pub client_rate_limit_period_seconds: u64,
}

/// Upstream statistics provider settings, including the outbound call
/// budget enforced by the governor and the retry policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the provider's stats endpoints. Must start with `http`.
    pub base_url: String,

    /// Per-request timeout in seconds. Defaults to `30`.
    pub timeout_seconds: u64,

    /// Maximum outbound calls per rolling window. Defaults to `30`.
    pub rate_limit_calls: usize,

    /// Rolling window length in seconds. Defaults to `60`.
    pub rate_limit_period_seconds: u64,

    /// Maximum attempts per logical call. Defaults to `3`.
    pub max_retries: u32,

    /// Base backoff delay in milliseconds; attempt `n` waits `base * 2^n`.
    /// Defaults to `1000`.
    pub backoff_base_ms: u64,
}

impl UpstreamConfig {
    /// Returns the per-request timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Returns the governor window length as a [`Duration`].
    #[must_use]
    pub fn rate_limit_period(&self) -> Duration {
        Duration::from_secs(self.rate_limit_period_seconds)
    }

    /// Returns the base backoff delay as a [`Duration`].
    #[must_use]
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }
}

/// Cache backend selection and per-resource TTLs.
///
/// TTLs are per resource kind, not per call: callers never choose an
/// expiry, the façade applies the configured one for the resource it is
/// writing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Master switch; when `false` every lookup is a miss and writes are
    /// dropped. Defaults to `true`.
    pub enabled: bool,

    /// Redis connection URL. Defaults to `redis://localhost:6379`.
    pub redis_url: String,

    /// Whether to probe Redis at startup. When `false` (or when the probe
    /// fails) the in-process fallback backend is used for the process
    /// lifetime. Defaults to `true`.
    pub redis_enabled: bool,

    /// TTL for player id lookups, in minutes. Defaults to 24h.
    pub player_id_ttl_minutes: u64,

    /// TTL for team id lookups, in minutes. Defaults to 24h.
    pub team_id_ttl_minutes: u64,

    /// TTL for career record sets, in minutes. Defaults to 1h.
    pub player_career_ttl_minutes: u64,

    /// TTL for shot chart record sets, in minutes. Defaults to 24h.
    pub shot_chart_ttl_minutes: u64,

    /// TTL for league team stats, in minutes. Defaults to 30m.
    pub team_stats_ttl_minutes: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter: `trace`, `debug`, `info`, `warn`, `error`.
    pub level: String,
    /// Output format: `"json"` or `"pretty"`.
    pub format: String,
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Loads configuration from the given TOML file with env overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be parsed or the merged
    /// configuration cannot be deserialized.
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("server.bind_address", "127.0.0.1")?
            .set_default("server.bind_port", 8000)?
            .set_default("server.max_concurrent_requests", 100)?
            .set_default("server.max_body_bytes", 65536)?
            .set_default("server.client_rate_limit_calls", 30)?
            .set_default("server.client_rate_limit_period_seconds", 60)?
            .set_default("upstream.base_url", "https://stats.nba.com/stats")?
            .set_default("upstream.timeout_seconds", 30)?
            .set_default("upstream.rate_limit_calls", 30)?
            .set_default("upstream.rate_limit_period_seconds", 60)?
            .set_default("upstream.max_retries", 3)?
            .set_default("upstream.backoff_base_ms", 1000)?
            .set_default("cache.enabled", true)?
            .set_default("cache.redis_url", "redis://localhost:6379")?
            .set_default("cache.redis_enabled", true)?
            .set_default("cache.player_id_ttl_minutes", 24 * 60)?
            .set_default("cache.team_id_ttl_minutes", 24 * 60)?
            .set_default("cache.player_career_ttl_minutes", 60)?
            .set_default("cache.shot_chart_ttl_minutes", 24 * 60)?
            .set_default("cache.team_stats_ttl_minutes", 30)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name(&config_path.as_ref().to_string_lossy()).required(false))
            .add_source(Environment::with_prefix("FASTBREAK").separator("__"))
            .build()?;

        builder.try_deserialize()
    }

    /// Loads configuration from `config/config.toml` with fallback to
    /// defaults. The path can be overridden with `FASTBREAK_CONFIG`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration cannot be loaded.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("FASTBREAK_CONFIG").unwrap_or_else(|_| "config/config.toml".to_string());
        Self::from_file(&config_path)
    }

    /// Validates the configuration for correctness.
    ///
    /// # Errors
    ///
    /// Returns a descriptive error string if a value is out of range.
    pub fn validate(&self) -> Result<(), String> {
        if !self.upstream.base_url.starts_with("http") {
            return Err(format!("Invalid upstream base URL: {}", self.upstream.base_url));
        }
        if self.upstream.rate_limit_calls == 0 {
            return Err("upstream.rate_limit_calls must be greater than 0".to_string());
        }
        if self.upstream.rate_limit_period_seconds == 0 {
            return Err("upstream.rate_limit_period_seconds must be greater than 0".to_string());
        }
        if self.upstream.max_retries == 0 {
            return Err("upstream.max_retries must be greater than 0".to_string());
        }
        if self.server.max_concurrent_requests == 0 {
            return Err("server.max_concurrent_requests must be greater than 0".to_string());
        }
        if self.logging.format != "json" && self.logging.format != "pretty" {
            return Err(format!("Invalid logging format: {}", self.logging.format));
        }
        Ok(())
    }

    /// Returns the parsed socket address for the HTTP server.
    ///
    /// # Errors
    ///
    /// Returns an error string if the address cannot be parsed.
    pub fn socket_addr(&self) -> Result<std::net::SocketAddr, String> {
        format!("{}:{}", self.server.bind_address, self.server.bind_port).parse().map_err(|_| {
            format!("Invalid socket address: {}:{}", self.server.bind_address, self.server.bind_port)
        })
    }
}
