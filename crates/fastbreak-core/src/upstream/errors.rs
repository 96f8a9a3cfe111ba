//! Error taxonomy for upstream access.
//!
//! Internally the transport layer distinguishes several failure shapes
//! ([`UpstreamError`]); across the façade boundary only two conditions
//! exist ([`StatsError`]): the provider confirmed the resource does not
//! exist, or the provider could not be reached within the retry budget.
//! Everything else (malformed payloads, timeouts, HTTP errors) folds into
//! the latter after logging.

use thiserror::Error;

/// Errors from a single call to the statistics provider.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum UpstreamError {
    /// Request exceeded the configured timeout duration.
    #[error("Request timeout")]
    Timeout,

    /// Failed to establish a connection to the provider.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Non-2xx HTTP status. First field is the status code.
    #[error("HTTP error {0}: {1}")]
    HttpError(u16, String),

    /// Network-level error from the underlying HTTP client.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response could not be parsed into the provider's envelope.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl UpstreamError {
    /// Classifies a [`reqwest::Error`] into this taxonomy, sanitizing the
    /// message so connection details are not disclosed downstream.
    #[must_use]
    pub fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::ConnectionFailed("connection refused or unreachable".to_string())
        } else {
            Self::Network(error)
        }
    }

    /// Returns `true` if retrying this error may help.
    ///
    /// Used only for log classification: the retry loop retries every
    /// failure because the provider intermittently answers transient
    /// conditions with permanent-looking statuses.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::ConnectionFailed(_) | Self::Network(_) => true,
            Self::HttpError(status, _) => (500..=599).contains(status) || *status == 429,
            Self::InvalidResponse(_) => false,
        }
    }
}

/// The only failure conditions that cross the data access façade.
#[derive(Error, Debug)]
pub enum StatsError {
    /// The provider confirmed the resource does not exist (empty result
    /// set). Definitive, not retried, never cached.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// The provider could not be reached within the retry budget. Callers
    /// should treat this as retryable at a higher layer.
    #[error("upstream unavailable after {attempts} attempts: {source}")]
    Unavailable {
        attempts: u32,
        #[source]
        source: UpstreamError,
    },
}

impl StatsError {
    /// Returns `true` for the not-found condition.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
