//! Inbound request middleware components.

pub mod rate_limiting;

pub use rate_limiting::ClientRateLimiter;
