//! Governed, retried access to the upstream statistics provider.
//!
//! Every outbound call flows through two layers:
//!
//! 1. **[`CallGovernor`]** — a process-wide rolling-window budget. `admit`
//!    blocks (never rejects) until issuing one more call would not exceed
//!    `max_calls` in any trailing `period`.
//! 2. **[`RetryingClient`]** — wraps one logical provider operation with
//!    admission-gated execution, bounded retries, and pure exponential
//!    backoff. A retried attempt re-admits through the governor, so a
//!    retry still costs a budget slot.
//!
//! [`StatsClient`] is the raw HTTP client underneath; it knows the
//! provider's endpoints and envelope format and nothing about budgets or
//! retries.

pub mod client;
pub mod errors;
pub mod governor;
pub mod retry;

pub use client::StatsClient;
pub use errors::{StatsError, UpstreamError};
pub use governor::CallGovernor;
pub use retry::RetryingClient;
