//! Bounded retry with governor admission and exponential backoff.

use crate::upstream::{errors::StatsError, governor::CallGovernor, UpstreamError};
use std::{future::Future, sync::Arc, time::Duration};
use tracing::{debug, warn};

/// Executes one logical provider operation under the shared call budget
/// with bounded retries.
///
/// Each attempt re-admits through the [`CallGovernor`] (a retry still
/// costs a budget slot). Failures back off `base * 2^attempt` before the
/// next attempt; there is no delay before the first attempt and no jitter,
/// admission already serializes bursts. After `max_retries` failed
/// attempts the last error is wrapped in
/// [`StatsError::Unavailable`] together with the attempt count.
#[derive(Clone)]
pub struct RetryingClient {
    governor: Arc<CallGovernor>,
    max_retries: u32,
    backoff_base: Duration,
}

impl RetryingClient {
    #[must_use]
    pub fn new(governor: Arc<CallGovernor>, max_retries: u32, backoff_base: Duration) -> Self {
        // a zero budget would never attempt anything
        Self { governor, max_retries: max_retries.max(1), backoff_base }
    }

    /// Runs `op` until it succeeds or the attempt budget is exhausted.
    ///
    /// `op` is a factory producing one fresh call per attempt. The caller's
    /// task suspends during admission waits, backoff sleeps, and the call
    /// itself; no locks are held across any of those points.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::Unavailable`] wrapping the last failure once
    /// all attempts are spent.
    pub async fn execute<T, F, Fut>(&self, op_name: &'static str, op: F) -> Result<T, StatsError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        let mut attempt: u32 = 0;

        loop {
            self.governor.admit().await;

            match op().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(op = op_name, attempt = attempt + 1, "upstream call recovered");
                    }
                    return Ok(value);
                }
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.max_retries {
                        warn!(
                            op = op_name,
                            attempts = attempt,
                            error = %e,
                            "upstream call failed, retries exhausted"
                        );
                        return Err(StatsError::Unavailable { attempts: attempt, source: e });
                    }

                    let delay = self.backoff_base * 2u32.pow(attempt - 1);
                    warn!(
                        op = op_name,
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        transient = e.is_transient(),
                        error = %e,
                        "upstream call failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
