//! Per-client inbound rate limiter.
//!
//! The simpler sibling of the outbound
//! [`CallGovernor`](crate::upstream::CallGovernor): same sliding-window
//! bookkeeping, but per client key and non-blocking — an over-budget
//! request is rejected immediately (the HTTP layer answers 429) instead
//! of being delayed.

use dashmap::DashMap;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

/// Sliding-window rate limiter keyed by client identifier.
///
/// **Security**: limits maximum tracked clients to prevent OOM from
/// spoofed identifiers.
pub struct ClientRateLimiter {
    windows: Arc<DashMap<String, Vec<Instant>>>,
    max_calls: usize,
    period: Duration,
    max_clients: usize,
}

impl ClientRateLimiter {
    const DEFAULT_MAX_CLIENTS: usize = 100_000;

    #[must_use]
    pub fn new(max_calls: usize, period: Duration) -> Self {
        Self::with_max_clients(max_calls, period, Self::DEFAULT_MAX_CLIENTS)
    }

    #[must_use]
    pub fn with_max_clients(max_calls: usize, period: Duration, max_clients: usize) -> Self {
        Self { windows: Arc::new(DashMap::new()), max_calls, period, max_clients }
    }

    /// Checks and records one call for `key`. Returns `false` when the
    /// client is over budget or the tracker is at capacity.
    #[must_use]
    pub fn check_rate_limit(&self, key: &str) -> bool {
        let now = Instant::now();

        if let Some(mut window) = self.windows.get_mut(key) {
            window.retain(|t| now.duration_since(*t) < self.period);
            if window.len() >= self.max_calls {
                return false;
            }
            window.push(now);
            return true;
        }

        if self.windows.len() >= self.max_clients {
            return false;
        }
        if self.max_calls == 0 {
            return false;
        }

        self.windows.entry(key.to_string()).or_default().push(now);
        true
    }

    /// Drops client windows with no calls inside the current period;
    /// returns the number removed.
    pub fn cleanup_idle_clients(&self) -> usize {
        let now = Instant::now();
        let before = self.windows.len();

        self.windows
            .retain(|_, window| window.iter().any(|t| now.duration_since(*t) < self.period));

        before - self.windows.len()
    }

    /// Number of currently tracked clients.
    #[must_use]
    pub fn client_count(&self) -> usize {
        self.windows.len()
    }

    /// Spawns a background task evicting idle clients every `interval`.
    pub fn start_cleanup_task(&self, interval: Duration) {
        let windows = self.windows.clone();
        let period = self.period;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);

            loop {
                ticker.tick().await;

                let now = Instant::now();
                windows.retain(|_, window| {
                    window.iter().any(|t| now.duration_since(*t) < period)
                });
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_rate_limiter_basic() {
        let limiter = ClientRateLimiter::new(2, Duration::from_secs(60));

        assert!(limiter.check_rate_limit("client"));
        assert!(limiter.check_rate_limit("client"));
        assert!(!limiter.check_rate_limit("client"));
    }

    #[tokio::test]
    async fn test_window_slides() {
        let limiter = ClientRateLimiter::new(1, Duration::from_millis(80));

        assert!(limiter.check_rate_limit("client"));
        assert!(!limiter.check_rate_limit("client"));

        sleep(Duration::from_millis(120)).await;

        assert!(limiter.check_rate_limit("client"));
    }

    #[tokio::test]
    async fn test_clients_are_independent() {
        let limiter = ClientRateLimiter::new(1, Duration::from_secs(60));

        assert!(limiter.check_rate_limit("a"));
        assert!(limiter.check_rate_limit("b"));
        assert!(!limiter.check_rate_limit("a"));
        assert!(!limiter.check_rate_limit("b"));
    }

    #[tokio::test]
    async fn test_zero_budget_rejects_everything() {
        let limiter = ClientRateLimiter::new(0, Duration::from_secs(60));
        assert!(!limiter.check_rate_limit("client"));
    }

    #[tokio::test]
    async fn test_new_clients_rejected_at_capacity() {
        let limiter = ClientRateLimiter::with_max_clients(5, Duration::from_secs(60), 2);

        assert!(limiter.check_rate_limit("a"));
        assert!(limiter.check_rate_limit("b"));
        assert!(!limiter.check_rate_limit("c"));
        // existing clients keep working
        assert!(limiter.check_rate_limit("a"));
    }

    #[tokio::test]
    async fn test_cleanup_drops_idle_clients() {
        let limiter = ClientRateLimiter::new(5, Duration::from_millis(50));

        let _ = limiter.check_rate_limit("a");
        let _ = limiter.check_rate_limit("b");
        assert_eq!(limiter.client_count(), 2);

        sleep(Duration::from_millis(90)).await;

        assert_eq!(limiter.cleanup_idle_clients(), 2);
        assert_eq!(limiter.client_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_access_never_exceeds_budget() {
        let limiter = Arc::new(ClientRateLimiter::new(10, Duration::from_secs(60)));

        let mut handles = vec![];
        for _ in 0..5 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                let mut allowed = 0;
                for _ in 0..4 {
                    if limiter.check_rate_limit("shared") {
                        allowed += 1;
                    }
                }
                allowed
            }));
        }

        let mut total = 0;
        for handle in handles {
            total += handle.await.unwrap();
        }

        assert!(total <= 10);
    }
}
