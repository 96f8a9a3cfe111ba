//! Outbound call governor: a process-wide rolling-window call budget.

use parking_lot::Mutex;
use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};
use tracing::trace;

/// Enforces a maximum number of upstream calls per rolling time window,
/// shared across all concurrent requests.
///
/// [`admit`](Self::admit) blocks the calling task until issuing one more
/// call stays within budget, then atomically records the call timestamp.
/// The check-and-reserve step holds a short mutex; the ensuing wait does
/// not, so concurrent callers interleave freely while blocked. Callers are
/// only ever delayed, never rejected. Admission order under contention is
/// not guaranteed to match arrival order.
///
/// One governor exists per process lifetime: constructed at startup,
/// injected by `Arc`, no reset operation.
pub struct CallGovernor {
    window: Mutex<VecDeque<Instant>>,
    max_calls: usize,
    period: Duration,
}

impl CallGovernor {
    #[must_use]
    pub fn new(max_calls: usize, period: Duration) -> Self {
        Self { window: Mutex::new(VecDeque::new()), max_calls, period }
    }

    /// Blocks until a call slot is available, then reserves it.
    ///
    /// The reservation is atomic with respect to concurrent callers: the
    /// recorded call count can never exceed the budget, even transiently.
    /// When the window is full the wait is `period - (now - oldest)`;
    /// a non-positive wait means the slot is immediately available.
    pub async fn admit(&self) {
        loop {
            let wait = {
                let mut window = self.window.lock();
                let now = Instant::now();

                while window
                    .front()
                    .is_some_and(|oldest| now.duration_since(*oldest) >= self.period)
                {
                    window.pop_front();
                }

                if window.len() < self.max_calls {
                    window.push_back(now);
                    None
                } else {
                    window
                        .front()
                        .map(|oldest| self.period.saturating_sub(now.duration_since(*oldest)))
                }
            };

            match wait {
                None => return,
                Some(delay) if delay.is_zero() => continue,
                Some(delay) => {
                    trace!(delay_ms = delay.as_millis() as u64, "call budget exhausted, waiting");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Number of calls currently recorded in the window, after pruning
    /// aged-out timestamps.
    #[must_use]
    pub fn recorded_calls(&self) -> usize {
        let mut window = self.window.lock();
        let now = Instant::now();
        while window.front().is_some_and(|oldest| now.duration_since(*oldest) >= self.period) {
            window.pop_front();
        }
        window.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_admits_immediately_under_budget() {
        let governor = CallGovernor::new(3, Duration::from_secs(60));

        let start = Instant::now();
        governor.admit().await;
        governor.admit().await;
        governor.admit().await;

        assert!(start.elapsed() < Duration::from_millis(50));
        assert_eq!(governor.recorded_calls(), 3);
    }

    #[tokio::test]
    async fn test_third_call_blocks_until_window_passes() {
        // budget 2 per 300ms window; calls at t=0,0,0: first two immediate,
        // third blocks until the oldest timestamp ages out
        let governor = CallGovernor::new(2, Duration::from_millis(300));

        governor.admit().await;
        governor.admit().await;

        let start = Instant::now();
        governor.admit().await;
        let waited = start.elapsed();

        assert!(waited >= Duration::from_millis(250), "waited only {waited:?}");
        assert!(waited < Duration::from_millis(900), "waited {waited:?}");
    }

    #[tokio::test]
    async fn test_slot_frees_after_window() {
        let governor = CallGovernor::new(1, Duration::from_millis(100));
        governor.admit().await;

        tokio::time::sleep(Duration::from_millis(150)).await;

        let start = Instant::now();
        governor.admit().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_window_never_exceeded_under_contention() {
        let max_calls = 4;
        let period = Duration::from_millis(200);
        let governor = Arc::new(CallGovernor::new(max_calls, period));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let governor = governor.clone();
            handles.push(tokio::spawn(async move {
                governor.admit().await;
                Instant::now()
            }));
        }

        let mut admitted = Vec::new();
        for handle in handles {
            admitted.push(handle.await.expect("task should not panic"));
        }
        admitted.sort();

        // every trailing window must contain at most max_calls admissions
        for (i, later) in admitted.iter().enumerate() {
            let in_window = admitted[..=i]
                .iter()
                .filter(|earlier| later.duration_since(**earlier) < period)
                .count();
            assert!(
                in_window <= max_calls,
                "{in_window} admissions inside one window of {period:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_recorded_calls_prunes_aged_entries() {
        let governor = CallGovernor::new(5, Duration::from_millis(80));
        governor.admit().await;
        governor.admit().await;
        assert_eq!(governor.recorded_calls(), 2);

        tokio::time::sleep(Duration::from_millis(120)).await;

        assert_eq!(governor.recorded_calls(), 0);
    }
}
