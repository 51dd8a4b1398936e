//! # Flood Protection
//!
//! Enforces a minimum wall-clock gap between consecutive items passing
//! through one [`FloodProtector`].
//!
//! Servers of line protocols disconnect clients that send too fast, so the
//! outbound side of a session can be routed through a protector. The gap is a
//! hard guarantee: for two items passed through the same instance one after
//! the other, the second is released at least `delay` after the first.
//!
//! The last-emission instant is per instance, behind the instance's own lock,
//! so independent connections rate-limit independently.
//!
//! ## Usage
//! ```rust,no_run
//! use linewire::utils::flood::FloodProtector;
//! use std::time::Duration;
//!
//! # async fn demo() {
//! let protector = FloodProtector::new(Duration::from_millis(500));
//! let first = protector.pass("NICK a").await;
//! let second = protector.pass("USER a 0 * :a").await; // at least 500ms later
//! # }
//! ```

use futures::{Stream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::trace;

/// Rate-limiting gate with a fixed minimum delay between emissions
#[derive(Debug)]
pub struct FloodProtector {
    delay: Duration,
    last_emit: Mutex<Instant>,
}

impl FloodProtector {
    /// Create a protector; the clock starts now, so an item passed immediately
    /// waits the full delay
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_emit: Mutex::new(Instant::now()),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Release `item` no sooner than `delay` after the previous release.
    ///
    /// Concurrent callers queue on the lock and are released one at a time.
    /// If the deadline already passed, returns without sleeping.
    pub async fn pass<T>(&self, item: T) -> T {
        let mut last_emit = self.last_emit.lock().await;

        let deadline = last_emit
            .checked_add(self.delay)
            .unwrap_or_else(far_future);

        if Instant::now() < deadline {
            trace!(wait_ms = (deadline - Instant::now()).as_millis() as u64, "Flood delay");
            sleep_until(deadline).await;
        }

        // Actual release time, not `deadline`: the next gap counts from here
        *last_emit = Instant::now();
        item
    }
}

fn far_future() -> Instant {
    Instant::now() + Duration::from_secs(86400 * 365 * 30)
}

/// Route every item of a stream through `protector`, preserving order
pub fn throttle<S>(items: S, protector: Arc<FloodProtector>) -> impl Stream<Item = S::Item>
where
    S: Stream,
{
    items.then(move |item| {
        let protector = Arc::clone(&protector);
        async move { protector.pass(item).await }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_item_waits_from_construction() {
        let start = Instant::now();
        let protector = FloodProtector::new(Duration::from_millis(200));
        protector.pass(()).await;
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_when_deadline_passed() {
        let protector = FloodProtector::new(Duration::from_millis(100));
        tokio::time::sleep(Duration::from_millis(250)).await;

        let before = Instant::now();
        assert_eq!(protector.pass(7).await, 7);
        assert_eq!(before.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_never_sleeps() {
        let protector = FloodProtector::new(Duration::ZERO);
        let before = Instant::now();
        for i in 0..10 {
            assert_eq!(protector.pass(i).await, i);
        }
        assert_eq!(before.elapsed(), Duration::ZERO);
    }
}
