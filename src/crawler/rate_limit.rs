//! Fixed-interval rate limiting
//!
//! The archive API throttles per key, so requests are spaced by a fixed
//! minimum interval rather than counted against a window.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// Spaces successive acquisitions by at least `interval`
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last_acquired: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter with a fixed minimum spacing
    pub fn fixed_interval(interval: Duration) -> Self {
        Self {
            interval,
            last_acquired: Mutex::new(None),
        }
    }

    /// Configured interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until a request may be issued
    ///
    /// The first acquisition returns immediately. Each later one returns no
    /// sooner than `interval` after the previous one returned. Returns the
    /// time spent waiting.
    pub async fn acquire(&self) -> Duration {
        let mut last = self.last_acquired.lock().await;
        let started = Instant::now();

        if let Some(previous) = *last {
            let ready_at = previous + self.interval;
            if ready_at > started {
                debug!(wait_ms = (ready_at - started).as_millis() as u64, "Waiting for rate limit");
                sleep_until(ready_at).await;
            }
        }

        let now = Instant::now();
        *last = Some(now);

        let waited = now - started;
        crate::metrics::record_rate_limit_wait(waited);
        waited
    }
}
