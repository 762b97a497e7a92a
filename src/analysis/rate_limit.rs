//! Minimum-spacing rate limiter for AI requests.
//!
//! Callers sharing a limiter are serialized: the lock is held while waiting
//! out the remainder of the interval, so two requests can never be accepted
//! closer together than `min_interval`.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Default spacing between Gemini requests (free tier allows two per minute).
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(35);

#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_accepted: Mutex<Option<Instant>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_accepted: Mutex::new(None),
        }
    }

    /// Limiter that never waits.
    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until a request may be sent and record it as accepted.
    ///
    /// Returns the instant the request was accepted.
    pub async fn acquire(&self) -> Instant {
        let mut last = self.last_accepted.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!("Rate limiting: waiting {:?} before next request", wait);
                tokio::time::sleep(wait).await;
            }
        }
        let now = Instant::now();
        *last = Some(now);
        now
    }

    /// Record an externally imposed wait (e.g. a server retry delay) as the
    /// latest accepted request.
    pub async fn stamp(&self) {
        *self.last_accepted.lock().await = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_first_acquire_does_not_wait() {
        let limiter = RateLimiter::new(Duration::from_secs(60));
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_concurrent_acquires_are_spaced() {
        let interval = Duration::from_millis(40);
        let limiter = Arc::new(RateLimiter::new(interval));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.acquire().await })
            })
            .collect();

        let mut accepted = Vec::new();
        for handle in handles {
            accepted.push(handle.await.unwrap());
        }
        accepted.sort();

        for pair in accepted.windows(2) {
            assert!(pair[1] - pair[0] >= interval, "{:?}", pair[1] - pair[0]);
        }
    }

    #[tokio::test]
    async fn test_stamp_pushes_next_acquire_out() {
        let interval = Duration::from_millis(50);
        let limiter = RateLimiter::new(interval);
        let before = Instant::now();
        limiter.stamp().await;
        let accepted = limiter.acquire().await;
        assert!(accepted - before >= interval);
    }

    #[tokio::test]
    async fn test_unlimited_never_waits() {
        let limiter = RateLimiter::unlimited();
        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(200));
    }
}
