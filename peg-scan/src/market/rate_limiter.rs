//! Token bucket rate limiter for market-data requests.
//!
//! One ratio lookup costs two provider calls (search + fundamentals), and a
//! large-cap run touches a few hundred names. The bucket spaces those calls
//! out so the provider does not answer with 429s halfway through a run.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Token scale (tokens are stored in thousandths).
const SCALE: u64 = 1000;

/// A token bucket rate limiter.
///
/// Allows bursts of up to one second's worth of requests, refilled
/// continuously at `requests_per_minute / 60_000` tokens per millisecond.
#[derive(Debug)]
pub struct RateLimiter {
    /// Maximum tokens in the bucket
    capacity: u32,
    /// Current available tokens (scaled)
    tokens: AtomicU64,
    /// Tokens added per millisecond (unscaled)
    refill_rate_per_ms: f64,
    /// Last refill timestamp
    last_refill: Mutex<Instant>,
    /// Name for logging
    name: String,
}

impl RateLimiter {
    /// Create a new rate limiter.
    pub fn new(name: impl Into<String>, requests_per_minute: u32) -> Self {
        let requests_per_minute = requests_per_minute.max(1);
        let capacity = ((requests_per_minute as f64 / 60.0).ceil() as u32).max(1);

        Self {
            capacity,
            tokens: AtomicU64::new(capacity as u64 * SCALE),
            refill_rate_per_ms: requests_per_minute as f64 / 60_000.0,
            last_refill: Mutex::new(Instant::now()),
            name: name.into(),
        }
    }

    /// Acquire a token, waiting if necessary.
    pub async fn acquire(&self) {
        loop {
            if self.try_acquire() {
                return;
            }

            // Time for one full token to refill
            let wait_ms = (1.0 / self.refill_rate_per_ms).ceil() as u64;
            let wait_time = Duration::from_millis(wait_ms.clamp(10, 1000));

            debug!(
                limiter = %self.name,
                wait_ms = wait_time.as_millis() as u64,
                "Rate limited, waiting for token"
            );

            tokio::time::sleep(wait_time).await;
        }
    }

    /// Try to acquire a token without waiting.
    pub fn try_acquire(&self) -> bool {
        self.refill();

        loop {
            let current = self.tokens.load(Ordering::Relaxed);
            if current < SCALE {
                return false;
            }

            if self
                .tokens
                .compare_exchange_weak(current, current - SCALE, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                return true;
            }
        }
    }

    /// Refill tokens based on elapsed time.
    fn refill(&self) {
        let Ok(mut last_refill) = self.last_refill.try_lock() else {
            return;
        };

        let now = Instant::now();
        let elapsed_ms = now.duration_since(*last_refill).as_millis() as f64;
        let new_tokens = (elapsed_ms * self.refill_rate_per_ms * SCALE as f64) as u64;
        if new_tokens == 0 {
            return;
        }

        let max_tokens = self.capacity as u64 * SCALE;
        let _ = self
            .tokens
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some((current + new_tokens).min(max_tokens))
            });

        *last_refill = now;
    }

    /// Get the configured capacity.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }
}

/// Shared rate limiter that can be cloned.
pub type SharedRateLimiter = Arc<RateLimiter>;

/// Create a shared rate limiter.
pub fn shared_limiter(name: impl Into<String>, requests_per_minute: u32) -> SharedRateLimiter {
    Arc::new(RateLimiter::new(name, requests_per_minute))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_is_one_second_of_requests() {
        assert_eq!(RateLimiter::new("test", 120).capacity(), 2);
        assert_eq!(RateLimiter::new("test", 30).capacity(), 1);
        assert_eq!(RateLimiter::new("test", 0).capacity(), 1);
    }

    #[test]
    fn test_try_acquire_exhausts_bucket() {
        let limiter = RateLimiter::new("test", 60);
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[tokio::test]
    async fn test_acquire_waits_for_refill() {
        let limiter = shared_limiter("test", 6000);
        while limiter.try_acquire() {}

        let started = Instant::now();
        limiter.acquire().await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
