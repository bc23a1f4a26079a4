//! Rate Limiter (Token Bucket Algorithm)
//!
//! Guards the methods that call the LLM. Lock-free: the bucket is packed
//! into one atomic word and updated with a CAS loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Fixed-point scale so partial refills are not lost between calls
const MILLI: u64 = 1000;

/// Token bucket with `burst` capacity refilled at `rate_per_sec`
pub struct RateLimiter {
    // Upper 32 bits: milli-tokens, lower 32 bits: ms since `origin` of last refill
    packed: AtomicU64,
    origin: Instant,
    burst: u32,
    rate_per_sec: u32,
}

fn pack(milli_tokens: u64, at_ms: u32) -> u64 {
    (milli_tokens << 32) | at_ms as u64
}

fn unpack(packed: u64) -> (u64, u32) {
    (packed >> 32, (packed & 0xFFFF_FFFF) as u32)
}

impl RateLimiter {
    /// Allow `burst` requests at once, then `rate_per_sec` per second
    pub fn new(burst: u32, rate_per_sec: u32) -> Self {
        Self {
            packed: AtomicU64::new(pack(burst as u64 * MILLI, 0)),
            origin: Instant::now(),
            burst,
            rate_per_sec,
        }
    }

    fn elapsed_ms(&self) -> u32 {
        self.origin.elapsed().as_millis().min(u32::MAX as u128) as u32
    }

    /// Take one token; false when the bucket is empty
    pub fn try_acquire(&self) -> bool {
        let capacity = self.burst as u64 * MILLI;
        loop {
            let current = self.packed.load(Ordering::Acquire);
            let (milli_tokens, last_ms) = unpack(current);
            let now_ms = self.elapsed_ms();
            let delta_ms = now_ms.saturating_sub(last_ms) as u64;

            // rate tokens/s == rate milli-tokens/ms
            let refilled = (milli_tokens + delta_ms * self.rate_per_sec as u64).min(capacity);

            let (next, allowed) = if refilled >= MILLI {
                (pack(refilled - MILLI, now_ms), true)
            } else {
                (pack(refilled, now_ms), false)
            };

            if self
                .packed
                .compare_exchange(current, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return allowed;
            }
        }
    }

    /// Whole tokens currently available (before refill)
    pub fn available(&self) -> u32 {
        let (milli_tokens, _) = unpack(self.packed.load(Ordering::Acquire));
        (milli_tokens / MILLI) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::time::{sleep, Duration};

    #[test]
    fn test_allows_burst_then_denies() {
        let limiter = RateLimiter::new(10, 0);

        for _ in 0..10 {
            assert!(limiter.try_acquire());
        }
        assert!(!limiter.try_acquire());
        assert_eq!(limiter.available(), 0);
    }

    #[tokio::test]
    async fn test_refills_over_time() {
        let limiter = RateLimiter::new(5, 10);

        for _ in 0..5 {
            assert!(limiter.try_acquire());
        }
        assert!(!limiter.try_acquire());

        sleep(Duration::from_millis(300)).await;
        assert!(limiter.try_acquire());
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_the_bucket() {
        let limiter = Arc::new(RateLimiter::new(100, 0));

        let mut handles = vec![];
        for _ in 0..10 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                (0..20).filter(|_| limiter.try_acquire()).count()
            }));
        }

        let mut total_allowed = 0;
        for handle in handles {
            total_allowed += handle.await.unwrap();
        }
        assert_eq!(total_allowed, 100);
    }
}
