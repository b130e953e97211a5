use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::{sleep, Duration, Instant};
use parking_lot::Mutex;

/// Rate limiter bounding provider request frequency.
///
/// Free tiers of the market-data providers allow single-digit requests per
/// minute; this enforces both a concurrency cap and a minimum delay between
/// consecutive requests.
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    last_request: Arc<Mutex<Instant>>,
    min_delay: Duration,
}

impl RateLimiter {
    pub fn new(max_concurrent: usize, requests_per_minute: u32) -> Self {
        let min_delay_ms = 60_000 / requests_per_minute as u64;
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            last_request: Arc::new(Mutex::new(Instant::now() - Duration::from_secs(60))),
            min_delay: Duration::from_millis(min_delay_ms),
        }
    }

    /// Block until both a concurrency permit and the inter-request delay
    /// allow another call. The permit is released when the guard drops.
    pub async fn acquire(&self) -> RateLimitGuard {
        let permit = self.semaphore.clone().acquire_owned().await.unwrap();

        let wait_time = {
            let last = self.last_request.lock();
            let elapsed = last.elapsed();

            if elapsed < self.min_delay {
                Some(self.min_delay - elapsed)
            } else {
                None
            }
        }; // lock dropped here; sleep outside it

        if let Some(delay) = wait_time {
            sleep(delay).await;
        }

        *self.last_request.lock() = Instant::now();

        RateLimitGuard { _permit: permit }
    }
}

pub struct RateLimitGuard {
    _permit: tokio::sync::OwnedSemaphorePermit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant as StdInstant;

    #[tokio::test]
    async fn test_rate_limiter_enforces_delay() {
        // 2 concurrent, 60 per minute (1 per second)
        let limiter = RateLimiter::new(2, 60);

        let start = StdInstant::now();

        let _guard1 = limiter.acquire().await;
        let elapsed1 = start.elapsed();
        assert!(elapsed1.as_millis() < 100, "First request should be immediate");
        drop(_guard1);

        let _guard2 = limiter.acquire().await;
        let elapsed2 = start.elapsed();
        assert!(elapsed2.as_millis() >= 900, "Second request should wait ~1 second");
    }

    #[tokio::test]
    async fn test_concurrent_limit() {
        let limiter = Arc::new(RateLimiter::new(2, 120)); // 120/min = 500ms delay

        let limiter1 = limiter.clone();
        let limiter2 = limiter.clone();
        let limiter3 = limiter.clone();

        let handle1 = tokio::spawn(async move {
            let _guard = limiter1.acquire().await;
            sleep(Duration::from_millis(100)).await;
        });

        let handle2 = tokio::spawn(async move {
            let _guard = limiter2.acquire().await;
            sleep(Duration::from_millis(100)).await;
        });

        let handle3 = tokio::spawn(async move {
            let _guard = limiter3.acquire().await;
            sleep(Duration::from_millis(100)).await;
        });

        // All complete; the third waits for the first two.
        tokio::try_join!(handle1, handle2, handle3).unwrap();
    }
}
