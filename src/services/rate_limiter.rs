use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::{sleep, Duration, Instant};
use parking_lot::Mutex;

/// Rate limiter to control FMP request frequency
///
/// A dashboard render fans out to a dozen endpoints, more with peers, so the
/// free-tier quota is easy to burn through without spacing requests.
#[derive(Debug)]
pub struct RateLimiter {
    /// Semaphore to limit concurrent requests
    semaphore: Arc<Semaphore>,
    /// Last request timestamp to enforce minimum delay between requests
    last_request: Arc<Mutex<Instant>>,
    /// Minimum delay between requests
    min_delay: Duration,
}

impl RateLimiter {
    /// Create a new rate limiter
    ///
    /// # Arguments
    /// * `max_concurrent` - Maximum number of in-flight requests
    /// * `requests_per_minute` - Maximum requests per minute
    pub fn new(max_concurrent: usize, requests_per_minute: u32) -> Self {
        let min_delay_ms = 60_000 / requests_per_minute.max(1) as u64;
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            last_request: Arc::new(Mutex::new(
                Instant::now()
                    .checked_sub(Duration::from_secs(60))
                    .unwrap_or_else(Instant::now),
            )),
            min_delay: Duration::from_millis(min_delay_ms),
        }
    }

    /// Wait for a concurrency permit and for the minimum spacing since the
    /// previous request. The permit is released when the guard drops.
    pub async fn acquire(&self) -> RateLimitGuard {
        // The semaphore is never closed, so an error here cannot happen
        let permit = self.semaphore.clone().acquire_owned().await.ok();

        // Reserve our slot while holding the lock so concurrent callers
        // queue up behind each other instead of all sleeping the same amount
        let wait_time = {
            let mut last = self.last_request.lock();
            let now = Instant::now();
            let next_slot = (*last + self.min_delay).max(now);
            *last = next_slot;
            next_slot - now
        };

        if !wait_time.is_zero() {
            sleep(wait_time).await;
        }

        RateLimitGuard { _permit: permit }
    }

    /// Free concurrency slots (for monitoring)
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

/// Guard that holds a rate limit permit
#[derive(Debug)]
pub struct RateLimitGuard {
    _permit: Option<tokio::sync::OwnedSemaphorePermit>,
}
