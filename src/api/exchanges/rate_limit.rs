use std::time::{Duration, Instant};

use parking_lot::Mutex;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use tokio::time::sleep;

/* Rate limiting and retry policy of a price API client. It is owned by the client that uses it and
injected at construction, nothing here is process-wide.

CoinGecko's public API answers 429 when called too often, optionally with a Retry-After header (in seconds):
see https://docs.coingecko.com/reference/common-errors-rate-limit
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub min_interval: Duration, // Minimum delay between two requests
    pub max_retries: u32,
    pub backoff_base: Duration, // Wait before the first retry, doubled on each following one
    pub max_backoff: Duration,
}

impl RateLimitPolicy {
    pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(1500);
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(2);
    pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(60);

    /* Wait before retry number `attempt` (starting at 0). A Retry-After given by the server wins over the exponential backoff. */
    pub fn backoff(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let wait = retry_after.unwrap_or_else(|| {
            self.backoff_base
                .saturating_mul(2_u32.saturating_pow(attempt))
        });
        wait.min(self.max_backoff)
    }

    pub fn can_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            min_interval: Self::DEFAULT_MIN_INTERVAL,
            max_retries: Self::DEFAULT_MAX_RETRIES,
            backoff_base: Self::DEFAULT_BACKOFF_BASE,
            max_backoff: Self::DEFAULT_MAX_BACKOFF,
        }
    }
}

/* Spaces requests out by at least `min_interval`. Slots are booked under the lock and the wait happens
outside of it, so concurrent callers queue up instead of firing together. */
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(None),
        }
    }

    /* Book the next free slot and return how long to wait for it */
    pub fn reserve(&self) -> Duration {
        let now = Instant::now();
        let mut next_slot = self.next_slot.lock();
        let start = match *next_slot {
            Some(slot) if slot > now => slot,
            _ => now,
        };
        *next_slot = Some(start + self.min_interval);
        start - now
    }

    pub async fn wait_turn(&self) {
        let wait = self.reserve();
        if !wait.is_zero() {
            sleep(wait).await;
        }
    }
}

pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let seconds: f64 = headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse().ok()?;
    if seconds.is_finite() && seconds >= 0.0 {
        Some(Duration::from_secs_f64(seconds))
    } else {
        None
    }
}
