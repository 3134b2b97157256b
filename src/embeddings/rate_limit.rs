// Request pacing and retry for remote embedding APIs.
//
// RateLimiter spaces request starts at least 1/rps apart across every
// concurrent task sharing it. with_retry re-runs an operation with
// exponential backoff and jitter when the error is transient (HTTP 429,
// 5xx, timeouts, dropped connections); anything else is returned at once.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::warn;

/// Minimum-interval rate limiter shared by cloning.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<LimiterState>>,
}

struct LimiterState {
    interval: Duration,
    next_slot: Option<Instant>,
}

impl RateLimiter {
    /// Allow at most `requests_per_second` request starts per second.
    /// A non-positive rate disables pacing.
    pub fn new(requests_per_second: f64) -> Self {
        let interval = if requests_per_second > 0.0 {
            Duration::from_secs_f64(1.0 / requests_per_second)
        } else {
            Duration::ZERO
        };
        Self {
            inner: Arc::new(Mutex::new(LimiterState {
                interval,
                next_slot: None,
            })),
        }
    }

    /// Wait until this caller's slot comes up.
    ///
    /// Slots are reserved under the lock and slept on outside it, so waiting
    /// callers queue up one interval apart instead of all waking together.
    pub async fn acquire(&self) {
        let wait_until = {
            let mut state = self.inner.lock().await;
            let now = Instant::now();
            let slot = match state.next_slot {
                Some(next) if next > now => next,
                _ => now,
            };
            state.next_slot = Some(slot + state.interval);
            slot
        };

        if wait_until > Instant::now() {
            tokio::time::sleep_until(wait_until).await;
        }
    }
}

/// HTTP status error from a remote API, kept typed so retry logic can
/// inspect it instead of matching on message text.
#[derive(Debug)]
pub struct ApiStatusError {
    pub status: reqwest::StatusCode,
    pub body: String,
}

impl std::fmt::Display for ApiStatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "API returned {}: {}", self.status, self.body)
    }
}

impl std::error::Error for ApiStatusError {}

/// Backoff settings for [`with_retry`].
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub base_backoff: Duration,
    /// Upper bound on a single backoff delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 4,
            base_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

/// Whether an error is worth retrying.
pub fn is_transient_error(err: &anyhow::Error) -> bool {
    for cause in err.chain() {
        if let Some(api) = cause.downcast_ref::<ApiStatusError>() {
            return api.status == reqwest::StatusCode::TOO_MANY_REQUESTS
                || api.status.is_server_error();
        }
        if let Some(http) = cause.downcast_ref::<reqwest::Error>() {
            return http.is_timeout() || http.is_connect();
        }
    }
    false
}

/// Run `operation`, pacing each attempt through `limiter` and retrying
/// transient failures according to `policy`.
pub async fn with_retry<F, Fut, T>(
    limiter: &RateLimiter,
    policy: RetryPolicy,
    operation: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt = 0u32;

    loop {
        limiter.acquire().await;

        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= policy.max_retries || !is_transient_error(&err) {
                    return Err(err);
                }
                attempt += 1;

                let backoff = policy
                    .base_backoff
                    .saturating_mul(1u32 << (attempt - 1).min(16))
                    .min(policy.max_backoff);

                // ±25% jitter from the clock's sub-second nanos.
                let nanos = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .subsec_nanos();
                let jitter = 0.75 + (nanos % 500) as f64 / 1000.0;
                let delay = Duration::from_secs_f64(backoff.as_secs_f64() * jitter);

                warn!(
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient API error, retrying"
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
        }
    }

    fn status_error(code: u16) -> anyhow::Error {
        anyhow::Error::new(ApiStatusError {
            status: reqwest::StatusCode::from_u16(code).unwrap(),
            body: String::new(),
        })
    }

    #[tokio::test]
    async fn test_first_acquire_is_immediate() {
        let limiter = RateLimiter::new(1.0);
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_second_acquire_waits_for_interval() {
        let limiter = RateLimiter::new(4.0); // 250ms apart
        limiter.acquire().await;
        let start = Instant::now();
        limiter.acquire().await;
        assert!(
            start.elapsed() >= Duration::from_millis(200),
            "expected ~250ms delay, got {:?}",
            start.elapsed()
        );
    }

    #[tokio::test]
    async fn test_zero_rate_disables_pacing() {
        let limiter = RateLimiter::new(0.0);
        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn test_transient_classification() {
        assert!(is_transient_error(&status_error(429)));
        assert!(is_transient_error(&status_error(503)));
        assert!(!is_transient_error(&status_error(400)));
        assert!(!is_transient_error(&status_error(401)));
        assert!(!is_transient_error(&anyhow::anyhow!("bad response shape")));
    }

    #[test]
    fn test_transient_found_through_context() {
        let err = status_error(429).context("Failed to embed chunk");
        assert!(is_transient_error(&err));
    }

    #[tokio::test]
    async fn test_retry_recovers_after_transient_errors() {
        let limiter = RateLimiter::new(0.0);
        let calls = AtomicU32::new(0);
        let result = with_retry(&limiter, fast_policy(3), || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(status_error(429))
            } else {
                Ok(n)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max() {
        let limiter = RateLimiter::new(0.0);
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry(&limiter, fast_policy(2), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(status_error(500))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let limiter = RateLimiter::new(0.0);
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry(&limiter, fast_policy(5), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(status_error(401))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
