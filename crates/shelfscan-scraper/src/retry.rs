//! Whole-URL retry with exponential backoff and jitter.
//!
//! Only errors for which [`ScraperError::is_retriable`] holds are retried;
//! anything else is returned on the spot.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use shelfscan_core::ScraperSettings;

use crate::error::ScraperError;

const DEFAULT_MAX_JITTER: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Upper bound of the uniform jitter added to every delay.
    pub max_jitter: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_jitter: DEFAULT_MAX_JITTER,
        }
    }

    /// Retries without sleeping.
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn from_settings(settings: &ScraperSettings) -> Self {
        Self::new(settings.max_retries, settings.retry_delay())
    }

    /// Sleep after failed attempt number `attempt` (zero-based):
    /// `base_delay * 2^attempt` plus jitter in `[0, max_jitter]`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let backoff = self.base_delay.saturating_mul(1u32 << attempt.min(16));
        let jitter = if self.max_jitter.is_zero() {
            Duration::ZERO
        } else {
            let secs = rand::rng().random_range(0.0..=self.max_jitter.as_secs_f64());
            Duration::from_secs_f64(secs)
        };
        backoff.saturating_add(jitter)
    }
}

/// Runs `operation` up to `policy.max_attempts` times.
///
/// Returns the first success. A non-retriable error, or the error from the
/// final attempt, is returned as-is.
///
/// # Errors
///
/// Returns the last [`ScraperError`] produced by `operation`.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_retriable() || attempt + 1 >= max_attempts {
                    return Err(err);
                }
                let delay = policy.delay_for(attempt);
                #[allow(clippy::cast_possible_truncation)]
                let delay_ms = delay.as_millis() as u64;
                tracing::warn!(
                    attempt = attempt + 1,
                    max_attempts,
                    delay_ms,
                    error = %err,
                    "scrape attempt failed, retrying after backoff"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn navigation_error() -> ScraperError {
        ScraperError::Navigation {
            url: "https://www.amazon.com/dp/B09XYZ1234".to_owned(),
            reason: "net::ERR_CONNECTION_RESET".to_owned(),
        }
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(&RetryPolicy::immediate(3), || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, ScraperError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fails_twice_then_succeeds_on_third_attempt() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(&RetryPolicy::immediate(3), || {
            let cc = Arc::clone(&cc);
            async move {
                let n = cc.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(navigation_error())
                } else {
                    Ok::<u32, ScraperError>(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn returns_last_error_after_exhausting_attempts() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(&RetryPolicy::immediate(3), || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ScraperError>(navigation_error())
            }
        })
        .await;
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(ScraperError::Navigation { .. })));
    }

    #[tokio::test]
    async fn does_not_retry_non_retriable_error() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(&RetryPolicy::immediate(3), || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ScraperError>(ScraperError::InvalidUrl {
                    url: "dp/B09XYZ1234".to_owned(),
                    reason: "relative URL without a base".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(ScraperError::InvalidUrl { .. })));
    }

    #[test]
    fn delay_doubles_per_attempt_plus_bounded_jitter() {
        let policy = RetryPolicy::new(3, Duration::from_secs(2));
        for attempt in 0..3 {
            let base = Duration::from_secs(2) * (1 << attempt);
            let delay = policy.delay_for(attempt);
            assert!(delay >= base, "attempt {attempt}: {delay:?}");
            assert!(delay <= base + Duration::from_secs(1), "attempt {attempt}: {delay:?}");
        }
    }

    #[test]
    fn from_settings_reads_attempts_and_base_delay() {
        let policy = RetryPolicy::from_settings(&ScraperSettings::default());
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_secs(2));
    }
}
