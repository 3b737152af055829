use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Backoff policy for store reads.
///
/// Writes are never retried: a failed write is recovered by reloading the
/// collection, not by sending the same request again.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first one)
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Preset: collection and language reads.
    /// Delays: 300ms, 600ms
    pub fn store_read(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::from_millis(300)).with_max_delay(Duration::from_secs(2))
    }

    /// Preset: a single attempt, no retries.
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Delay before a given attempt (0-indexed)
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let factor = self.backoff_multiplier.powi(attempt as i32 - 1);
        let delay_ms = (self.initial_delay.as_millis() as f64 * factor) as u64;
        Duration::from_millis(delay_ms).min(self.max_delay)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::store_read(3)
    }
}

/// Run an async operation, retrying failures the predicate accepts.
///
/// Returns the first success, the first non-retryable error, or the last
/// error once all attempts are used.
pub async fn with_retry_if<T, E, F, Fut, P>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        let delay = config.delay_for_attempt(attempt);
        if !delay.is_zero() {
            debug!("{}: waiting {:?} before attempt {}/{}", operation_name, delay, attempt + 1, attempts);
            sleep(delay).await;
        }

        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!("{}: recovered on attempt {}/{}", operation_name, attempt + 1, attempts);
                }
                return Ok(result);
            }
            Err(e) => {
                if !should_retry(&e) {
                    debug!("{}: permanent failure: {}", operation_name, e);
                    return Err(e);
                }

                attempt += 1;
                if attempt >= attempts {
                    warn!("{}: giving up after {} attempts: {}", operation_name, attempts, e);
                    return Err(e);
                }

                warn!("{}: attempt {}/{} failed: {}", operation_name, attempt, attempts, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn unavailable() -> StoreError {
        StoreError::Api {
            status: 503,
            code: None,
            message: "unavailable".to_string(),
        }
    }

    fn quick(attempts: u32) -> RetryConfig {
        RetryConfig::new(attempts, Duration::from_millis(1))
    }

    #[test]
    fn test_store_read_preset() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.initial_delay, Duration::from_millis(300));
        assert_eq!(config.max_delay, Duration::from_secs(2));
        assert_eq!(RetryConfig::once().max_attempts, 1);
        assert_eq!(RetryConfig::new(0, Duration::ZERO).max_attempts, 1);
    }

    #[test]
    fn test_backoff_doubles_until_capped() {
        let config = RetryConfig::store_read(5);
        let delays: Vec<Duration> = (0..5).map(|a| config.delay_for_attempt(a)).collect();
        assert_eq!(
            delays,
            vec![
                Duration::ZERO,
                Duration::from_millis(300),
                Duration::from_millis(600),
                Duration::from_millis(1200),
                Duration::from_secs(2),
            ]
        );

        let flat = RetryConfig::new(4, Duration::from_millis(100)).with_backoff_multiplier(1.0);
        assert_eq!(flat.delay_for_attempt(3), Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_transient_read_recovers() {
        let calls = &AtomicU32::new(0);
        let result = with_retry_if(
            &quick(3),
            "List sliders",
            move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(unavailable())
                } else {
                    Ok(vec!["1", "2"])
                }
            },
            StoreError::is_transient,
        )
        .await;

        assert_eq!(result.unwrap(), vec!["1", "2"]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exhausted_attempts_return_last_error() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), StoreError> = with_retry_if(
            &quick(3),
            "List languages",
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(unavailable())
            },
            StoreError::is_transient,
        )
        .await;

        assert!(matches!(result, Err(StoreError::Api { status: 503, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_conflict_is_not_retried() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), StoreError> = with_retry_if(
            &quick(5),
            "Patch slider 3",
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(StoreError::Conflict("slider 3".to_string()))
            },
            StoreError::is_transient,
        )
        .await;

        assert!(result.unwrap_err().is_conflict());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
