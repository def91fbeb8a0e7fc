//! Bounded exponential-backoff retry for async operations.

use std::future::Future;
use std::time::Duration;

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not counting the initial request).
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after each retry.
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(1000),
            backoff_factor: 2.0,
        }
    }
}

impl RetryConfig {
    /// Calculate delay before retry `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let ms = self.initial_delay.as_millis() as f64 * self.backoff_factor.powi(attempt as i32);
        Duration::from_millis(ms as u64)
    }

    /// Sum of every delay when all attempts fail.
    pub fn total_backoff(&self) -> Duration {
        (0..self.max_retries).map(|a| self.delay_for_attempt(a)).sum()
    }
}

/// Run `operation` until it succeeds or the retries are exhausted.
///
/// The operation runs once, then up to `max_retries` more times with an
/// exponentially growing sleep in between. The error of the final attempt is
/// returned unchanged.
pub async fn with_retry<T, E, F, Fut>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < config.max_retries => {
                let delay = config.delay_for_attempt(attempt);
                tracing::debug!(
                    attempt = attempt + 1,
                    max = config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "retrying after error: {}",
                    e
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::warn!(attempts = attempt + 1, "giving up: {}", e);
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tokio::time::Instant;

    #[test]
    fn test_default_config() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.initial_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_delay_for_attempt_doubles() {
        let config = RetryConfig {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            backoff_factor: 2.0,
        };
        assert_eq!(config.delay_for_attempt(0).as_millis(), 100);
        assert_eq!(config.delay_for_attempt(1).as_millis(), 200);
        assert_eq!(config.delay_for_attempt(2).as_millis(), 400);
        assert_eq!(config.total_backoff().as_millis(), 700);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_return_last_error() {
        let config = RetryConfig::default();
        let calls = Cell::new(0u32);
        let started = Instant::now();

        let result: Result<(), String> = with_retry(&config, || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move { Err(format!("HTTP 503 (attempt {n})")) }
        })
        .await;

        assert_eq!(result, Err("HTTP 503 (attempt 4)".to_string()));
        assert_eq!(calls.get(), 4);
        // 1s + 2s + 4s of backoff
        assert_eq!(started.elapsed().as_secs(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_failures() {
        let config = RetryConfig::default();
        let calls = Cell::new(0u32);
        let started = Instant::now();

        let result: Result<&str, String> = with_retry(&config, || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move {
                if n < 3 {
                    Err("connection reset".to_string())
                } else {
                    Ok("tides")
                }
            }
        })
        .await;

        assert_eq!(result, Ok("tides"));
        assert_eq!(calls.get(), 3);
        assert_eq!(started.elapsed().as_secs(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_retries_configured() {
        let config = RetryConfig {
            max_retries: 0,
            ..RetryConfig::default()
        };
        let calls = Cell::new(0u32);

        let result: Result<(), String> = with_retry(&config, || {
            calls.set(calls.get() + 1);
            async { Err("offline".to_string()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }
}
