//! Retry policy with exponential backoff

use crate::error::GenerationResult;
use std::future::Future;
use std::time::Duration;

/// Retry policy configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first attempt)
    max_attempts: usize,
    initial_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    use_jitter: bool,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
            use_jitter: true,
        }
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_jitter(mut self, use_jitter: bool) -> Self {
        self.use_jitter = use_jitter;
        self
    }

    /// Backoff after the given 1-based failed attempt
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let Some(exponent) = attempt.checked_sub(1) else {
            return Duration::ZERO;
        };
        let exponent = i32::try_from(exponent).unwrap_or(i32::MAX);

        let millis = (self.initial_delay.as_millis() as f64 * self.multiplier.powi(exponent))
            .min(self.max_delay.as_millis() as f64);

        // 80% to 100% of the backoff, fixed per attempt
        let spread = if self.use_jitter {
            1.0 - (attempt % 5) as f64 * 0.05
        } else {
            1.0
        };

        Duration::from_millis((millis * spread).round() as u64)
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable
    /// error, or the attempts are used up
    pub async fn run<F, Fut, T>(&self, label: &str, mut operation: F) -> GenerationResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = GenerationResult<T>>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.delay_for_attempt(attempt);
                    log::warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        label,
                        attempt,
                        self.max_attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn server_error(status: u16, message: &str) -> GenerationError {
        GenerationError::Api {
            status,
            message: message.to_string(),
        }
    }

    fn fast_policy(attempts: usize) -> RetryPolicy {
        RetryPolicy::new(attempts)
            .with_initial_delay(Duration::from_millis(1))
            .with_jitter(false)
    }

    #[test]
    fn test_zero_attempts_means_one() {
        assert_eq!(RetryPolicy::new(0).max_attempts(), 1);
    }

    #[test]
    fn test_exponential_backoff() {
        let policy = RetryPolicy::new(4)
            .with_initial_delay(Duration::from_millis(100))
            .with_multiplier(2.0)
            .with_jitter(false);

        assert_eq!(policy.delay_for_attempt(0), Duration::ZERO);
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(400));
    }

    #[test]
    fn test_jitter_stays_within_spread() {
        let policy = RetryPolicy::new(6).with_initial_delay(Duration::from_millis(1_000));

        for attempt in 1..=6 {
            let plain = RetryPolicy::new(6)
                .with_initial_delay(Duration::from_millis(1_000))
                .with_jitter(false)
                .delay_for_attempt(attempt);
            let jittered = policy.delay_for_attempt(attempt);
            assert!(jittered <= plain);
            assert!(jittered >= plain.mul_f64(0.79));
        }
    }

    #[test]
    fn test_max_delay_capping() {
        let policy = RetryPolicy::new(10)
            .with_initial_delay(Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(5))
            .with_jitter(false);

        assert_eq!(policy.delay_for_attempt(10), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_retries_server_errors_until_success() {
        let calls = AtomicUsize::new(0);

        let result = fast_policy(3)
            .run("story", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(server_error(503, "busy"))
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.ok(), Some(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicUsize::new(0);

        let result: GenerationResult<()> = fast_policy(2)
            .run("speech", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(server_error(500, "down"))
            })
            .await;

        assert!(matches!(result, Err(GenerationError::Api { status: 500, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let calls = AtomicUsize::new(0);

        let result: GenerationResult<()> = fast_policy(5)
            .run("cover", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(server_error(400, "bad prompt"))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
