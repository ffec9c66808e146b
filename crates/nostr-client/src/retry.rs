//! Reusable retry policy.
//!
//! A single policy value describes how an operation is retried (attempt
//! count, exponential delay, cap, jitter). It is applied uniformly at the
//! relay-operation boundary instead of being inlined per call site.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Retry policy with exponential backoff and optional jitter.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first (minimum 1)
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles per subsequent attempt
    pub base_delay: Duration,
    /// Upper bound on the computed delay
    pub max_delay: Duration,
    /// Add up to 50% random jitter to each delay
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// A policy that runs the operation exactly once.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Delay to wait after a failed attempt (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay);
        if !self.jitter {
            return exp;
        }
        let millis = exp.as_millis() as u64;
        if millis == 0 {
            return exp;
        }
        exp + Duration::from_millis(rand::rng().random_range(0..=millis / 2))
    }

    /// Run `op` until it succeeds or the attempt budget is spent, sleeping
    /// between attempts. The last error is returned on exhaustion.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if attempt + 1 >= attempts {
                        return Err(e);
                    }
                    let delay = self.delay_for(attempt);
                    debug!(
                        "attempt {}/{} failed ({}), retrying in {:?}",
                        attempt + 1,
                        attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy_without_jitter() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(40),
            jitter: false,
        }
    }

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = policy_without_jitter();
        assert_eq!(policy.delay_for(0), Duration::from_millis(10));
        assert_eq!(policy.delay_for(1), Duration::from_millis(20));
        assert_eq!(policy.delay_for(2), Duration::from_millis(40));
        // capped at max_delay from here on
        assert_eq!(policy.delay_for(3), Duration::from_millis(40));
        assert_eq!(policy.delay_for(10), Duration::from_millis(40));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let policy = RetryPolicy {
            jitter: true,
            ..policy_without_jitter()
        };
        for _ in 0..50 {
            let delay = policy.delay_for(1);
            assert!(delay >= Duration::from_millis(20));
            assert!(delay <= Duration::from_millis(30));
        }
    }

    #[tokio::test]
    async fn test_run_returns_first_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = policy_without_jitter()
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(42) }
            })
            .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_retries_until_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = policy_without_jitter()
            .run(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err("transient".to_string())
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_run_exhausts_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = policy_without_jitter()
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("always".to_string()) }
            })
            .await;
        assert_eq!(result.unwrap_err(), "always");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_no_retry_runs_once() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = RetryPolicy::no_retry()
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("fail".to_string()) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
