//! Bounded retry with exponential backoff.
//!
//! One policy is applied uniformly to every tool invocation and every
//! reasoning call. The policy itself is plain configuration, safe to share
//! across concurrent sessions; the driver function reports every attempt to
//! an observer so callers can append one audit record per attempt (retries
//! are new records, never edits).

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Implemented by error types that carry a retryable/non-retryable
/// classification.
pub trait Retryable {
    /// Whether a later attempt may succeed.
    fn is_retryable(&self) -> bool;
}

/// Retry and timeout configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Attempt ceiling, counting the first try.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the second attempt, milliseconds.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Multiplier applied to the delay after each failed attempt.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    /// Upper bound on a single backoff delay, milliseconds.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Per-invocation timeout, seconds. Expiry counts as a retryable
    /// Timeout-kind failure.
    #[serde(default = "default_invocation_timeout_secs")]
    pub invocation_timeout_secs: u64,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_backoff_ms() -> u64 {
    200
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_max_backoff_ms() -> u64 {
    10_000
}

fn default_invocation_timeout_secs() -> u64 {
    30
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            max_backoff_ms: default_max_backoff_ms(),
            invocation_timeout_secs: default_invocation_timeout_secs(),
        }
    }
}

impl RetryPolicy {
    /// The delay to sleep after the given failed attempt (1-based),
    /// exponential and capped at `max_backoff_ms`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31) as i32;
        let factor = self.backoff_multiplier.max(1.0).powi(exponent);
        let ms = (self.initial_backoff_ms as f64 * factor) as u64;
        Duration::from_millis(ms.min(self.max_backoff_ms))
    }

    /// The per-invocation timeout as a [`Duration`].
    pub fn invocation_timeout(&self) -> Duration {
        Duration::from_secs(self.invocation_timeout_secs)
    }
}

/// One attempt as reported to the observer callback.
#[derive(Debug)]
pub struct Attempt<'a, T, E> {
    /// 1-based attempt number.
    pub number: u32,
    /// When the attempt started.
    pub started_at: DateTime<Utc>,
    /// When the attempt finished.
    pub finished_at: DateTime<Utc>,
    /// Borrowed view of the attempt outcome.
    pub outcome: Result<&'a T, &'a E>,
}

/// Drive `op` until it succeeds, fails non-retryably, or hits the attempt
/// ceiling, sleeping the policy's backoff between retryable failures.
///
/// `observe` is called exactly once per attempt, after it completes, with
/// timestamps and a borrowed outcome; callers use it to record audit entries.
/// The final error is returned to the caller unchanged.
pub async fn run_retrying<T, E, F, Fut, O>(
    policy: &RetryPolicy,
    mut op: F,
    mut observe: O,
) -> Result<T, E>
where
    E: Retryable,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    O: FnMut(Attempt<'_, T, E>),
{
    let ceiling = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        let started_at = Utc::now();
        let result = op(attempt).await;
        let finished_at = Utc::now();

        observe(Attempt {
            number: attempt,
            started_at,
            finished_at,
            outcome: result.as_ref(),
        });

        match result {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_retryable() || attempt >= ceiling {
                    return Err(err);
                }
                tokio::time::sleep(policy.backoff(attempt)).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, PartialEq)]
    struct TestError {
        retryable: bool,
    }

    impl Retryable for TestError {
        fn is_retryable(&self) -> bool {
            self.retryable
        }
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff_ms: 10,
            backoff_multiplier: 2.0,
            max_backoff_ms: 100,
            invocation_timeout_secs: 1,
        }
    }

    #[test]
    fn backoff_grows_exponentially_and_caps() {
        let p = policy(5);
        assert_eq!(p.backoff(1), Duration::from_millis(10));
        assert_eq!(p.backoff(2), Duration::from_millis(20));
        assert_eq!(p.backoff(3), Duration::from_millis(40));
        assert_eq!(p.backoff(10), Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success_within_ceiling() {
        let calls = AtomicU32::new(0);
        let mut observed = Vec::new();
        let result = run_retrying(
            &policy(5),
            |_| {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 4 {
                        Err(TestError { retryable: true })
                    } else {
                        Ok(n)
                    }
                }
            },
            |attempt| observed.push((attempt.number, attempt.outcome.is_ok())),
        )
        .await;

        assert_eq!(result, Ok(4));
        assert_eq!(
            observed,
            vec![(1, false), (2, false), (3, false), (4, true)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_error_stops_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), TestError> = run_retrying(
            &policy(5),
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError { retryable: false }) }
            },
            |_| {},
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_ceiling_is_never_exceeded() {
        let calls = AtomicU32::new(0);
        let result: Result<(), TestError> = run_retrying(
            &policy(3),
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError { retryable: true }) }
            },
            |_| {},
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn observer_sees_timestamps_in_order() {
        let mut stamps = Vec::new();
        let _ = run_retrying(
            &policy(2),
            |n| async move {
                if n == 1 {
                    Err(TestError { retryable: true })
                } else {
                    Ok(())
                }
            },
            |attempt| stamps.push((attempt.started_at, attempt.finished_at)),
        )
        .await;

        assert_eq!(stamps.len(), 2);
        assert!(stamps[0].0 <= stamps[0].1);
        assert!(stamps[0].1 <= stamps[1].0);
    }
}
