//! # Retry Policy
//!
//! Each step of the backchannel sequence is retried on its own when the
//! gateway returns HTTP 500 or cannot be reached. Any other failure is
//! returned immediately and a step never restarts an earlier one.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{Error, Step};

/// Retry behaviour for transient gateway failures.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,

    /// Delay before the first retry.
    pub initial_backoff: Duration,

    /// Upper bound on any single delay.
    pub max_backoff: Duration,

    /// Factor applied to the delay after each retry.
    pub multiplier: f64,

    /// Random extra delay as a fraction of the computed delay (0.0 to 1.0).
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(1000),
            max_backoff: Duration::from_millis(5000),
            multiplier: 2.0,
            jitter: 0.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// The delay before retry number `attempt` (zero-based).
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base = self.initial_backoff.as_millis() as f64 * self.multiplier.powi(exponent);
        let capped = base.min(self.max_backoff.as_millis() as f64);

        let jitter = if self.jitter > 0.0 {
            capped * self.jitter.min(1.0) * fastrand::f64()
        } else {
            0.0
        };

        Duration::from_millis((capped + jitter) as u64)
    }
}

/// The outcome of a single failed attempt.
#[derive(Debug)]
pub(crate) enum Failure {
    /// HTTP 500 or a network-level error: eligible for retry.
    Transient {
        status: Option<u16>,
        message: String,
    },

    /// Any other failure, returned as is.
    Fatal(Error),
}

impl From<Error> for Failure {
    fn from(err: Error) -> Self {
        Self::Fatal(err)
    }
}

/// Run `f` until it succeeds, fails with a non-transient error, or the
/// policy's retries are exhausted. Exhaustion is reported as
/// [`Error::Transient`] carrying the last failure.
pub(crate) async fn with_retry<F, Fut, T>(policy: &RetryPolicy, step: Step, f: F) -> Result<T, Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, Failure>>,
{
    let mut attempt = 0;

    loop {
        match f().await {
            Ok(result) => {
                if attempt > 0 {
                    info!(%step, attempt = attempt + 1, "request succeeded after retry");
                }
                return Ok(result);
            }
            Err(Failure::Fatal(err)) => return Err(err),
            Err(Failure::Transient { status, message }) => {
                if attempt >= policy.max_retries {
                    warn!(%step, attempt = attempt + 1, ?status, "request failed after max retries");
                    return Err(Error::Transient { step, status, message });
                }

                let backoff = policy.backoff(attempt);
                warn!(
                    %step,
                    attempt = attempt + 1,
                    ?status,
                    backoff_ms = backoff.as_millis(),
                    "request failed, retrying after backoff"
                );

                sleep(backoff).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[test]
    fn backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_millis(1000));
        assert_eq!(policy.backoff(1), Duration::from_millis(2000));
        assert_eq!(policy.backoff(2), Duration::from_millis(4000));
        assert_eq!(policy.backoff(3), Duration::from_millis(5000));
        assert_eq!(policy.backoff(30), Duration::from_millis(5000));
    }

    #[test]
    fn jitter() {
        let policy = RetryPolicy {
            jitter: 0.5,
            ..RetryPolicy::default()
        };
        for _ in 0..20 {
            let delay = policy.backoff(0);
            assert!(delay >= Duration::from_millis(1000));
            assert!(delay <= Duration::from_millis(1500));
        }
    }

    // Transient failures are retried until the policy is exhausted.
    #[tokio::test(start_paused = true)]
    async fn exhausted() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let started = tokio::time::Instant::now();
        let result: Result<(), Error> =
            with_retry(&RetryPolicy::default(), Step::Token, || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(Failure::Transient {
                    status: Some(500),
                    message: "internal error".to_string(),
                })
            })
            .await;

        // 1000ms then 2000ms between the three attempts
        assert_eq!(started.elapsed(), Duration::from_millis(3000));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let err = result.expect_err("should fail");
        assert_eq!(err, Error::Transient {
            step: Step::Token,
            status: Some(500),
            message: "internal error".to_string(),
        });
    }

    #[tokio::test(start_paused = true)]
    async fn recovers() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = with_retry(&RetryPolicy::default(), Step::Authorize, || async move {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(Failure::Transient {
                    status: None,
                    message: "connection reset".to_string(),
                });
            }
            Ok("auth-req-id")
        })
        .await;

        assert_eq!(result.expect("should succeed"), "auth-req-id");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    // Non-transient failures are never retried.
    #[tokio::test]
    async fn fatal() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), Error> =
            with_retry(&RetryPolicy::default(), Step::Verify, || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(Error::from_step(Step::Verify, 403, "forbidden").into())
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.expect_err("should fail").status(), Some(403));
    }
}
