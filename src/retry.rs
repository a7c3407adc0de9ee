use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

/// Bounded retry with linear backoff: attempt N sleeps N × `backoff`
/// before the next try.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }
}

/// Result of a retried operation plus the number of attempts consumed.
#[derive(Debug)]
pub struct Retried<T, E> {
    pub result: Result<T, E>,
    pub attempts: u32,
}

impl<T, E> Retried<T, E> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Run `operation` until it succeeds or the attempt bound is exhausted.
///
/// The last error is returned as-is; intermediate failures are logged with
/// the attempt count.
pub async fn retry<T, E, F, Fut>(
    operation_name: &str,
    policy: RetryPolicy,
    mut operation: F,
) -> Retried<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(
                        operation = operation_name,
                        attempt, "operation succeeded after retry"
                    );
                }
                return Retried {
                    result: Ok(value),
                    attempts: attempt,
                };
            }
            Err(e) => {
                if attempt == max_attempts {
                    return Retried {
                        result: Err(e),
                        attempts: attempt,
                    };
                }

                warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts,
                    error = %e,
                    "operation failed, will retry"
                );

                tokio::time::sleep(policy.backoff * attempt).await;
            }
        }
    }

    unreachable!()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn returns_first_success_without_extra_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let outcome = retry("always_ok", policy(), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(42)
            }
        })
        .await;

        assert_eq!(outcome.result.unwrap(), 42);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn recovers_when_a_later_attempt_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let outcome = retry("flaky", policy(), move || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 { Err("boom".to_string()) } else { Ok(n) }
            }
        })
        .await;

        assert_eq!(outcome.result.unwrap(), 3);
        assert_eq!(outcome.attempts, 3);
    }

    #[tokio::test]
    async fn stops_at_the_attempt_bound() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let outcome = retry("always_fails", policy(), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>("boom".to_string())
            }
        })
        .await;

        assert!(outcome.result.is_err());
        assert_eq!(outcome.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
