use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, warn};

/// Bounded retry with a fixed delay between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedRetryPolicy {
    /// Retries after the initial attempt
    pub max_retries: u32,
    /// Delay before every retry
    pub delay: Duration,
}

impl Default for FixedRetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            delay: Duration::from_secs(1),
        }
    }
}

/// Result of a retried operation plus the number of retries it took
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: Result<T, E>,
    pub retries: u32,
}

/// Retry `operation` while `is_retryable` accepts its error
///
/// At most `policy.max_retries` retries follow the initial attempt. Before
/// each retry the combinator sleeps `policy.delay` and then awaits
/// `before_retry(retry_number)`, whose output is handed to the next
/// attempt. Non-retryable errors are returned immediately.
pub async fn retry_fixed<T, E, S, F, Fut, P, H, HFut>(
    operation_name: &str,
    policy: &FixedRetryPolicy,
    initial: S,
    mut operation: F,
    is_retryable: P,
    mut before_retry: H,
) -> RetryOutcome<T, E>
where
    E: Display,
    F: FnMut(S) -> Fut,
    Fut: Future<Output = (Result<T, E>, S)>,
    P: Fn(&E) -> bool,
    H: FnMut(u32, S) -> HFut,
    HFut: Future<Output = S>,
{
    let start_time = Instant::now();
    let mut retries = 0;
    let mut state = initial;

    loop {
        let (result, returned_state) = operation(state).await;
        state = returned_state;

        let err = match result {
            Ok(value) => {
                if retries > 0 {
                    debug!(
                        operation = operation_name,
                        retries,
                        duration_ms = start_time.elapsed().as_millis() as u64,
                        "Operation succeeded after retry"
                    );
                }
                return RetryOutcome {
                    result: Ok(value),
                    retries,
                };
            }
            Err(err) => err,
        };

        if !is_retryable(&err) {
            debug!(operation = operation_name, error = %err, "Non-retryable error, not retrying");
            return RetryOutcome {
                result: Err(err),
                retries,
            };
        }

        if retries >= policy.max_retries {
            warn!(
                operation = operation_name,
                retries,
                error = %err,
                "All retry attempts exhausted"
            );
            return RetryOutcome {
                result: Err(err),
                retries,
            };
        }

        retries += 1;
        warn!(
            operation = operation_name,
            retry = retries,
            max_retries = policy.max_retries,
            backoff_ms = policy.delay.as_millis() as u64,
            error = %err,
            "Retryable error, backing off before retry"
        );
        sleep(policy.delay).await;
        state = before_retry(retries, state).await;
    }
}
