use std::future::Future;
use std::time::Duration;

use tokio_retry::RetryIf;
use tokio_retry::strategy::FixedInterval;
use tracing::debug;

use crate::errors::ActionError;

/// Result of one status check while waiting on a resource.
#[derive(Debug)]
pub enum Poll<T> {
    Ready(T),
    Pending(String),
}

enum Attempt {
    NotReady(String),
    Failed(ActionError),
}

/// Re-runs `check` every `interval` until it reports [`Poll::Ready`].
///
/// The interval is fixed; there is no backoff or jitter. A check that fails
/// with an error ends the wait immediately. After `max_attempts` checks that
/// were all pending the wait ends with [`ActionError::Timeout`].
///
/// # Errors
///
/// Returns the first error produced by `check`, or `Timeout` when the
/// attempts run out.
pub async fn poll_until<T, F, Fut>(
    what: &str,
    interval: Duration,
    max_attempts: usize,
    mut check: F,
) -> Result<T, ActionError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Poll<T>, ActionError>>,
{
    let strategy = FixedInterval::new(interval).take(max_attempts.saturating_sub(1));

    let outcome = RetryIf::start(
        strategy,
        || {
            let pending = check();
            async move {
                match pending.await {
                    Ok(Poll::Ready(value)) => Ok(value),
                    Ok(Poll::Pending(status)) => {
                        debug!(resource = %what, status = %status, "Still waiting");
                        Err(Attempt::NotReady(status))
                    }
                    Err(e) => Err(Attempt::Failed(e)),
                }
            }
        },
        |attempt: &Attempt| matches!(attempt, Attempt::NotReady(_)),
    )
    .await;

    match outcome {
        Ok(value) => Ok(value),
        Err(Attempt::NotReady(status)) => Err(ActionError::Timeout(format!(
            "{what} (last status: {status})"
        ))),
        Err(Attempt::Failed(e)) => Err(e),
    }
}
