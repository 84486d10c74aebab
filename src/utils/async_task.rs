use std::future::Future;

use tokio::time::sleep;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::warn;

use crate::BackoffPolicy;
use crate::Error;
use crate::Result;

/// Runs `task` until it succeeds, retrying with exponential backoff.
///
/// Each attempt is bounded by `policy.timeout_ms`. Returns `Ok(None)` when
/// `cancel` fires before an attempt succeeds. `policy.max_retries == 0` retries
/// forever.
pub(crate) async fn task_with_timeout_and_exponential_backoff<F, T, P>(
    name: &str,
    task: F,
    policy: BackoffPolicy,
    cancel: &CancellationToken,
) -> Result<Option<P>>
where
    F: Fn() -> T,
    T: Future<Output = Result<P>>,
{
    let mut attempt: u32 = 0;
    loop {
        let outcome = tokio::select! {
            _ = cancel.cancelled() => return Ok(None),
            r = timeout(policy.timeout(), task()) => r,
        };
        let last = match outcome {
            Ok(Ok(r)) => return Ok(Some(r)),
            Ok(Err(e)) => {
                warn!(task = name, attempt, error = %e, "attempt failed");
                e
            }
            Err(_) => {
                warn!(task = name, attempt, "attempt timed out");
                Error::Timeout(policy.timeout())
            }
        };

        attempt = attempt.saturating_add(1);
        if policy.max_retries != 0 && attempt as usize >= policy.max_retries {
            error!(task = name, attempts = attempt, "giving up after max retries");
            return Err(Error::RetryExhausted {
                task: name.to_string(),
                attempts: attempt as usize,
                last: Box::new(last),
            });
        }

        let delay = policy.delay_for(attempt - 1);
        tokio::select! {
            _ = cancel.cancelled() => return Ok(None),
            _ = sleep(delay) => {}
        }
    }
}

/// Spawns a named background task, logging its error if it fails.
pub(crate) fn spawn_task<Fut>(
    name: &str,
    task: Fut,
) -> tokio::task::JoinHandle<()>
where
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let name = name.to_string();
    tokio::spawn(async move {
        if let Err(e) = task.await {
            error!("spawned task: {name} stopped or encountered an error: {:?}", e);
        }
    })
}
