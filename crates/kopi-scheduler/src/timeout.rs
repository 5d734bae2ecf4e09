use std::sync::mpsc;
use std::time::{Duration, Instant};

use crate::{CancellationToken, TaskError};

/// Runs `f` on a dedicated worker thread and waits up to `timeout` for it to finish.
///
/// If the timeout elapses, `cancel_token` is cancelled before returning. The worker thread cannot
/// be forcibly terminated; `f` is expected to check the token periodically.
pub fn run_with_timeout<T, F>(
    timeout: Duration,
    cancel_token: CancellationToken,
    f: F,
) -> Result<T, TaskError>
where
    T: Send + 'static,
    F: FnOnce(CancellationToken) -> T + Send + 'static,
{
    if cancel_token.is_cancelled() {
        return Err(TaskError::Cancelled);
    }

    let (tx, rx) = mpsc::channel::<Result<T, TaskError>>();
    let token_for_task = cancel_token.clone();
    let spawned = std::thread::Builder::new()
        .name("kopi-bounded".to_owned())
        .spawn(move || {
            let result =
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| f(token_for_task)))
                    .map_err(|_| TaskError::Panicked);
            let _ = tx.send(result);
        });
    if spawned.is_err() {
        return Err(TaskError::Panicked);
    }

    let deadline = Instant::now() + timeout;
    let poll_interval = Duration::from_millis(5);

    loop {
        if cancel_token.is_cancelled() {
            return Err(TaskError::Cancelled);
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            cancel_token.cancel();
            return Err(TaskError::DeadlineExceeded(timeout));
        }

        match rx.recv_timeout(remaining.min(poll_interval)) {
            Ok(result) => return result,
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => return Err(TaskError::Panicked),
        }
    }
}

/// Best-effort lookup used for secondary data such as documentation.
///
/// Returns `None` when the lookup times out, is cancelled, or panics; the failure is logged and
/// the caller renders without the data.
pub fn bounded_lookup<T, F>(
    timeout: Duration,
    cancel_token: CancellationToken,
    what: &str,
    f: F,
) -> Option<T>
where
    T: Send + 'static,
    F: FnOnce(CancellationToken) -> Option<T> + Send + 'static,
{
    match run_with_timeout(timeout, cancel_token, f) {
        Ok(value) => value,
        Err(TaskError::Cancelled) => None,
        Err(err) => {
            tracing::debug!(
                target: "kopi.scheduler",
                lookup = what,
                error = %err,
                "lookup abandoned"
            );
            None
        }
    }
}
