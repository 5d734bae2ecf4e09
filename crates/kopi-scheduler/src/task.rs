use std::{future::Future, pin::Pin};

use tokio::sync::oneshot;

use crate::{CancellationToken, TaskError};

/// Handle to work running on the compute pool.
pub struct BlockingTask<T> {
    token: CancellationToken,
    rx: oneshot::Receiver<Result<T, TaskError>>,
}

impl<T> BlockingTask<T> {
    pub(crate) fn new(
        token: CancellationToken,
        rx: oneshot::Receiver<Result<T, TaskError>>,
    ) -> Self {
        Self { token, rx }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Await the result; resolves to `Cancelled` as soon as the token fires, without waiting for
    /// the worker to notice.
    pub async fn join(self) -> Result<T, TaskError> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(TaskError::Cancelled),
            result = self.rx => result.unwrap_or(Err(TaskError::Panicked)),
        }
    }

    /// Block the calling thread until the worker reports back.
    ///
    /// Must not be called from within an async context. Unlike [`BlockingTask::join`] this waits
    /// for the worker even after cancellation, so callers observe the worker's own verdict.
    pub fn wait(self) -> Result<T, TaskError> {
        self.rx.blocking_recv().unwrap_or(Err(TaskError::Panicked))
    }
}

/// Handle to a future running on the IO runtime.
pub struct AsyncTask<T> {
    token: CancellationToken,
    handle: tokio::task::JoinHandle<Result<T, TaskError>>,
}

impl<T> AsyncTask<T> {
    pub(crate) fn new(
        token: CancellationToken,
        handle: tokio::task::JoinHandle<Result<T, TaskError>>,
    ) -> Self {
        Self { token, handle }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

fn flatten<T>(
    result: Result<Result<T, TaskError>, tokio::task::JoinError>,
) -> Result<T, TaskError> {
    match result {
        Ok(result) => result,
        Err(err) if err.is_cancelled() => Err(TaskError::Cancelled),
        Err(_) => Err(TaskError::Panicked),
    }
}

impl<T> Future for AsyncTask<T> {
    type Output = Result<T, TaskError>;

    fn poll(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Self::Output> {
        if self.token.is_cancelled() {
            self.handle.abort();
            return std::task::Poll::Ready(Err(TaskError::Cancelled));
        }

        Pin::new(&mut self.handle).poll(cx).map(flatten)
    }
}
