//! Cancellation-aware work scheduling for completion queries.
//!
//! Queries run their candidate sources on a rayon compute pool while the issuing thread keeps
//! handling keystrokes. The only state shared with that work is a [`CancellationToken`];
//! producers poll it between units of work and stop once it fires.

mod scheduler;
mod supersede;
mod task;
mod timeout;

use std::time::Duration;

use thiserror::Error;

pub use scheduler::{Scheduler, SchedulerConfig};
pub use supersede::{Lease, Supersede};
pub use task::{AsyncTask, BlockingTask};
pub use timeout::{bounded_lookup, run_with_timeout};
pub use tokio_util::sync::CancellationToken;

/// Returned by cooperative work that observed its token firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("task cancelled")]
    Cancelled,
    #[error("task panicked")]
    Panicked,
    #[error("task exceeded its deadline of {0:?}")]
    DeadlineExceeded(Duration),
}

impl From<Cancelled> for TaskError {
    fn from(_: Cancelled) -> Self {
        TaskError::Cancelled
    }
}

/// `Err(Cancelled)` once `token` has fired; convenient with `?` inside cooperative loops.
#[inline]
pub fn check_cancelled(token: &CancellationToken) -> Result<(), Cancelled> {
    if token.is_cancelled() {
        Err(Cancelled)
    } else {
        Ok(())
    }
}
