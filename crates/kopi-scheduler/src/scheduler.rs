use std::{future::Future, sync::Arc, time::Duration};

use rayon::ThreadPool;
use tokio::runtime::Runtime;
use tokio::sync::oneshot;

use kopi_core::panic_payload_to_str;

use crate::task::{AsyncTask, BlockingTask};
use crate::{CancellationToken, Cancelled, TaskError};

enum ComputePool {
    Rayon(ThreadPool),
    Inline,
}

impl ComputePool {
    fn build(threads: usize) -> Self {
        // Thread creation can fail in constrained sandboxes (low RLIMIT_NPROC, `EAGAIN`); halve
        // the pool until it fits and finally run jobs inline.
        let mut threads = threads.max(1);
        loop {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .thread_name(|idx| format!("kopi-compute-{idx}"))
                .build()
            {
                Ok(pool) => return ComputePool::Rayon(pool),
                Err(_) if threads > 1 => threads = (threads / 2).max(1),
                Err(err) => {
                    tracing::warn!(
                        target: "kopi.scheduler",
                        error = %err,
                        "failed to start compute pool; running candidate sources inline"
                    );
                    return ComputePool::Inline;
                }
            }
        }
    }

    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        match self {
            ComputePool::Rayon(pool) => pool.spawn(job),
            ComputePool::Inline => job(),
        }
    }
}

fn build_io_runtime(threads: usize) -> Runtime {
    let mut threads = threads.max(1);
    loop {
        match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(threads)
            .enable_time()
            .thread_name("kopi-io")
            .build()
        {
            Ok(rt) => return rt,
            Err(_) if threads > 1 => threads = 1,
            Err(err) => {
                return tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                    .unwrap_or_else(|_| panic!("failed to build IO runtime: {err}"));
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub compute_threads: usize,
    pub io_threads: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        let available = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            // Completion work is latency-bound and short; a handful of workers is plenty and
            // keeps editor processes from exhausting per-user thread limits.
            compute_threads: available.saturating_sub(1).clamp(1, 4),
            io_threads: 1,
        }
    }
}

/// Runs candidate sources off the caller's thread.
///
/// Cheap to clone; all clones share the same pools.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    compute_pool: ComputePool,
    io_runtime: Option<Runtime>,
    io_handle: tokio::runtime::Handle,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        let compute_pool = ComputePool::build(config.compute_threads);
        let io_runtime = build_io_runtime(config.io_threads);
        let io_handle = io_runtime.handle().clone();
        Self {
            inner: Arc::new(SchedulerInner {
                compute_pool,
                io_runtime: Some(io_runtime),
                io_handle,
            }),
        }
    }

    /// Build a scheduler that reuses an existing Tokio runtime for timers and async joins.
    pub fn new_with_io_handle(config: SchedulerConfig, io_handle: tokio::runtime::Handle) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                compute_pool: ComputePool::build(config.compute_threads),
                io_runtime: None,
                io_handle,
            }),
        }
    }

    pub fn io_handle(&self) -> tokio::runtime::Handle {
        self.inner.io_handle.clone()
    }

    /// Run `f` on the compute pool. Panics are caught and reported as [`TaskError::Panicked`].
    ///
    /// If `token` is already cancelled the job is never started.
    pub fn spawn_compute_with_token<T, F>(&self, token: CancellationToken, f: F) -> BlockingTask<T>
    where
        T: Send + 'static,
        F: FnOnce(CancellationToken) -> Result<T, Cancelled> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        if token.is_cancelled() {
            let _ = tx.send(Err(TaskError::Cancelled));
            return BlockingTask::new(token, rx);
        }

        let token_for_job = token.clone();
        self.inner.compute_pool.spawn(move || {
            let result = match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                f(token_for_job)
            })) {
                Ok(result) => result.map_err(TaskError::from),
                Err(panic) => {
                    tracing::error!(
                        target: "kopi.scheduler",
                        panic = %panic_payload_to_str(&*panic),
                        "compute task panicked"
                    );
                    Err(TaskError::Panicked)
                }
            };
            let _ = tx.send(result);
        });

        BlockingTask::new(token, rx)
    }

    pub fn spawn_compute<T, F>(&self, f: F) -> BlockingTask<T>
    where
        T: Send + 'static,
        F: FnOnce(CancellationToken) -> Result<T, Cancelled> + Send + 'static,
    {
        self.spawn_compute_with_token(CancellationToken::new(), f)
    }

    pub fn spawn_io_with_token<T, F, Fut>(&self, token: CancellationToken, f: F) -> AsyncTask<T>
    where
        T: Send + 'static,
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
    {
        if token.is_cancelled() {
            let handle = self.io_handle().spawn(async { Err(TaskError::Cancelled) });
            return AsyncTask::new(token, handle);
        }

        let token_for_fut = token.clone();
        let handle = self.io_handle().spawn(f(token_for_fut));
        AsyncTask::new(token, handle)
    }

    /// Wait `delay`, then run `f` on the compute pool, unless `token` fires first.
    ///
    /// Used for auto-popup completion: each keystroke restarts the delay of its document, and
    /// only the last keystroke's query ever reaches the compute pool.
    pub fn spawn_compute_after<T, F>(
        &self,
        token: CancellationToken,
        delay: Duration,
        f: F,
    ) -> AsyncTask<T>
    where
        T: Send + 'static,
        F: FnOnce(CancellationToken) -> Result<T, Cancelled> + Send + 'static,
    {
        let scheduler = self.clone();
        self.spawn_io_with_token(token, move |token| async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(TaskError::Cancelled),
                _ = tokio::time::sleep(delay) => {
                    scheduler.spawn_compute_with_token(token, f).join().await
                }
            }
        })
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl Drop for SchedulerInner {
    fn drop(&mut self) {
        if let Some(runtime) = self.io_runtime.take() {
            runtime.shutdown_background();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    fn scheduler() -> Scheduler {
        Scheduler::new(SchedulerConfig {
            compute_threads: 2,
            io_threads: 1,
        })
    }

    #[test]
    fn compute_tasks_return_values() {
        let scheduler = scheduler();
        let task = scheduler.spawn_compute(|_token| Ok(21 * 2));
        assert_eq!(task.wait(), Ok(42));
    }

    #[test]
    fn cancelled_tokens_never_start_work() {
        let scheduler = scheduler();
        let started = Arc::new(AtomicBool::new(false));
        let token = CancellationToken::new();
        token.cancel();

        let flag = Arc::clone(&started);
        let task = scheduler.spawn_compute_with_token(token, move |_| {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });

        assert_eq!(task.wait(), Err(TaskError::Cancelled));
        assert!(!started.load(Ordering::SeqCst));
    }

    #[test]
    fn panics_are_reported() {
        let scheduler = scheduler();
        let task = scheduler.spawn_compute(|_token| -> Result<(), Cancelled> { panic!("boom") });
        assert_eq!(task.wait(), Err(TaskError::Panicked));
    }

    #[test]
    fn delayed_work_is_skipped_when_cancelled_during_delay() {
        let scheduler = scheduler();
        let ran = Arc::new(AtomicBool::new(false));
        let token = CancellationToken::new();

        let flag = Arc::clone(&ran);
        let task = scheduler.spawn_compute_after(
            token.clone(),
            Duration::from_millis(200),
            move |_| {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            },
        );
        token.cancel();

        let result = scheduler.io_handle().block_on(task);
        assert_eq!(result, Err(TaskError::Cancelled));
        std::thread::sleep(Duration::from_millis(250));
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[test]
    fn delayed_work_runs_after_delay() {
        let scheduler = scheduler();
        let task = scheduler.spawn_compute_after(
            CancellationToken::new(),
            Duration::from_millis(10),
            |_| Ok("done"),
        );
        assert_eq!(scheduler.io_handle().block_on(task), Ok("done"));
    }
}
