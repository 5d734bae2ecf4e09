use std::{
    future::Future,
    hash::Hash,
    pin::Pin,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    task::{Context, Poll},
    time::Duration,
};

use parking_lot::RwLock;

use kopi_config::RankingConfig;
use kopi_core::{Candidate, QueryId};
use kopi_scheduler::{AsyncTask, Cancelled, Scheduler, Supersede, TaskError};

use crate::engine::{RankingEngine, Sources};
use crate::query::{CaretContext, Query, QueryState};

/// Completion queries of one editor, keyed by document.
///
/// At most one query per document is live: starting a query cancels the previous query for the
/// same key, whether it is still waiting for its auto-popup delay or already ranking.
pub struct CompletionSession<K> {
    scheduler: Scheduler,
    engine: RwLock<Arc<RankingEngine>>,
    supersede: Supersede<K>,
    next_query: AtomicU64,
}

impl<K> CompletionSession<K>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
{
    pub fn new(config: RankingConfig, scheduler: Scheduler) -> Self {
        Self {
            scheduler,
            engine: RwLock::new(Arc::new(RankingEngine::new(config))),
            supersede: Supersede::new(),
            next_query: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> RankingConfig {
        self.engine.read().config().clone()
    }

    /// Swap in a reloaded configuration. Queries already scheduled keep the one they started
    /// with.
    pub fn reconfigure(&self, config: RankingConfig) {
        *self.engine.write() = Arc::new(RankingEngine::new(config));
    }

    /// Explicit completion request; ranking starts immediately.
    pub fn complete(&self, key: K, context: CaretContext, sources: Sources) -> PendingCompletion {
        self.schedule(key, context, sources, Duration::ZERO)
    }

    /// React to `typed` having been inserted before the caret.
    ///
    /// Returns `None` when `typed` does not open completion automatically. Otherwise the query
    /// waits for the configured auto-popup delay first, so a burst of keystrokes only ranks
    /// once.
    pub fn on_typed(
        &self,
        key: K,
        typed: char,
        context: CaretContext,
        sources: Sources,
    ) -> Option<PendingCompletion> {
        let delay = {
            let engine = self.engine.read();
            if !engine.config().is_auto_popup_trigger(typed) {
                return None;
            }
            engine.config().auto_popup_delay()
        };
        Some(self.schedule(key, context, sources, delay))
    }

    /// Cancel the live query for `key`. Returns whether there was one.
    pub fn cancel(&self, key: &K) -> bool {
        self.supersede.cancel(key)
    }

    pub fn cancel_all(&self) {
        self.supersede.cancel_all();
    }

    /// Number of documents with a live query.
    pub fn live_queries(&self) -> usize {
        self.supersede.live_count()
    }

    fn schedule(
        &self,
        key: K,
        context: CaretContext,
        sources: Sources,
        delay: Duration,
    ) -> PendingCompletion {
        let id = QueryId(self.next_query.fetch_add(1, Ordering::Relaxed));
        let lease = self.supersede.begin(key);
        let engine = Arc::clone(&self.engine.read());

        tracing::debug!(
            target: "kopi.completion",
            query = %id,
            generation = lease.generation(),
            delay_ms = delay.as_millis() as u64,
            "scheduling completion query"
        );

        let task = self
            .scheduler
            .spawn_compute_after(lease.token(), delay, move |token| {
                let query = Query::with_token(id, context, token);
                let ranked = engine.rank(sources, &query);
                let current = lease.is_current();
                lease.finish();
                if !current || query.state() != QueryState::Completed {
                    return Err(Cancelled);
                }
                Ok(ranked)
            });

        PendingCompletion { id, task }
    }
}

/// A scheduled completion query. Resolves to the ranked candidates, or
/// [`TaskError::Cancelled`] once superseded.
pub struct PendingCompletion {
    id: QueryId,
    task: AsyncTask<Vec<Candidate>>,
}

impl PendingCompletion {
    pub fn id(&self) -> QueryId {
        self.id
    }

    pub fn cancel(&self) {
        self.task.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Future for PendingCompletion {
    type Output = Result<Vec<Candidate>, TaskError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().task).poll(cx)
    }
}
