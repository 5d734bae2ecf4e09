use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};

use kopi_config::RankingConfig;
use kopi_core::{panic_payload_to_str, Candidate};
use kopi_scheduler::{CancellationToken, Scheduler, TaskError};

use crate::filter::PrefixFilter;
use crate::query::Query;
use crate::sort_key::sort_candidates;
use crate::source::{CandidateSource, SourceError};

/// Candidate sources for one query, in presentation-independent discovery order.
pub type Sources = Vec<Box<dyn CandidateSource>>;

/// Merges candidate sources into one ranked list.
#[derive(Debug, Clone, Default)]
pub struct RankingEngine {
    config: RankingConfig,
}

impl RankingEngine {
    pub fn new(config: RankingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    /// Pull every source on the calling thread and return the ranked candidates.
    ///
    /// Returns an empty list, without touching any source, when `query` is already cancelled.
    pub fn rank(&self, sources: Sources, query: &Query) -> Vec<Candidate> {
        if !self.start(query) {
            return Vec::new();
        }
        let buffers = sources
            .into_iter()
            .map(|source| drain_source(source, query.token()))
            .collect();
        self.finish(buffers, query)
    }

    /// Like [`RankingEngine::rank`], but pulls the sources concurrently on the compute pool.
    ///
    /// Buffers are merged in source order, so the result equals the sequential one.
    pub async fn rank_on(
        &self,
        scheduler: &Scheduler,
        sources: Sources,
        query: &Query,
    ) -> Vec<Candidate> {
        if !self.start(query) {
            return Vec::new();
        }

        let tasks: Vec<_> = sources
            .into_iter()
            .map(|source| {
                scheduler.spawn_compute_with_token(query.token().child_token(), move |token| {
                    Ok(drain_source(source, &token))
                })
            })
            .collect();

        let mut buffers = Vec::with_capacity(tasks.len());
        for task in tasks {
            match task.join().await {
                Ok(buffer) => buffers.push(buffer),
                Err(TaskError::Cancelled) => buffers.push(Vec::new()),
                Err(err) => {
                    tracing::warn!(
                        target: "kopi.completion",
                        query = %query.id(),
                        error = %err,
                        "candidate source task failed; continuing without it"
                    );
                    buffers.push(Vec::new());
                }
            }
        }
        self.finish(buffers, query)
    }

    fn start(&self, query: &Query) -> bool {
        if query.is_cancelled() {
            query.mark_cancelled();
            tracing::debug!(
                target: "kopi.completion",
                query = %query.id(),
                "query cancelled before ranking"
            );
            return false;
        }
        query.begin_accumulating()
    }

    fn finish(&self, buffers: Vec<Vec<Candidate>>, query: &Query) -> Vec<Candidate> {
        let mut filter = PrefixFilter::new(self.config.match_mode, query.prefix());
        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        for candidate in buffers.into_iter().flatten() {
            if !filter.accepts(&candidate) {
                continue;
            }
            if seen.insert(candidate.identity_key()) {
                merged.push(candidate);
            }
        }

        if query.is_cancelled() {
            query.mark_cancelled();
            return Vec::new();
        }

        let mut ranked = sort_candidates(merged);
        if let Some(max) = self.config.max_results {
            ranked.truncate(max);
        }

        if !query.complete() {
            return Vec::new();
        }
        tracing::trace!(
            target: "kopi.completion",
            query = %query.id(),
            count = ranked.len(),
            "ranking complete"
        );
        ranked
    }
}

/// Pull `source` until it is exhausted or `token` fires.
///
/// A failing or panicking source contributes nothing; the failure is logged.
fn drain_source(mut source: Box<dyn CandidateSource>, token: &CancellationToken) -> Vec<Candidate> {
    let mut buffer = Vec::new();
    let outcome = catch_unwind(AssertUnwindSafe(|| -> Result<(), SourceError> {
        while !token.is_cancelled() {
            match source.next_candidate(token)? {
                Some(candidate) => buffer.push(candidate),
                None => break,
            }
        }
        Ok(())
    }));

    match outcome {
        Ok(Ok(())) | Ok(Err(SourceError::Cancelled)) => buffer,
        Ok(Err(err)) => {
            tracing::warn!(
                target: "kopi.completion",
                source = source.name(),
                error = %err,
                "candidate source failed; continuing without it"
            );
            Vec::new()
        }
        Err(panic) => {
            tracing::warn!(
                target: "kopi.completion",
                source = source.name(),
                panic = %panic_payload_to_str(&*panic),
                "candidate source panicked; continuing without it"
            );
            Vec::new()
        }
    }
}
