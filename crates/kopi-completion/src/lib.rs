//! Ranked code completion for Java sources.
//!
//! A completion request is a [`Query`] over a set of [`CandidateSource`]s. The
//! [`RankingEngine`] drains the sources, optionally in parallel on a
//! [`kopi_scheduler::Scheduler`], and filters by the typed prefix. Duplicate symbols are
//! dropped and the rest is ordered by [`SortKey`]. [`CompletionSession`] ties queries to
//! documents so that a newer request supersedes an older one.
//!
//! Hosts speaking LSP convert the ranked list with [`lsp::to_lsp_completion_list`].

mod docs;
mod engine;
mod filter;
pub mod lsp;
mod query;
mod session;
mod sort_key;
mod source;
mod strategy;

pub use docs::{fetch_documentation, DocumentationProvider};
pub use engine::{RankingEngine, Sources};
pub use query::{CaretContext, Query, QueryState};
pub use session::{CompletionSession, PendingCompletion};
pub use sort_key::{
    base_priority, compare, sort_candidates, SortKey, DEPRECATED_PENALTY, SMART_TYPE_BONUS,
};
pub use source::{CandidateSource, FnSource, IterSource, SourceError};
pub use strategy::{InsertStrategy, InsertText};

pub use kopi_config::{MatchMode, RankingConfig};
pub use kopi_core::{Candidate, CandidateKind, QueryId};
