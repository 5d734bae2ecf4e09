use std::sync::atomic::{AtomicU8, Ordering};

use kopi_core::QueryId;
use kopi_scheduler::CancellationToken;

/// Lifecycle of a [`Query`]. `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum QueryState {
    Created = 0,
    Accumulating = 1,
    Completed = 2,
    Cancelled = 3,
}

impl QueryState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => QueryState::Created,
            1 => QueryState::Accumulating,
            2 => QueryState::Completed,
            _ => QueryState::Cancelled,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, QueryState::Completed | QueryState::Cancelled)
    }
}

/// What the user has typed around the caret.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaretContext {
    /// Identifier prefix left of the caret; empty right after a trigger character.
    pub prefix: String,
    /// Expected type at the caret, when the host could infer one.
    pub expected_type: Option<String>,
    pub offset: usize,
}

impl CaretContext {
    pub fn new(prefix: impl Into<String>, offset: usize) -> Self {
        Self {
            prefix: prefix.into(),
            expected_type: None,
            offset,
        }
    }

    pub fn with_expected_type(mut self, expected_type: impl Into<String>) -> Self {
        self.expected_type = Some(expected_type.into());
        self
    }
}

/// One completion request.
pub struct Query {
    id: QueryId,
    context: CaretContext,
    token: CancellationToken,
    state: AtomicU8,
}

impl Query {
    pub fn new(id: impl Into<QueryId>, context: CaretContext) -> Self {
        Self::with_token(id, context, CancellationToken::new())
    }

    pub fn with_token(
        id: impl Into<QueryId>,
        context: CaretContext,
        token: CancellationToken,
    ) -> Self {
        Self {
            id: id.into(),
            context,
            token,
            state: AtomicU8::new(QueryState::Created as u8),
        }
    }

    pub fn id(&self) -> QueryId {
        self.id
    }

    pub fn context(&self) -> &CaretContext {
        &self.context
    }

    pub fn prefix(&self) -> &str {
        &self.context.prefix
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Cancel the query. Has no effect on the state of a completed query.
    pub fn cancel(&self) {
        self.token.cancel();
        self.mark_cancelled();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Current state; a fired token moves a live query to `Cancelled`.
    pub fn state(&self) -> QueryState {
        if self.token.is_cancelled() {
            self.mark_cancelled();
        }
        QueryState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn begin_accumulating(&self) -> bool {
        self.transition(QueryState::Created, QueryState::Accumulating)
    }

    /// Move to `Completed` unless the token fired first.
    pub(crate) fn complete(&self) -> bool {
        if self.token.is_cancelled() {
            self.mark_cancelled();
            return false;
        }
        self.transition(QueryState::Accumulating, QueryState::Completed)
    }

    pub(crate) fn mark_cancelled(&self) {
        let _ = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (!QueryState::from_u8(current).is_terminal())
                    .then_some(QueryState::Cancelled as u8)
            });
    }

    fn transition(&self, from: QueryState, to: QueryState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl std::fmt::Debug for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("id", &self.id)
            .field("context", &self.context)
            .field("state", &QueryState::from_u8(self.state.load(Ordering::Relaxed)))
            .finish()
    }
}
