//! Core shared types for Kopi.
//!
//! This crate is intentionally small: it holds the completion data model shared by the
//! ranking engine, the resolver and the host adapters.

mod candidate;
mod kind;

pub use candidate::{Candidate, CandidateError, IdentityKey};
pub use kind::{
    CandidateKind, ExecutableKind, LinkKind, MemberKind, SymbolCategory, TypeKind, VariableKind,
};

use std::any::Any;
use std::fmt;

/// Identifier of one completion query.
///
/// Hosts allocate these monotonically per document so that logs can correlate a query with the
/// query that superseded it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryId(pub u64);

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

impl From<u64> for QueryId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Best-effort conversion of a panic payload into a printable message.
pub fn panic_payload_to_str(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "<non-string panic payload>"
    }
}
