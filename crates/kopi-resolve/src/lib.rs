//! Type-aware fallbacks for completion when exact symbol resolution fails.
//!
//! The host attributes call sites and declarations; this crate compares them structurally:
//! - [`TypeRef`] models Java types and parses their source syntax.
//! - [`TypeEnv`] answers assignability questions from a class hierarchy.
//! - [`FuzzyMatcher`] accepts executables that disagree with a call in exactly one argument.
//! - [`first_resolved`] chains speculative resolution strategies.

mod env;
mod fuzzy;
mod types;

use smol_str::SmolStr;
use thiserror::Error;

use kopi_scheduler::{CancellationToken, Cancelled};

pub use env::{BasicTypeEnv, TypeEnv, MAX_BOUND_DEPTH};
pub use fuzzy::{ExecutableSig, FuzzyMatch, FuzzyMatcher, FuzzyResolution, Invocation};
pub use types::{PrimitiveType, TypeRef, WildcardBound};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// The host could not answer, e.g. its model is being rebuilt.
    #[error("resolution unavailable from {provider}: {reason}")]
    Unavailable { provider: SmolStr, reason: String },
    #[error("resolution cancelled")]
    Cancelled,
    #[error("malformed input: {0}")]
    Malformed(String),
    #[error("no matching symbol")]
    NoMatch,
}

impl ResolutionError {
    pub fn unavailable(provider: impl Into<SmolStr>, reason: impl Into<String>) -> Self {
        ResolutionError::Unavailable {
            provider: provider.into(),
            reason: reason.into(),
        }
    }
}

impl From<Cancelled> for ResolutionError {
    fn from(_: Cancelled) -> Self {
        ResolutionError::Cancelled
    }
}

/// One speculative resolution attempt.
pub type Strategy<'a, T> = Box<dyn FnOnce() -> Result<T, ResolutionError> + 'a>;

/// Try `strategies` in order and return the first success.
///
/// A failing strategy falls through to the next one; cancellation (from the token or from a
/// strategy) stops the chain immediately. When every strategy fails, the last error is returned,
/// or [`ResolutionError::NoMatch`] for an empty chain.
pub fn first_resolved<'a, T>(
    token: &CancellationToken,
    strategies: impl IntoIterator<Item = (&'static str, Strategy<'a, T>)>,
) -> Result<T, ResolutionError> {
    let mut last_error = ResolutionError::NoMatch;
    for (name, strategy) in strategies {
        kopi_scheduler::check_cancelled(token)?;
        match strategy() {
            Ok(value) => return Ok(value),
            Err(ResolutionError::Cancelled) => return Err(ResolutionError::Cancelled),
            Err(err) => {
                tracing::debug!(
                    target: "kopi.resolve",
                    strategy = name,
                    error = %err,
                    "resolution strategy failed; trying next"
                );
                last_error = err;
            }
        }
    }
    Err(last_error)
}
