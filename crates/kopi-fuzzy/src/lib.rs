//! Identifier matching primitives used to filter completion candidates against the text the
//! user has typed so far.
//!
//! Three matching disciplines are offered, from strictest to loosest:
//!
//! - **prefix**: ASCII case-insensitive `starts_with`.
//! - **camel case**: every hump of the query (`NPE`, `gNa`) starts a hump of the candidate
//!   (`NullPointerException`, `getName`), in order. Prefix matches are also camel-case matches.
//! - **subsequence**: a scored fuzzy subsequence match that prefers word starts and consecutive
//!   runs.

#![forbid(unsafe_code)]

mod camel;
mod scoring;

pub use camel::camel_case_match;
pub use scoring::{fuzzy_match, IdentifierMatcher, MatchKind, MatchScore, RankKey};

/// Case-insensitive prefix match.
#[inline]
pub fn prefix_match(query: &str, candidate: &str) -> bool {
    fuzzy_match(query, candidate).is_some_and(|s| s.kind == MatchKind::Prefix)
}
