use kopi_config::MatchMode;
use kopi_core::Candidate;
use kopi_fuzzy::IdentifierMatcher;

/// Selects candidates whose name matches the typed prefix.
pub(crate) struct PrefixFilter {
    mode: MatchMode,
    matcher: IdentifierMatcher,
}

impl PrefixFilter {
    pub(crate) fn new(mode: MatchMode, prefix: &str) -> Self {
        Self {
            mode,
            matcher: IdentifierMatcher::new(prefix),
        }
    }

    pub(crate) fn accepts(&mut self, candidate: &Candidate) -> bool {
        let name = candidate.name();
        // Anonymous hints (lambdas, parameter lists) are not filtered by what was typed.
        if self.matcher.query().is_empty() || name.is_empty() {
            return true;
        }
        match self.mode {
            MatchMode::Prefix => self.matcher.is_prefix_of(name),
            MatchMode::CamelCase => self.matcher.camel_case(name).is_some(),
            MatchMode::Subsequence => self.matcher.score(name).is_some(),
        }
    }
}
