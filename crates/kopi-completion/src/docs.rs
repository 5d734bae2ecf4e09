use std::sync::Arc;
use std::time::Duration;

use kopi_core::Candidate;
use kopi_scheduler::{bounded_lookup, CancellationToken};

/// Host lookup of rendered documentation for a candidate (Javadoc, source comments).
///
/// Lookups can hit slow storage; they run on their own thread with a deadline and should poll
/// `token` while working.
pub trait DocumentationProvider: Send + Sync + 'static {
    fn documentation(&self, candidate: &Candidate, token: &CancellationToken) -> Option<String>;
}

impl<F> DocumentationProvider for F
where
    F: Fn(&Candidate, &CancellationToken) -> Option<String> + Send + Sync + 'static,
{
    fn documentation(&self, candidate: &Candidate, token: &CancellationToken) -> Option<String> {
        self(candidate, token)
    }
}

/// Fetch documentation for `candidate`, giving up after `timeout`.
///
/// Timeouts, cancellation of `token` and provider panics all yield `None`; the completion item is
/// then shown without documentation.
pub fn fetch_documentation(
    provider: &Arc<dyn DocumentationProvider>,
    candidate: &Candidate,
    timeout: Duration,
    token: &CancellationToken,
) -> Option<String> {
    if token.is_cancelled() {
        return None;
    }
    let provider = Arc::clone(provider);
    let candidate = candidate.clone();
    bounded_lookup(timeout, token.child_token(), "documentation", move |token| {
        provider.documentation(&candidate, &token)
    })
}
