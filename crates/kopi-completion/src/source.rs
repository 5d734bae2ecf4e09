use smol_str::SmolStr;
use thiserror::Error;

use kopi_core::{Candidate, CandidateError};
use kopi_resolve::ResolutionError;
use kopi_scheduler::{CancellationToken, Cancelled};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("candidate source {provider} failed: {reason}")]
    Failed { provider: SmolStr, reason: String },
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Candidate(#[from] CandidateError),
    #[error("candidate source cancelled")]
    Cancelled,
}

impl SourceError {
    pub fn failed(provider: impl Into<SmolStr>, reason: impl Into<String>) -> Self {
        SourceError::Failed {
            provider: provider.into(),
            reason: reason.into(),
        }
    }
}

impl From<Cancelled> for SourceError {
    fn from(_: Cancelled) -> Self {
        SourceError::Cancelled
    }
}

/// Lazily produces candidates for one query.
///
/// Sources are finite and single-use: the engine takes them by value and pulls until `None`.
/// Implementations check `token` between elements and stop producing once it fires.
pub trait CandidateSource: Send {
    /// Name used in logs when the source fails.
    fn name(&self) -> &str {
        "anonymous"
    }

    fn next_candidate(
        &mut self,
        token: &CancellationToken,
    ) -> Result<Option<Candidate>, SourceError>;
}

impl<S> CandidateSource for Box<S>
where
    S: CandidateSource + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn next_candidate(
        &mut self,
        token: &CancellationToken,
    ) -> Result<Option<Candidate>, SourceError> {
        (**self).next_candidate(token)
    }
}

/// Source backed by an already-computed iterator, e.g. keywords or an index snapshot.
pub struct IterSource<I> {
    name: SmolStr,
    iter: I,
}

impl<I> IterSource<I>
where
    I: Iterator<Item = Candidate> + Send,
{
    pub fn new(name: impl Into<SmolStr>, iter: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            name: name.into(),
            iter: iter.into_iter(),
        }
    }
}

impl<I> CandidateSource for IterSource<I>
where
    I: Iterator<Item = Candidate> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn next_candidate(
        &mut self,
        token: &CancellationToken,
    ) -> Result<Option<Candidate>, SourceError> {
        if token.is_cancelled() {
            return Ok(None);
        }
        Ok(self.iter.next())
    }
}

/// Source backed by a closure that performs one blocking probe per call.
///
/// The closure is not invoked again once the token fires or after it returned `None`.
pub struct FnSource<F> {
    name: SmolStr,
    probe: F,
    exhausted: bool,
}

impl<F> FnSource<F>
where
    F: FnMut(&CancellationToken) -> Result<Option<Candidate>, SourceError> + Send,
{
    pub fn new(name: impl Into<SmolStr>, probe: F) -> Self {
        Self {
            name: name.into(),
            probe,
            exhausted: false,
        }
    }
}

impl<F> CandidateSource for FnSource<F>
where
    F: FnMut(&CancellationToken) -> Result<Option<Candidate>, SourceError> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn next_candidate(
        &mut self,
        token: &CancellationToken,
    ) -> Result<Option<Candidate>, SourceError> {
        if self.exhausted || token.is_cancelled() {
            return Ok(None);
        }
        let next = (self.probe)(token)?;
        self.exhausted = next.is_none();
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use kopi_core::VariableKind;

    use super::*;

    #[test]
    fn iter_source_stops_once_cancelled() {
        let token = CancellationToken::new();
        let mut source = IterSource::new(
            "locals",
            vec![
                Candidate::variable(VariableKind::Local, "a"),
                Candidate::variable(VariableKind::Local, "b"),
            ],
        );

        assert_eq!(source.name(), "locals");
        assert!(source.next_candidate(&token).unwrap().is_some());
        token.cancel();
        assert_eq!(source.next_candidate(&token), Ok(None));
    }

    #[test]
    fn fn_source_is_not_probed_after_exhaustion() {
        let token = CancellationToken::new();
        let mut calls = 0;
        let mut source = FnSource::new("probe", |_: &CancellationToken| {
            calls += 1;
            Ok(None)
        });

        assert_eq!(source.next_candidate(&token), Ok(None));
        assert_eq!(source.next_candidate(&token), Ok(None));
        drop(source);
        assert_eq!(calls, 1);
    }

    #[test]
    fn resolution_errors_convert() {
        let err = SourceError::from(ResolutionError::unavailable("javac", "model rebuilding"));
        assert_eq!(
            err.to_string(),
            "resolution unavailable from javac: model rebuilding"
        );
        assert_eq!(SourceError::from(Cancelled), SourceError::Cancelled);
    }
}
