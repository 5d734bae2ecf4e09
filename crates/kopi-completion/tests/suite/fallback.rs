//! Completion for calls whose exact resolution failed, built from the resolver's fallbacks.

use kopi_completion::{Candidate, CandidateSource, CaretContext, FnSource, Query, RankingEngine};
use kopi_core::QueryId;
use kopi_resolve::{
    first_resolved, BasicTypeEnv, ExecutableSig, FuzzyMatcher, Invocation, ResolutionError,
    Strategy,
};
use kopi_scheduler::CancellationToken;
use pretty_assertions::assert_eq;

use super::support::sources;

fn strategy<'a, T>(f: impl FnOnce() -> Result<T, ResolutionError> + 'a) -> Strategy<'a, T> {
    Box::new(f)
}

fn candidate_for(executable: &ExecutableSig) -> Candidate {
    Candidate::method(
        executable.name.clone(),
        executable.params.iter().map(|param| param.to_string()),
    )
}

/// Proposes the executables a broken call most likely meant: single-mismatch overloads first,
/// then similarly named executables.
fn fallback_source(
    call: Invocation,
    executables: Vec<ExecutableSig>,
) -> Box<dyn CandidateSource> {
    let mut pending: Option<Vec<Candidate>> = None;
    Box::new(FnSource::new("fallback", move |token: &CancellationToken| {
        if pending.is_none() {
            let env = BasicTypeEnv::new();
            let matcher = FuzzyMatcher::new(&env);
            let mut proposals = first_resolved(
                token,
                [
                    ("exact", strategy(|| Err(ResolutionError::NoMatch))),
                    (
                        "fuzzy",
                        strategy(|| {
                            let resolution =
                                matcher.resolve_cancellable(&call, &executables, token)?;
                            if !resolution.is_resolved() {
                                return Err(ResolutionError::NoMatch);
                            }
                            Ok(resolution
                                .matches
                                .iter()
                                .map(|m| candidate_for(&m.executable))
                                .collect::<Vec<_>>())
                        }),
                    ),
                    (
                        "similar names",
                        strategy(|| {
                            let names = matcher.closest_names(&call.name, &executables, 2);
                            if names.is_empty() {
                                return Err(ResolutionError::NoMatch);
                            }
                            Ok(executables
                                .iter()
                                .filter(|e| names.contains(&e.name))
                                .map(candidate_for)
                                .collect())
                        }),
                    ),
                ],
            )?;
            proposals.reverse();
            pending = Some(proposals);
        }
        Ok(pending.as_mut().and_then(Vec::pop))
    }))
}

fn sigs(texts: &[&str]) -> Vec<ExecutableSig> {
    texts
        .iter()
        .map(|text| ExecutableSig::parse(text).unwrap())
        .collect()
}

fn rank(source: Box<dyn CandidateSource>) -> Vec<String> {
    let query = Query::new(QueryId(1), CaretContext::default());
    RankingEngine::default()
        .rank(sources([source]), &query)
        .iter()
        .map(|c| format!("{}({})", c.name(), c.signature().unwrap().join(",")))
        .collect()
}

#[test]
fn single_mismatch_overload_is_proposed_and_pinned() {
    let call = Invocation::parse("f(int, String)").unwrap();
    let source = fallback_source(call, sigs(&["f(int,int)", "f(String,String)"]));

    // `f(String,String)` also mismatches once, but at index 0 rather than the pinned index 1.
    assert_eq!(rank(source), vec!["f(int,int)"]);
}

#[test]
fn first_discovered_overload_pins_the_mismatch_index() {
    let call = Invocation::parse("f(int, String)").unwrap();
    let source = fallback_source(call, sigs(&["f(String,String)", "f(int,int)"]));

    assert_eq!(rank(source), vec!["f(String,String)"]);
}

#[test]
fn unknown_names_fall_back_to_similar_executables() {
    let call = Invocation::parse("sise()").unwrap();
    let source = fallback_source(call, sigs(&["size()", "isEmpty()", "seize(int)"]));

    assert_eq!(rank(source), vec!["seize(int)", "size()"]);
}

#[test]
fn unresolvable_calls_contribute_nothing() {
    let call = Invocation::parse("frobnicate(int)").unwrap();
    let source = fallback_source(call, sigs(&["size()"]));
    assert_eq!(rank(source), Vec::<String>::new());
}
