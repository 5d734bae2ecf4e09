use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use kopi_completion::{
    Candidate, CaretContext, FnSource, MatchMode, Query, QueryState, RankingConfig, RankingEngine,
    SourceError, Sources,
};
use kopi_core::{QueryId, TypeKind, VariableKind};
use kopi_scheduler::{CancellationToken, Scheduler, SchedulerConfig};
use pretty_assertions::assert_eq;

use super::support::{counting_source, iter_source, local, names, sources};

fn query(prefix: &str) -> Query {
    Query::new(QueryId(1), CaretContext::new(prefix, 0))
}

fn scheduler() -> Scheduler {
    Scheduler::new(SchedulerConfig {
        compute_threads: 2,
        io_threads: 1,
    })
}

#[test]
fn cancelled_queries_never_touch_sources() {
    let engine = RankingEngine::default();
    let calls = Arc::new(AtomicUsize::new(0));
    let query = query("");
    query.cancel();

    let ranked = engine.rank(sources([counting_source(&calls), counting_source(&calls)]), &query);

    assert!(ranked.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(query.state(), QueryState::Cancelled);

    let scheduler = scheduler();
    let ranked = scheduler.io_handle().block_on(engine.rank_on(
        &scheduler,
        sources([counting_source(&calls)]),
        &query,
    ));
    assert!(ranked.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn cancellation_during_accumulation_discards_everything() {
    let engine = RankingEngine::default();
    let token = CancellationToken::new();
    let query = Query::with_token(QueryId(2), CaretContext::default(), token.clone());

    let mut produced = 0;
    let cancelling = FnSource::new("cancelling", move |_: &CancellationToken| {
        produced += 1;
        if produced == 2 {
            token.cancel();
        }
        Ok(Some(local(&format!("v{produced}"))))
    });

    let ranked = engine.rank(sources([Box::new(cancelling)]), &query);
    assert!(ranked.is_empty());
    assert_eq!(query.state(), QueryState::Cancelled);
}

fn mixed_sources() -> Sources {
    let mut yielded = false;
    let failing = FnSource::new("index", move |_: &CancellationToken| {
        if yielded {
            return Err(SourceError::failed("index", "corrupt segment"));
        }
        yielded = true;
        Ok(Some(local("lost")))
    });
    let panicking = FnSource::new("broken", |_: &CancellationToken| -> Result<_, SourceError> {
        panic!("source bug")
    });

    sources([
        iter_source("locals", vec![local("alpha")]),
        Box::new(failing),
        Box::new(panicking),
        iter_source("keywords", vec![Candidate::keyword("assert")]),
    ])
}

#[test]
fn failing_and_panicking_sources_are_isolated() {
    let engine = RankingEngine::default();

    let query = query("");
    let ranked = engine.rank(mixed_sources(), &query);
    assert_eq!(names(&ranked), vec!["alpha", "assert"]);
    assert_eq!(query.state(), QueryState::Completed);

    let scheduler = scheduler();
    let query = self::query("");
    let ranked = scheduler
        .io_handle()
        .block_on(engine.rank_on(&scheduler, mixed_sources(), &query));
    assert_eq!(names(&ranked), vec!["alpha", "assert"]);
    assert_eq!(query.state(), QueryState::Completed);
}

#[test]
fn duplicates_collapse_to_the_first_occurrence() {
    let engine = RankingEngine::default();
    let field = Candidate::variable(VariableKind::Field, "MAX_VALUE")
        .with_qualified_name("java.lang.Integer.MAX_VALUE")
        .smart_typed(true);
    let same_as_static = Candidate::static_field("MAX_VALUE")
        .with_qualified_name("java.lang.Integer.MAX_VALUE");
    let other =
        Candidate::static_field("MAX_VALUE").with_qualified_name("java.lang.Long.MAX_VALUE");

    let ranked = engine.rank(
        sources([
            iter_source("scope", vec![field.clone()]),
            iter_source("statics", vec![same_as_static, other.clone(), field.clone()]),
        ]),
        &query(""),
    );
    assert_eq!(ranked, vec![field, other]);

    let again = engine.rank(sources([iter_source("ranked", ranked.clone())]), &query(""));
    assert_eq!(again, ranked);
}

#[test]
fn overloads_with_distinct_signatures_are_kept() {
    let engine = RankingEngine::default();
    let ranked = engine.rank(
        sources([iter_source(
            "members",
            vec![
                Candidate::method("valueOf", ["int"]),
                Candidate::method("valueOf", ["String"]),
                Candidate::method("valueOf", ["int"]),
            ],
        )]),
        &query(""),
    );
    let signatures: Vec<_> = ranked.iter().map(|c| c.signature().unwrap().to_vec()).collect();
    assert_eq!(signatures, vec![vec!["String"], vec!["int"]]);
}

#[test]
fn concurrent_ranking_matches_sequential_ranking() {
    let engine = RankingEngine::default();
    let build = || {
        let slow = FnSource::new("slow", {
            let mut pending = vec![local("zeta"), local("eta")];
            move |_: &CancellationToken| {
                std::thread::sleep(Duration::from_millis(20));
                Ok(pending.pop())
            }
        });
        sources([
            Box::new(slow),
            iter_source("types", vec![Candidate::ty(TypeKind::Class, "java.util.List")]),
            iter_source("keywords", vec![Candidate::keyword("else")]),
        ])
    };

    let sequential = engine.rank(build(), &query(""));
    let scheduler = scheduler();
    let query = query("");
    let concurrent = scheduler
        .io_handle()
        .block_on(engine.rank_on(&scheduler, build(), &query));

    assert_eq!(names(&sequential), vec!["eta", "zeta", "else", "List"]);
    assert_eq!(concurrent, sequential);
}

#[test]
fn prefix_filter_follows_match_mode() {
    let candidates = || {
        sources([iter_source(
            "members",
            vec![
                Candidate::method("getName", Vec::<&str>::new()),
                Candidate::method("getNameCount", Vec::<&str>::new()),
                local("genre"),
                local("signum"),
            ],
        )])
    };

    let camel = RankingEngine::default();
    assert_eq!(
        names(&camel.rank(candidates(), &query("gNC"))),
        vec!["getNameCount"]
    );

    let prefix = RankingEngine::new(RankingConfig {
        match_mode: MatchMode::Prefix,
        ..RankingConfig::default()
    });
    assert_eq!(
        names(&prefix.rank(candidates(), &query("ge"))),
        vec!["genre", "getName", "getNameCount"]
    );

    let subsequence = RankingEngine::new(RankingConfig {
        match_mode: MatchMode::Subsequence,
        ..RankingConfig::default()
    });
    assert_eq!(
        names(&subsequence.rank(candidates(), &query("gn"))),
        vec!["genre", "signum", "getName", "getNameCount"]
    );
}
