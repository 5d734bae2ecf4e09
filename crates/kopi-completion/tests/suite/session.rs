use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use kopi_completion::{CaretContext, CompletionSession, RankingConfig};
use kopi_scheduler::{Scheduler, SchedulerConfig, TaskError};
use pretty_assertions::assert_eq;

use super::support::{counting_source, iter_source, local, names, sources};

fn setup(config: RankingConfig) -> (Scheduler, CompletionSession<&'static str>) {
    let scheduler = Scheduler::new(SchedulerConfig {
        compute_threads: 2,
        io_threads: 1,
    });
    let session = CompletionSession::new(config, scheduler.clone());
    (scheduler, session)
}

fn slow_popup() -> RankingConfig {
    RankingConfig {
        auto_popup_delay_ms: 200,
        ..RankingConfig::default()
    }
}

#[test]
fn explicit_completion_ranks_immediately() {
    let (scheduler, session) = setup(RankingConfig::default());
    let pending = session.complete(
        "A.java",
        CaretContext::new("co", 4),
        sources([iter_source(
            "locals",
            vec![local("count"), local("total"), local("cost")],
        )]),
    );

    let ranked = scheduler.io_handle().block_on(pending).unwrap();
    assert_eq!(names(&ranked), vec!["cost", "count"]);
    assert_eq!(session.live_queries(), 0);
}

#[test]
fn newer_query_supersedes_pending_popup() {
    let (scheduler, session) = setup(slow_popup());
    let calls = Arc::new(AtomicUsize::new(0));

    let first = session
        .on_typed(
            "A.java",
            '.',
            CaretContext::new("", 5),
            sources([counting_source(&calls)]),
        )
        .expect("`.` is a trigger");
    let second = session.complete(
        "A.java",
        CaretContext::new("", 6),
        sources([iter_source("locals", vec![local("x")])]),
    );
    assert!(second.id() > first.id());

    assert_eq!(
        scheduler.io_handle().block_on(first),
        Err(TaskError::Cancelled)
    );
    let ranked = scheduler.io_handle().block_on(second).unwrap();
    assert_eq!(names(&ranked), vec!["x"]);

    std::thread::sleep(std::time::Duration::from_millis(250));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn documents_do_not_cancel_each_other() {
    let (scheduler, session) = setup(RankingConfig::default());
    let a = session.complete(
        "A.java",
        CaretContext::default(),
        sources([iter_source("a", vec![local("a")])]),
    );
    let b = session.complete(
        "B.java",
        CaretContext::default(),
        sources([iter_source("b", vec![local("b")])]),
    );

    assert_eq!(names(&scheduler.io_handle().block_on(a).unwrap()), vec!["a"]);
    assert_eq!(names(&scheduler.io_handle().block_on(b).unwrap()), vec!["b"]);
}

#[test]
fn only_trigger_characters_open_the_popup() {
    let (_scheduler, session) = setup(slow_popup());
    let typed = |ch| {
        session.on_typed(
            "A.java",
            ch,
            CaretContext::default(),
            sources([iter_source("none", Vec::new())]),
        )
    };

    assert!(typed('a').is_none());
    assert!(typed('(').is_none());
    assert!(typed('.').is_some());

    session.reconfigure(RankingConfig {
        auto_popup_on_identifier_part: true,
        ..slow_popup()
    });
    assert!(session.config().auto_popup_on_identifier_part);
    assert!(typed('a').is_some());
    session.cancel_all();
}

#[test]
fn explicit_cancel_resolves_to_cancelled() {
    let (scheduler, session) = setup(slow_popup());
    let pending = session
        .on_typed(
            "A.java",
            '.',
            CaretContext::default(),
            sources([iter_source("locals", vec![local("x")])]),
        )
        .expect("`.` is a trigger");

    assert_eq!(session.live_queries(), 1);
    assert!(session.cancel(&"A.java"));
    assert_eq!(
        scheduler.io_handle().block_on(pending),
        Err(TaskError::Cancelled)
    );
    assert_eq!(session.live_queries(), 0);
    assert!(!session.cancel(&"A.java"));
}
