use super::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn event(sql: &str, outcome: QueryOutcome) -> QueryEvent {
    QueryEvent::new("clickhouse", sql, 0, Duration::from_millis(3), outcome)
}

#[test]
fn test_query_kind_detection() {
    assert_eq!(QueryKind::from_sql("SELECT * FROM events"), QueryKind::Select);
    assert_eq!(QueryKind::from_sql("  select 1"), QueryKind::Select);
    assert_eq!(QueryKind::from_sql("(SELECT 1) UNION ALL (SELECT 2)"), QueryKind::Select);
    assert_eq!(QueryKind::from_sql("WITH 1 AS x SELECT x"), QueryKind::Select);
    assert_eq!(
        QueryKind::from_sql("-- comment\nINSERT INTO events (a) VALUES (1)"),
        QueryKind::Insert
    );
    assert_eq!(
        QueryKind::from_sql("/* hint */ ALTER TABLE events DELETE WHERE 1"),
        QueryKind::Alter
    );
    assert_eq!(QueryKind::from_sql("CREATE TABLE t (a UInt8) ENGINE = Memory"), QueryKind::Ddl);
    assert_eq!(QueryKind::from_sql("OPTIMIZE TABLE events FINAL"), QueryKind::Other);
}

#[test]
fn test_outcome_error_truncation() {
    let long = "x".repeat(1000);
    match QueryOutcome::error(long) {
        QueryOutcome::Error(msg) => {
            assert_eq!(msg.len(), 512 + 3);
            assert!(msg.ends_with("..."));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn test_tracing_dispatcher_truncation() {
    let dispatcher = TracingDispatcher::new().max_sql_length(10);
    assert_eq!(dispatcher.truncate_sql("SELECT * FROM events"), "SELECT * F...");
    assert_eq!(dispatcher.truncate_sql("SELECT 1"), "SELECT 1");
    assert_eq!(
        TracingDispatcher::new().no_truncate().truncate_sql(&"a".repeat(300)).len(),
        300
    );
}

#[test]
fn test_collecting_dispatcher() {
    let collector = CollectingDispatcher::new();
    collector.dispatch(&event("SELECT 1", QueryOutcome::Rows(1)));
    collector.dispatch(&event("SELECT 2", QueryOutcome::Rows(1)));
    assert_eq!(collector.statements(), vec!["SELECT 1", "SELECT 2"]);

    collector.clear();
    assert!(collector.events().is_empty());
}

#[test]
fn test_composite_dispatcher_fans_out() {
    let counter = Arc::new(AtomicUsize::new(0));
    let c1 = counter.clone();
    let c2 = counter.clone();
    let composite = CompositeDispatcher::new()
        .add(move |_: &QueryEvent| {
            c1.fetch_add(1, Ordering::SeqCst);
        })
        .add(move |_: &QueryEvent| {
            c2.fetch_add(10, Ordering::SeqCst);
        })
        .add(NoopDispatcher);

    assert_eq!(composite.len(), 3);
    composite.dispatch(&event("SELECT 1", QueryOutcome::Done));
    assert_eq!(counter.load(Ordering::SeqCst), 11);
}
