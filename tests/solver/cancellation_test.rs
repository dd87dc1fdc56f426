// tests/solver/cancellation_test.rs
use std::time::{Duration, Instant};

use joinpath::config::{Settings, VisualizationSettings};
use joinpath::graph::JoinGraph;
use joinpath::schema::{RelationshipDef, SchemaSnapshot};
use joinpath::solver::{CancelToken, JoinSolver, Phase, Reporter, SolveOutcome, SolverEvent};

/// a, b, c each joined to two alternative hubs.
fn twin_hubs() -> SchemaSnapshot {
    let mut snapshot = SchemaSnapshot::new().with_tables("s", &["a", "b", "c", "hub1", "hub2"]);
    for table in ["a", "b", "c"] {
        for hub in ["hub1", "hub2"] {
            snapshot = snapshot.with_relationship(RelationshipDef::foreign_key(
                format!("{}_{}", table, hub),
                format!("s.{}", table),
                format!("s.{}", hub),
            ));
        }
    }
    snapshot
}

/// Settings that pause on every touched-table event.
fn slow_settings() -> Settings {
    Settings {
        visualization: VisualizationSettings {
            enabled: true,
            step_delay_ms: 200,
        },
        ..Settings::default()
    }
}

fn solver(settings: Settings) -> JoinSolver {
    let graph = JoinGraph::build(&twin_hubs(), &["s.a", "s.b", "s.c"], &settings).unwrap();
    JoinSolver::new(graph, settings)
}

#[test]
fn test_cancel_before_start() {
    let cancel = CancelToken::new();
    cancel.cancel();

    let outcome = solver(Settings::default()).solve(&Reporter::silent(cancel));

    assert_eq!(outcome, SolveOutcome::Stopped);
    assert!(outcome.results().is_none());
}

#[test]
fn test_uncancelled_run_finishes() {
    let outcome = solver(Settings::default()).spawn().unwrap().wait();

    assert!(!outcome.is_stopped());
    assert_eq!(outcome.results().unwrap().len(), 2);
}

#[tokio::test]
async fn test_cancel_during_steiner_search() {
    let mut handle = solver(slow_settings()).spawn().unwrap();

    let mut touched = false;
    while let Some(event) = handle.next_event().await {
        match event {
            SolverEvent::Touched {
                phase: Phase::Steiner,
                ..
            } => {
                touched = true;
                handle.cancel();
                break;
            }
            SolverEvent::Finished(_) | SolverEvent::Stopped => break,
            _ => {}
        }
    }
    assert!(touched);

    let outcome = handle.finish().await;
    assert!(outcome.is_stopped());
}

#[test]
fn test_cancel_from_another_thread() {
    let handle = solver(slow_settings()).spawn().unwrap();
    let token = handle.cancel_token();

    let canceller = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(10));
        token.cancel();
    });

    let outcome = handle.wait();
    canceller.join().unwrap();

    // The first touched-table pause outlasts the canceller's delay
    assert!(outcome.is_stopped());
    assert!(!outcome.is_failed());
}

#[test]
fn test_drop_cancels_and_joins() {
    let mut handle = solver(slow_settings()).spawn().unwrap();

    // Wait for the worker to be inside its first pause
    loop {
        match handle.blocking_next_event() {
            Some(SolverEvent::Touched { .. }) => break,
            Some(SolverEvent::Finished(_)) | Some(SolverEvent::Stopped) | None => {
                panic!("solve ended before the first touched event")
            }
            Some(_) => {}
        }
    }

    let started = Instant::now();
    drop(handle);

    // One pause at most, never the whole visualized run
    assert!(started.elapsed() < Duration::from_secs(2));
}
