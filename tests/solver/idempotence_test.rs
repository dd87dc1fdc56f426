// tests/solver/idempotence_test.rs
use std::collections::BTreeSet;

use joinpath::config::{Settings, SolverSettings};
use joinpath::graph::JoinGraph;
use joinpath::schema::{RelationshipDef, SchemaSnapshot, TableDef};
use joinpath::solver::{CancelToken, JoinSolver, Reporter};

/// Grid of tables, every cell joined to its right and lower neighbour.
fn grid(size: usize) -> SchemaSnapshot {
    let name = |r: usize, c: usize| format!("g.t{}{}", r, c);
    let mut snapshot = SchemaSnapshot::new();
    for r in 0..size {
        for c in 0..size {
            snapshot = snapshot.with_table(TableDef::new("g", format!("t{}{}", r, c)));
        }
    }
    for r in 0..size {
        for c in 0..size {
            if c + 1 < size {
                snapshot = snapshot.with_relationship(RelationshipDef::foreign_key(
                    format!("h{}{}", r, c),
                    name(r, c),
                    name(r, c + 1),
                ));
            }
            if r + 1 < size {
                snapshot = snapshot.with_relationship(RelationshipDef::foreign_key(
                    format!("v{}{}", r, c),
                    name(r, c),
                    name(r + 1, c),
                ));
            }
        }
    }
    snapshot
}

fn fingerprint(settings: &Settings, required: &[&str]) -> Vec<(u32, BTreeSet<usize>)> {
    let graph = JoinGraph::build(&grid(3), required, settings).unwrap();
    JoinSolver::new(graph, settings.clone())
        .solve(&Reporter::silent(CancelToken::new()))
        .into_results()
        .unwrap()
        .iter()
        .map(|s| (s.cost, s.relationship_set()))
        .collect()
}

#[test]
fn test_repeated_solves_agree() {
    let settings = Settings::default();
    let required = ["g.t00", "g.t22", "g.t02"];

    let first = fingerprint(&settings, &required);
    let second = fingerprint(&settings, &required);

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn test_repeated_exact_solves_agree() {
    let settings = Settings {
        solver: SolverSettings::exact(),
        ..Settings::default()
    };
    let required = ["g.t00", "g.t22", "g.t20"];

    assert_eq!(
        fingerprint(&settings, &required),
        fingerprint(&settings, &required)
    );
}

#[test]
fn test_spawned_and_inline_solves_agree() {
    let settings = Settings::default();
    let required = ["g.t00", "g.t11", "g.t22"];
    let inline = fingerprint(&settings, &required);

    let graph = JoinGraph::build(&grid(3), &required, &settings).unwrap();
    let spawned: Vec<(u32, BTreeSet<usize>)> = JoinSolver::new(graph, settings)
        .spawn()
        .unwrap()
        .wait()
        .into_results()
        .unwrap()
        .iter()
        .map(|s| (s.cost, s.relationship_set()))
        .collect();

    assert_eq!(inline, spawned);
}
