//! Plain-text rendering of solver results.

use std::fmt::Write;

use crate::schema::SchemaSnapshot;

use super::combine::{JoinSolution, ResultSet};

/// Render one solution, one join per line.
pub fn render_solution(rank: usize, solution: &JoinSolution, snapshot: &SchemaSnapshot) -> String {
    let mut out = String::new();
    let list = |tables: &[String]| {
        if tables.is_empty() {
            "-".to_string()
        } else {
            tables.join(", ")
        }
    };

    let _ = writeln!(out, "#{} cost {}", rank, solution.cost);
    let _ = writeln!(out, "  steiner: {}", list(&solution.steiner_tables));
    let _ = writeln!(out, "  via: {}", list(&solution.via_tables));
    for join in &solution.joins {
        match snapshot.relationship(join.relationship) {
            Some(rel) => {
                let _ = writeln!(
                    out,
                    "  {} -> {} [{}] ({})",
                    rel.from, rel.to, rel.name, join.weight
                );
            }
            None => {
                let _ = writeln!(out, "  <relationship {}> ({})", join.relationship, join.weight);
            }
        }
    }
    out
}

/// Render every solution in cost order.
pub fn render_results(results: &ResultSet, snapshot: &SchemaSnapshot) -> String {
    if results.is_empty() {
        return "no join paths found\n".to_string();
    }

    results
        .iter()
        .enumerate()
        .map(|(i, solution)| render_solution(i + 1, solution, snapshot))
        .collect::<Vec<_>>()
        .join("\n")
}
