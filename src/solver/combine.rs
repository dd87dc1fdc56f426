//! Path combination and the ranked result collection.
//!
//! For one Steiner tree, every super-edge has a list of candidate paths. The
//! cross product of those lists yields full join paths; a combination is kept
//! only when no table is reached twice and no intermediate table is one of the
//! tree's Steiner points. Accepted solutions go into a [`ResultSet`], which
//! keeps the collection minimal under edge-set inclusion.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::graph::{JoinGraph, VertexId};
use crate::schema::RelationshipId;

use super::expand::CandidatePath;
use super::progress::{Cancelled, Phase, Progress, Reporter};
use super::search::SteinerCandidate;

/// One join of a solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JoinStep {
    pub relationship: RelationshipId,
    pub weight: u32,
}

/// A complete way of joining the required tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinSolution {
    /// Sum of the join weights
    pub cost: u32,
    /// Steiner points of the underlying tree
    pub steiner_tables: Vec<String>,
    /// Other tables the joins pass through
    pub via_tables: Vec<String>,
    /// Joins in path order
    pub joins: Vec<JoinStep>,
}

impl JoinSolution {
    /// Relationships used by this solution.
    pub fn relationship_set(&self) -> BTreeSet<RelationshipId> {
        self.joins.iter().map(|j| j.relationship).collect()
    }

    /// Does the solution route through `table` (as Steiner or via table)?
    pub fn involves(&self, table: &str) -> bool {
        self.steiner_tables.iter().any(|t| t == table) || self.via_tables.iter().any(|t| t == table)
    }
}

/// Solutions ordered by cost; several may share a cost.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    entries: BTreeMap<u32, Vec<JoinSolution>>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert with dominance pruning.
    ///
    /// Returns `false` when an existing solution uses a subset of the new
    /// one's relationships. Otherwise every existing solution using a proper
    /// superset is removed and the new one is added.
    pub fn insert(&mut self, solution: JoinSolution) -> bool {
        let new_set = solution.relationship_set();

        let mut dominated: Vec<(u32, usize)> = Vec::new();
        for (cost, bucket) in &self.entries {
            for (i, existing) in bucket.iter().enumerate() {
                let existing_set = existing.relationship_set();
                if existing_set.is_subset(&new_set) {
                    return false;
                }
                if new_set.is_subset(&existing_set) {
                    dominated.push((*cost, i));
                }
            }
        }

        // Reverse order keeps the remaining indices of each bucket valid
        for (cost, i) in dominated.into_iter().rev() {
            if let Some(bucket) = self.entries.get_mut(&cost) {
                bucket.remove(i);
                if bucket.is_empty() {
                    self.entries.remove(&cost);
                }
            }
        }

        self.entries
            .entry(solution.cost)
            .or_default()
            .push(solution);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Solutions by ascending cost.
    pub fn iter(&self) -> impl Iterator<Item = &JoinSolution> {
        self.entries.values().flatten()
    }

    /// A cheapest solution.
    pub fn best(&self) -> Option<&JoinSolution> {
        self.iter().next()
    }

    /// Solutions with exactly this cost.
    pub fn with_cost(&self, cost: u32) -> &[JoinSolution] {
        self.entries.get(&cost).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn into_vec(self) -> Vec<JoinSolution> {
        self.entries.into_values().flatten().collect()
    }
}

/// Check one combination and turn it into a solution.
fn build_solution(
    graph: &JoinGraph,
    tree: &SteinerCandidate,
    chosen: &[&CandidatePath],
) -> Option<JoinSolution> {
    let mut via: Vec<VertexId> = chosen
        .iter()
        .flat_map(|p| p.intermediates.iter().copied())
        .collect();
    via.sort_unstable();

    if via.windows(2).any(|w| w[0] == w[1]) {
        return None;
    }
    if via.iter().any(|v| tree.steiner_points.contains(v)) {
        return None;
    }

    let joins: Vec<JoinStep> = chosen
        .iter()
        .flat_map(|p| p.edges.iter())
        .filter_map(|edge| graph.edge(*edge))
        .map(|(_, _, data)| JoinStep {
            relationship: data.relationship,
            weight: data.weight,
        })
        .collect();
    let cost = joins
        .iter()
        .fold(0u32, |sum, j| sum.saturating_add(j.weight));

    Some(JoinSolution {
        cost,
        steiner_tables: tree
            .steiner_points
            .iter()
            .map(|v| graph.table_name(*v).to_string())
            .collect(),
        via_tables: via
            .iter()
            .map(|v| graph.table_name(*v).to_string())
            .collect(),
        joins,
    })
}

/// Combine one path per super-edge in every possible way.
///
/// `options[i]` holds the candidate paths of the i-th super-edge of `tree`.
/// Returns the number of combinations accepted into `results`.
pub fn combine_paths(
    graph: &JoinGraph,
    tree: &SteinerCandidate,
    options: &[Vec<CandidatePath>],
    results: &mut ResultSet,
    reporter: &Reporter,
) -> Result<usize, Cancelled> {
    if options.is_empty() || options.iter().any(Vec::is_empty) {
        return Ok(0);
    }

    let total = options
        .iter()
        .fold(1u64, |acc, o| acc.saturating_mul(o.len() as u64));
    let mut counters = vec![0usize; options.len()];
    let mut current: u64 = 0;
    let mut accepted = 0;

    loop {
        reporter.check()?;
        current += 1;

        let chosen: Vec<&CandidatePath> = counters
            .iter()
            .zip(options)
            .map(|(i, paths)| &paths[*i])
            .collect();

        if let Some(solution) = build_solution(graph, tree, &chosen) {
            let tables = solution.via_tables.clone();
            if results.insert(solution) {
                accepted += 1;
                reporter.touch(Phase::Combination, || tables);
            }
        }

        reporter.progress(Progress::Combination { current, total });

        // Odometer step; done once the first counter wraps
        let mut position = counters.len();
        loop {
            if position == 0 {
                return Ok(accepted);
            }
            position -= 1;
            counters[position] += 1;
            if counters[position] < options[position].len() {
                break;
            }
            counters[position] = 0;
        }
    }
}
