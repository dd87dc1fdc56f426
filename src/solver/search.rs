//! Combinatorial Steiner search.
//!
//! A baseline tree is computed with every non-terminal eligible. Every
//! Steiner point seen so far joins a working list, and each non-empty subset
//! of that list is excluded in turn to discover alternative trees. A pass
//! that turns up new Steiner points triggers another pass over the grown list.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::SolverSettings;
use crate::graph::{CostOracle, JoinGraph, VertexId};

use super::progress::{Cancelled, Phase, Progress, Reporter};
use super::steiner::{steiner_tree, super_edge, SteinerTree};

/// One distinct Steiner tree found by the search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SteinerCandidate {
    pub cost: u32,
    pub steiner_points: BTreeSet<VertexId>,
    pub super_edges: BTreeSet<(VertexId, VertexId)>,
}

type CandidateKey = (BTreeSet<VertexId>, BTreeSet<(VertexId, VertexId)>);

/// Distinct trees keyed by `(steiner_points, super_edges)`.
#[derive(Debug, Default)]
struct Found {
    trees: BTreeMap<CandidateKey, u32>,
}

impl Found {
    /// Record a tree; `true` when its key was new.
    fn record(&mut self, tree: &SteinerTree) -> bool {
        let key = (tree.steiner_points.clone(), tree.super_edges.clone());
        if self.trees.contains_key(&key) {
            return false;
        }
        self.trees.insert(key, tree.cost);
        true
    }

    fn len(&self) -> usize {
        self.trees.len()
    }

    /// Candidates ordered by cost, then key.
    fn into_candidates(self) -> Vec<SteinerCandidate> {
        let mut candidates: Vec<SteinerCandidate> = self
            .trees
            .into_iter()
            .map(|((steiner_points, super_edges), cost)| SteinerCandidate {
                cost,
                steiner_points,
                super_edges,
            })
            .collect();
        candidates.sort_by(|a, b| {
            a.cost
                .cmp(&b.cost)
                .then_with(|| a.steiner_points.cmp(&b.steiner_points))
                .then_with(|| a.super_edges.cmp(&b.super_edges))
        });
        candidates
    }
}

/// Find the candidate Steiner trees connecting the terminals of `graph`.
pub fn search_steiner_trees<O>(
    graph: &JoinGraph,
    oracle: &O,
    settings: &SolverSettings,
    reporter: &Reporter,
) -> Result<Vec<SteinerCandidate>, Cancelled>
where
    O: CostOracle + ?Sized,
{
    let terminals = graph.terminals();

    if terminals.len() < 2 {
        return Ok(Vec::new());
    }

    if let &[a, b] = terminals {
        // Two terminals: the pair itself is the only super-edge
        return Ok(match oracle.cost(a, b) {
            Some(cost) => vec![SteinerCandidate {
                cost,
                steiner_points: BTreeSet::new(),
                super_edges: BTreeSet::from([super_edge(a, b)]),
            }],
            None => Vec::new(),
        });
    }

    let terminal_cap = settings.terminal_cap();
    if terminals.len() > terminal_cap {
        log::warn!(
            "{} connected terminals exceed the cap of {}; skipping the Steiner search",
            terminals.len(),
            terminal_cap
        );
        return Ok(Vec::new());
    }

    let non_terminals = graph.non_terminals();
    let cancel = reporter.cancel_token();

    let Some(baseline) = steiner_tree(oracle, terminals, &non_terminals, cancel)? else {
        log::debug!("terminals cannot be connected by a Steiner tree");
        return Ok(Vec::new());
    };
    log::debug!(
        "baseline Steiner tree: cost {}, {} Steiner point(s)",
        baseline.cost,
        baseline.steiner_points.len()
    );

    let mut found = Found::default();
    found.record(&baseline);

    let limit_reached =
        |found: &Found| !settings.exact && found.len() >= settings.steiner_result_limit;

    let mut working: Vec<VertexId> = baseline.steiner_points.iter().copied().collect();
    let mut seen: BTreeSet<VertexId> = baseline.steiner_points.clone();
    let candidate_cap = settings.candidate_cap();
    let mut round = 0;
    let mut cap_warned = false;

    'rounds: while !limit_reached(&found) {
        round += 1;

        // Safety valve: each pass is 2^n - 1 Steiner tree computations
        let n = working.len().min(candidate_cap);
        if n < working.len() && !cap_warned {
            log::warn!(
                "{} Steiner candidates exceed the cap of {}; ignoring the rest",
                working.len(),
                candidate_cap
            );
            cap_warned = true;
        }

        reporter.progress(Progress::SteinerRound {
            round,
            candidates: n,
        });

        let total: u64 = (1u64 << n) - 1;
        let mut grew = false;

        for mask in 1..=total {
            reporter.check()?;

            let excluded: BTreeSet<VertexId> = (0..n)
                .filter(|bit| mask & (1u64 << bit) != 0)
                .map(|bit| working[bit])
                .collect();
            let eligible: Vec<VertexId> = non_terminals
                .iter()
                .copied()
                .filter(|v| !excluded.contains(v))
                .collect();

            let tree = steiner_tree(oracle, terminals, &eligible, cancel)?;

            reporter.progress(Progress::SteinerCombination {
                round,
                current: mask,
                total,
                found: found.len(),
            });

            let Some(tree) = tree else {
                continue;
            };

            if !settings.exact && tree.cost > baseline.cost {
                continue;
            }

            for point in &tree.steiner_points {
                if seen.insert(*point) {
                    working.push(*point);
                    grew = true;
                }
            }

            if found.record(&tree) {
                reporter.touch(Phase::Steiner, || {
                    tree.steiner_points
                        .iter()
                        .map(|v| graph.table_name(*v).to_string())
                        .collect()
                });

                if limit_reached(&found) {
                    log::debug!("Steiner result limit reached after {} trees", found.len());
                    break 'rounds;
                }
            }
        }

        // Points that only grew past the cap would replay the same pass
        if !grew || n == working.len().min(candidate_cap) {
            break;
        }
    }

    log::debug!(
        "Steiner search finished after {} round(s) with {} candidate tree(s)",
        round,
        found.len()
    );
    Ok(found.into_candidates())
}
