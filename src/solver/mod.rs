//! Join-path solver.
//!
//! ```text
//! JoinGraph ──▶ ShortestPaths ──▶ Steiner search ──▶ path expansion ──▶ combination
//!                                  (search.rs)        (expand.rs)        (combine.rs)
//!                                        │                 │                  │
//!                                        └──── progress events / cancellation ┘
//! ```
//!
//! The solver runs either synchronously ([`JoinSolver::solve`]) or on its own
//! worker thread ([`JoinSolver::spawn`]). A run ends with a [`ResultSet`] or,
//! when cancelled, with [`SolveOutcome::Stopped`]; partial results are never
//! handed out. A worker that dies is reported as [`SolveOutcome::Failed`].

pub mod combine;
pub mod expand;
pub mod progress;
pub mod report;
pub mod search;
pub mod steiner;
mod worker;

pub use combine::{JoinSolution, JoinStep, ResultSet};
pub use progress::{CancelToken, Cancelled, Phase, Progress, Reporter, SolverEvent};
pub use search::SteinerCandidate;
pub use worker::SolverHandle;

use std::collections::BTreeMap;

use crate::config::Settings;
use crate::graph::{CostOracle, JoinGraph, ShortestPaths, VertexId};

use self::combine::combine_paths;
use self::expand::{expand_super_edge, CandidatePath};
use self::search::search_steiner_trees;

/// How a solve ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    Found(ResultSet),
    /// Cancelled on request
    Stopped,
    /// The worker thread died without a terminal event
    Failed(String),
}

impl SolveOutcome {
    pub fn is_stopped(&self) -> bool {
        matches!(self, SolveOutcome::Stopped)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SolveOutcome::Failed(_))
    }

    pub fn results(&self) -> Option<&ResultSet> {
        match self {
            SolveOutcome::Found(results) => Some(results),
            _ => None,
        }
    }

    pub fn into_results(self) -> Option<ResultSet> {
        match self {
            SolveOutcome::Found(results) => Some(results),
            _ => None,
        }
    }
}

/// Finds join paths connecting the terminals of a [`JoinGraph`].
#[derive(Debug, Clone)]
pub struct JoinSolver {
    graph: JoinGraph,
    settings: Settings,
}

impl JoinSolver {
    pub fn new(graph: JoinGraph, settings: Settings) -> Self {
        Self { graph, settings }
    }

    pub fn graph(&self) -> &JoinGraph {
        &self.graph
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run the solver on the calling thread.
    pub fn solve(&self, reporter: &Reporter) -> SolveOutcome {
        match self.run(reporter) {
            Ok(results) => {
                log::info!("solve finished with {} join path(s)", results.len());
                SolveOutcome::Found(results)
            }
            Err(Cancelled) => {
                log::info!("solve stopped on request");
                SolveOutcome::Stopped
            }
        }
    }

    fn run(&self, reporter: &Reporter) -> Result<ResultSet, Cancelled> {
        let graph = &self.graph;
        let solver_settings = &self.settings.solver;

        if graph.is_degenerate() {
            log::debug!(
                "{} connected terminal(s), nothing to search",
                graph.terminals().len()
            );
            return Ok(ResultSet::new());
        }

        reporter.check()?;
        let oracle = ShortestPaths::compute(graph);
        reporter.check()?;

        let trees = search_steiner_trees(graph, &oracle, solver_settings, reporter)?;
        let slack = solver_settings.effective_slack();
        log::debug!(
            "expanding {} Steiner tree(s) with path slack {}",
            trees.len(),
            slack
        );

        // Super-edges recur across trees; expand each once
        let mut expanded: BTreeMap<(VertexId, VertexId), Vec<CandidatePath>> = BTreeMap::new();
        let mut results = ResultSet::new();

        for (index, tree) in trees.iter().enumerate() {
            reporter.check()?;

            let Some(options) =
                self.expand_tree(&oracle, tree, index, trees.len(), slack, &mut expanded, reporter)?
            else {
                log::debug!("tree {} has a super-edge without viable path", index + 1);
                continue;
            };

            reporter.progress(Progress::CombinationRound {
                tree: index + 1,
                trees: trees.len(),
            });
            let accepted = combine_paths(graph, tree, &options, &mut results, reporter)?;
            log::debug!(
                "tree {} (cost {}): {} combination(s) accepted",
                index + 1,
                tree.cost,
                accepted
            );

            reporter.progress(Progress::PathsFound {
                count: results.len(),
            });
        }

        Ok(results)
    }

    /// Candidate paths for every super-edge of `tree`.
    ///
    /// `Ok(None)` when some super-edge cannot be expanded within its budget.
    #[allow(clippy::too_many_arguments)]
    fn expand_tree(
        &self,
        oracle: &ShortestPaths,
        tree: &SteinerCandidate,
        index: usize,
        trees: usize,
        slack: u32,
        expanded: &mut BTreeMap<(VertexId, VertexId), Vec<CandidatePath>>,
        reporter: &Reporter,
    ) -> Result<Option<Vec<Vec<CandidatePath>>>, Cancelled> {
        let graph = &self.graph;
        let mut options = Vec::with_capacity(tree.super_edges.len());

        for (edge_index, &(from, to)) in tree.super_edges.iter().enumerate() {
            reporter.check()?;
            reporter.progress(Progress::SuperEdgeRound {
                tree: index + 1,
                trees,
                edge: edge_index + 1,
                edges: tree.super_edges.len(),
            });

            if !expanded.contains_key(&(from, to)) {
                let paths = match oracle.cost(from, to) {
                    Some(minimum) => expand_super_edge(
                        graph,
                        oracle,
                        from,
                        to,
                        minimum.saturating_add(slack),
                        reporter.cancel_token(),
                    )?,
                    None => Vec::new(),
                };

                reporter.progress(Progress::SubPathCount {
                    from: graph.table_name(from).to_string(),
                    to: graph.table_name(to).to_string(),
                    paths: paths.len(),
                });
                reporter.touch(Phase::Expansion, || {
                    let mut tables: Vec<VertexId> = paths
                        .iter()
                        .flat_map(|p| p.intermediates.iter().copied())
                        .collect();
                    tables.sort_unstable();
                    tables.dedup();
                    tables
                        .into_iter()
                        .map(|v| graph.table_name(v).to_string())
                        .collect()
                });

                expanded.insert((from, to), paths);
            }

            match expanded.get(&(from, to)) {
                Some(paths) if !paths.is_empty() => options.push(paths.clone()),
                _ => return Ok(None),
            }
        }

        Ok(Some(options))
    }
}
