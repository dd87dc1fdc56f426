//! K-bounded path expansion of a super-edge.
//!
//! Enumerates every simple path between the two points of a super-edge whose
//! weight stays within the budget. An edge `(s, c)` is only followed when it
//! is itself a shortest connection (`weight == cost(s, c)`) and the target is
//! still reachable from `c` within what is left of the budget.

use crate::graph::{CostOracle, EdgeId, JoinGraph, VertexId};

use super::progress::{CancelToken, Cancelled};

/// A concrete path for a super-edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePath {
    /// Edges from start to target
    pub edges: Vec<EdgeId>,
    /// Vertices strictly between start and target, in path order
    pub intermediates: Vec<VertexId>,
    pub cost: u32,
}

/// A path under construction.
#[derive(Debug, Clone)]
struct PartialPath {
    edges: Vec<EdgeId>,
    /// Every vertex on the path, start included
    visited: Vec<VertexId>,
    cost: u64,
}

impl PartialPath {
    fn last(&self) -> VertexId {
        self.visited[self.visited.len() - 1]
    }

    fn extend(&mut self, hop: Hop) {
        self.edges.push(hop.edge);
        self.visited.push(hop.to);
        self.cost += u64::from(hop.weight);
    }

    fn into_candidate(self) -> CandidatePath {
        let end = self.visited.len().saturating_sub(1);
        let intermediates = if end > 1 {
            self.visited[1..end].to_vec()
        } else {
            Vec::new()
        };

        CandidatePath {
            edges: self.edges,
            intermediates,
            cost: u32::try_from(self.cost).unwrap_or(u32::MAX),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Hop {
    edge: EdgeId,
    to: VertexId,
    weight: u32,
}

/// Bounds shared by every hop of one expansion.
struct Expansion<'a, O: ?Sized> {
    graph: &'a JoinGraph,
    oracle: &'a O,
    start: VertexId,
    target: VertexId,
    budget: u64,
}

impl<O: CostOracle + ?Sized> Expansion<'_, O> {
    /// Valid next hops from the end of `path`.
    fn hops(&self, path: &PartialPath) -> Vec<Hop> {
        let source = path.last();
        let remaining = self.budget.saturating_sub(path.cost);

        self.graph
            .neighbors(source)
            .filter_map(|(edge, candidate, data)| {
                if candidate == self.start || path.visited.contains(&candidate) {
                    return None;
                }
                if candidate != self.target && self.graph.is_terminal(candidate) {
                    return None;
                }

                let direct = self.oracle.cost(source, candidate)?;
                if data.weight != direct {
                    return None;
                }

                let rest = self.oracle.cost(candidate, self.target)?;
                if u64::from(direct) + u64::from(rest) > remaining {
                    return None;
                }

                Some(Hop {
                    edge,
                    to: candidate,
                    weight: data.weight,
                })
            })
            .collect()
    }
}

/// Enumerate every simple path from `start` to `target` with weight at most `budget`.
///
/// Intermediate vertices are never terminals and never `start`.
pub fn expand_super_edge<O>(
    graph: &JoinGraph,
    oracle: &O,
    start: VertexId,
    target: VertexId,
    budget: u32,
    cancel: &CancelToken,
) -> Result<Vec<CandidatePath>, Cancelled>
where
    O: CostOracle + ?Sized,
{
    if start == target {
        return Ok(Vec::new());
    }

    let expansion = Expansion {
        graph,
        oracle,
        start,
        target,
        budget: u64::from(budget),
    };

    let mut frontier = vec![PartialPath {
        edges: Vec::new(),
        visited: vec![start],
        cost: 0,
    }];

    while frontier.iter().any(|p| p.last() != target) {
        cancel.check()?;

        let mut next = Vec::with_capacity(frontier.len());
        for mut path in frontier {
            if path.last() == target {
                next.push(path);
                continue;
            }
            cancel.check()?;

            let hops = expansion.hops(&path);
            let Some((first, rest)) = hops.split_first() else {
                // Dead end
                continue;
            };

            let branches: Vec<PartialPath> = rest
                .iter()
                .map(|hop| {
                    let mut branch = path.clone();
                    branch.extend(*hop);
                    branch
                })
                .collect();

            path.extend(*first);
            next.push(path);
            next.extend(branches);
        }

        frontier = next;
    }

    Ok(frontier
        .into_iter()
        .map(PartialPath::into_candidate)
        .collect())
}
