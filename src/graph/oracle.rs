//! All-pairs shortest path costs.
//!
//! The solver only needs `cost(u, v)`; [`ShortestPaths`] fills a dense matrix
//! up front by running petgraph's Dijkstra from every vertex.

use petgraph::algo::dijkstra;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

use super::{JoinGraph, VertexId};

/// Minimum total edge weight between any two vertices.
pub trait CostOracle {
    /// `None` when `to` is unreachable from `from`.
    fn cost(&self, from: VertexId, to: VertexId) -> Option<u32>;

    fn vertex_count(&self) -> usize;
}

const UNREACHABLE: u32 = u32::MAX;

/// Dense all-pairs distance matrix.
#[derive(Debug, Clone)]
pub struct ShortestPaths {
    n: usize,
    dist: Vec<u32>,
}

impl ShortestPaths {
    /// Compute distances for every pair of vertices.
    pub fn compute(graph: &JoinGraph) -> Self {
        let n = graph.vertex_count();
        let mut dist = vec![UNREACHABLE; n * n];

        for source in 0..n {
            let costs = dijkstra(graph.graph(), NodeIndex::new(source), None, |e| {
                u64::from(e.weight().weight)
            });
            for (node, cost) in costs {
                dist[source * n + node.index()] = u32::try_from(cost).unwrap_or(UNREACHABLE - 1);
            }
        }

        Self { n, dist }
    }
}

impl CostOracle for ShortestPaths {
    fn cost(&self, from: VertexId, to: VertexId) -> Option<u32> {
        if from >= self.n || to >= self.n {
            return None;
        }
        match self.dist[from * self.n + to] {
            UNREACHABLE => None,
            cost => Some(cost),
        }
    }

    fn vertex_count(&self) -> usize {
        self.n
    }
}
