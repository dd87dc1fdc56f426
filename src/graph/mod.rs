//! Join graph - the solver's working view of a schema snapshot.
//!
//! The module is organized into submodules:
//! - `builder`: snapshot → graph, connectivity classification
//! - `cost`: edge weight policy and wildcard cost rules
//! - `oracle`: all-pairs shortest path costs
//!
//! Vertices are dense indices `0..n` over the tables of the component that
//! holds the required tables; petgraph node indices coincide with them.

mod builder;
pub mod cost;
mod error;
pub mod oracle;


pub use cost::EdgeCostPolicy;
pub use error::{GraphError, GraphResult};
pub use oracle::{CostOracle, ShortestPaths};

use std::collections::HashMap;

use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use crate::schema::{RelationshipId, RelationshipKind};

/// Dense vertex index.
pub type VertexId = usize;

/// Edge index in the working graph.
pub type EdgeId = usize;

/// Edge data: which relationship the join uses and what it costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinEdge {
    pub relationship: RelationshipId,
    pub weight: u32,
}

/// Non-fatal findings while building the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    /// The relationship kind cannot be joined across and was left out.
    UnsupportedRelationship {
        relationship: String,
        kind: RelationshipKind,
    },
}

impl std::fmt::Display for Advisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Advisory::UnsupportedRelationship { relationship, kind } => write!(
                f,
                "Relationship '{}' of kind {} is not supported for joins and was ignored",
                relationship, kind
            ),
        }
    }
}

/// Undirected weighted multigraph over the connected tables.
#[derive(Debug, Clone, Default)]
pub struct JoinGraph {
    /// Node weight is the qualified table name
    graph: UnGraph<String, JoinEdge>,

    /// Qualified table name → vertex
    vertex_index: HashMap<String, VertexId>,

    /// Connected required tables, in request order
    terminals: Vec<VertexId>,

    /// Per-vertex terminal flag
    is_terminal: Vec<bool>,

    /// Required tables outside the connected component
    disconnected: Vec<String>,

    advisories: Vec<Advisory>,
}

impl JoinGraph {
    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Qualified table name of a vertex.
    pub fn table_name(&self, vertex: VertexId) -> &str {
        &self.graph[NodeIndex::new(vertex)]
    }

    /// Vertex of a qualified table name, if it is part of the graph.
    pub fn vertex(&self, table: &str) -> Option<VertexId> {
        self.vertex_index.get(table).copied()
    }

    pub fn terminals(&self) -> &[VertexId] {
        &self.terminals
    }

    pub fn is_terminal(&self, vertex: VertexId) -> bool {
        self.is_terminal.get(vertex).copied().unwrap_or(false)
    }

    /// Every vertex that is not a terminal, ascending.
    pub fn non_terminals(&self) -> Vec<VertexId> {
        (0..self.vertex_count())
            .filter(|v| !self.is_terminal(*v))
            .collect()
    }

    /// Required tables that could not be connected to the others.
    pub fn disconnected(&self) -> &[String] {
        &self.disconnected
    }

    pub fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }

    /// Fewer than two connected terminals: nothing to search.
    pub fn is_degenerate(&self) -> bool {
        self.terminals.len() < 2
    }

    /// Endpoints and data of an edge.
    pub fn edge(&self, edge: EdgeId) -> Option<(VertexId, VertexId, JoinEdge)> {
        let idx = EdgeIndex::new(edge);
        let (a, b) = self.graph.edge_endpoints(idx)?;
        let data = *self.graph.edge_weight(idx)?;
        Some((a.index(), b.index(), data))
    }

    /// Weight of an edge (0 for an unknown edge).
    pub fn edge_weight(&self, edge: EdgeId) -> u32 {
        self.graph
            .edge_weight(EdgeIndex::new(edge))
            .map(|e| e.weight)
            .unwrap_or(0)
    }

    /// Edges incident to `vertex` as `(edge, neighbor, data)`.
    pub fn neighbors(&self, vertex: VertexId) -> impl Iterator<Item = (EdgeId, VertexId, JoinEdge)> + '_ {
        let node = NodeIndex::new(vertex);
        self.graph.edges(node).map(move |edge_ref| {
            let other = if edge_ref.source() == node {
                edge_ref.target()
            } else {
                edge_ref.source()
            };
            (edge_ref.id().index(), other.index(), *edge_ref.weight())
        })
    }

    /// The underlying petgraph graph.
    pub fn graph(&self) -> &UnGraph<String, JoinEdge> {
        &self.graph
    }
}
