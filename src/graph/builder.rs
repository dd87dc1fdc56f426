//! Builds a [`JoinGraph`] from a schema snapshot.
//!
//! Traversable relationships become weighted edges. Connectivity is
//! classified with an explicit-stack depth-first traversal starting from the
//! required tables; the component holding the most required tables becomes the
//! working graph and every other required table is reported as disconnected.

use std::collections::{HashMap, HashSet};

use petgraph::graph::{NodeIndex, UnGraph};

use crate::config::Settings;
use crate::schema::SchemaSnapshot;

use super::{Advisory, EdgeCostPolicy, GraphError, GraphResult, JoinEdge, JoinGraph};

/// A traversable relationship resolved to snapshot table positions.
struct ResolvedEdge {
    from: usize,
    to: usize,
    edge: JoinEdge,
}

/// Component labels produced by [`label_components`].
struct Components {
    /// Snapshot table position → component id
    label: Vec<Option<usize>>,
}

/// Label the components reachable from `roots`, in root order.
///
/// Tables not reachable from any root stay unlabeled.
fn label_components(adjacency: &[Vec<usize>], roots: &[usize]) -> Components {
    let mut label: Vec<Option<usize>> = vec![None; adjacency.len()];
    let mut stack: Vec<usize> = Vec::new();
    let mut next_component = 0;

    for &root in roots {
        if label[root].is_some() {
            continue;
        }

        label[root] = Some(next_component);
        stack.push(root);

        while let Some(table) = stack.pop() {
            for &neighbor in &adjacency[table] {
                if label[neighbor].is_none() {
                    label[neighbor] = Some(next_component);
                    stack.push(neighbor);
                }
            }
        }

        next_component += 1;
    }

    Components { label }
}

impl JoinGraph {
    /// Build the join graph for `required` tables using the given settings.
    pub fn build<S: AsRef<str>>(
        snapshot: &SchemaSnapshot,
        required: &[S],
        settings: &Settings,
    ) -> GraphResult<Self> {
        let policy = EdgeCostPolicy::from_settings(&settings.costs)?;
        Self::build_with_policy(
            snapshot,
            required,
            &policy,
            settings.solver.visible_relationships_only,
        )
    }

    /// Build the join graph with an already compiled cost policy.
    pub fn build_with_policy<S: AsRef<str>>(
        snapshot: &SchemaSnapshot,
        required: &[S],
        policy: &EdgeCostPolicy,
        visible_only: bool,
    ) -> GraphResult<Self> {
        let mut table_positions: HashMap<String, usize> =
            HashMap::with_capacity(snapshot.tables.len());
        for (pos, table) in snapshot.tables.iter().enumerate() {
            let name = table.qualified_name();
            if table_positions.contains_key(&name) {
                return Err(GraphError::DuplicateTable(name));
            }
            table_positions.insert(name, pos);
        }

        // Resolve required tables, dropping repeats
        let mut seen = HashSet::new();
        let mut required_positions = Vec::new();
        for name in required {
            let name = name.as_ref();
            let pos = *table_positions
                .get(name)
                .ok_or_else(|| GraphError::UnknownTable(name.to_string()))?;
            if seen.insert(pos) {
                required_positions.push(pos);
            }
        }

        let mut advisories = Vec::new();
        let mut resolved = Vec::new();

        for (id, rel) in snapshot.relationships.iter().enumerate() {
            if !rel.kind.is_traversable() {
                let advisory = Advisory::UnsupportedRelationship {
                    relationship: rel.name.clone(),
                    kind: rel.kind,
                };
                log::warn!("{}", advisory);
                advisories.push(advisory);
                continue;
            }

            if visible_only && !rel.visible {
                log::debug!("skipping hidden relationship '{}'", rel.name);
                continue;
            }

            let lookup = |table: &str| {
                table_positions
                    .get(table)
                    .copied()
                    .ok_or_else(|| GraphError::DanglingRelationship {
                        relationship: rel.name.clone(),
                        table: table.to_string(),
                    })
            };
            let from = lookup(&rel.from)?;
            let to = lookup(&rel.to)?;

            // A self-reference never helps connect two different tables
            if from == to {
                continue;
            }

            let weight = policy.weight(rel, &snapshot.tables[from], &snapshot.tables[to]);
            resolved.push(ResolvedEdge {
                from,
                to,
                edge: JoinEdge {
                    relationship: id,
                    weight,
                },
            });
        }

        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); snapshot.tables.len()];
        for edge in &resolved {
            adjacency[edge.from].push(edge.to);
            adjacency[edge.to].push(edge.from);
        }

        let components = label_components(&adjacency, &required_positions);

        // Root component: the one holding the most required tables.
        // Components are numbered in request order, so ties favor the earliest.
        let mut required_per_component: HashMap<usize, usize> = HashMap::new();
        for pos in &required_positions {
            if let Some(component) = components.label[*pos] {
                *required_per_component.entry(component).or_default() += 1;
            }
        }
        let root_component = required_per_component
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            .map(|(component, _)| *component);

        let mut graph: UnGraph<String, JoinEdge> = UnGraph::default();
        let mut vertex_of: Vec<Option<usize>> = vec![None; snapshot.tables.len()];
        let mut vertex_index = HashMap::new();

        for (pos, table) in snapshot.tables.iter().enumerate() {
            if root_component.is_some() && components.label[pos] == root_component {
                let name = table.qualified_name();
                let node = graph.add_node(name.clone());
                vertex_of[pos] = Some(node.index());
                vertex_index.insert(name, node.index());
            }
        }

        for edge in &resolved {
            if let (Some(a), Some(b)) = (vertex_of[edge.from], vertex_of[edge.to]) {
                graph.add_edge(NodeIndex::new(a), NodeIndex::new(b), edge.edge);
            }
        }

        let mut terminals = Vec::new();
        let mut disconnected = Vec::new();
        for pos in &required_positions {
            match vertex_of[*pos] {
                Some(vertex) => terminals.push(vertex),
                None => disconnected.push(snapshot.tables[*pos].qualified_name()),
            }
        }

        let mut is_terminal = vec![false; graph.node_count()];
        for vertex in &terminals {
            is_terminal[*vertex] = true;
        }

        if !disconnected.is_empty() {
            log::info!(
                "{} required table(s) not connected to the others: {}",
                disconnected.len(),
                disconnected.join(", ")
            );
        }
        log::debug!(
            "join graph: {} vertices, {} edges, {} terminals",
            graph.node_count(),
            graph.edge_count(),
            terminals.len()
        );

        Ok(JoinGraph {
            graph,
            vertex_index,
            terminals,
            is_terminal,
            disconnected,
            advisories,
        })
    }
}
