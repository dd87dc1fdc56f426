//! # joinpath
//!
//! Automatic join-path solver: given a schema snapshot and a set of required
//! tables, find the cheapest ways of joining them through foreign keys.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 SchemaSnapshot (JSON)                    │
//! │        (tables, relationships, comments, kinds)          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [graph builder + cost rules]
//! ┌─────────────────────────────────────────────────────────┐
//! │        JoinGraph (connected component, terminals)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [shortest paths]
//! ┌─────────────────────────────────────────────────────────┐
//! │     Steiner search → path expansion → combination        │
//! │          (progress events, cancellation)                 │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                  ResultSet (by cost)                     │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod graph;
pub mod schema;
pub mod solver;

pub use config::Settings;
pub use graph::{GraphError, JoinGraph};
pub use schema::SchemaSnapshot;
pub use solver::{JoinSolution, JoinSolver, ResultSet, SolveOutcome};
