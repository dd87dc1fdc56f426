//! Error types for building the join graph.

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors raised while turning a snapshot into a join graph.
///
/// Only malformed input ends up here. Degenerate searches (fewer than two
/// connected tables) and unsupported relationship kinds are not errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// A required table is not part of the snapshot.
    #[error("Unknown table: '{0}'")]
    UnknownTable(String),

    /// Two snapshot tables share a qualified name.
    #[error("Duplicate table: '{0}'")]
    DuplicateTable(String),

    /// A relationship points at a table that is not part of the snapshot.
    #[error("Relationship '{relationship}' references unknown table '{table}'")]
    DanglingRelationship { relationship: String, table: String },

    /// A cost rule pattern could not be compiled.
    #[error("Invalid cost rule pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}
