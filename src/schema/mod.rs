//! Schema snapshot consumed by the join-path solver.
//!
//! A snapshot is a flat list of tables and the relationships between them,
//! captured once per solve. Tables are addressed by their qualified name
//! (`schema.table`); relationships are addressed by their position in the
//! snapshot (`RelationshipId`), which is the handle solutions hand back.

mod loader;

pub use loader::{SnapshotError, SnapshotResult};

use serde::{Deserialize, Serialize};

/// Index of a relationship inside [`SchemaSnapshot::relationships`].
pub type RelationshipId = usize;

/// A table in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
    /// Schema (namespace) the table lives in
    pub schema: String,
    /// Table name, unqualified
    pub name: String,
    /// Table comment
    #[serde(default)]
    pub comment: Option<String>,
    /// Comment of the owning schema
    #[serde(default)]
    pub schema_comment: Option<String>,
}

impl TableDef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            comment: None,
            schema_comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_schema_comment(mut self, comment: impl Into<String>) -> Self {
        self.schema_comment = Some(comment.into());
        self
    }

    /// `schema.table`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}

/// Kind of a relationship between two tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    /// Plain foreign key constraint
    ForeignKey,
    /// One-to-one relationship
    OneToOne,
    /// One-to-many relationship
    OneToMany,
    /// Many-to-many relationship (needs a link table, not joinable directly)
    ManyToMany,
    /// Table inheritance
    Inheritance,
    /// Table partitioning
    Partitioning,
    /// Generalization / copy relationship
    Generalization,
}

impl RelationshipKind {
    /// Can the solver join across a relationship of this kind?
    pub fn is_traversable(&self) -> bool {
        matches!(
            self,
            RelationshipKind::ForeignKey | RelationshipKind::OneToOne | RelationshipKind::OneToMany
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::ForeignKey => "foreign_key",
            RelationshipKind::OneToOne => "one_to_one",
            RelationshipKind::OneToMany => "one_to_many",
            RelationshipKind::ManyToMany => "many_to_many",
            RelationshipKind::Inheritance => "inheritance",
            RelationshipKind::Partitioning => "partitioning",
            RelationshipKind::Generalization => "generalization",
        }
    }
}

impl std::fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Constraint backing a relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintDef {
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
}

fn default_visible() -> bool {
    true
}

/// A relationship between two tables, referenced by qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipDef {
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
    pub kind: RelationshipKind,
    /// Qualified name of the referencing table
    pub from: String,
    /// Qualified name of the referenced table
    pub to: String,
    #[serde(default)]
    pub constraint: Option<ConstraintDef>,
    /// Whether the relationship is shown in the model view
    #[serde(default = "default_visible")]
    pub visible: bool,
}

impl RelationshipDef {
    pub fn new(
        name: impl Into<String>,
        kind: RelationshipKind,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            comment: None,
            kind,
            from: from.into(),
            to: to.into(),
            constraint: None,
            visible: true,
        }
    }

    /// Shorthand for a foreign key relationship.
    pub fn foreign_key(
        name: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self::new(name, RelationshipKind::ForeignKey, from, to)
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_constraint(mut self, name: impl Into<String>, comment: Option<&str>) -> Self {
        self.constraint = Some(ConstraintDef {
            name: name.into(),
            comment: comment.map(str::to_string),
        });
        self
    }

    /// Mark the relationship as hidden in the model view.
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// Tables and relationships captured for one solve.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    #[serde(default)]
    pub tables: Vec<TableDef>,
    #[serde(default)]
    pub relationships: Vec<RelationshipDef>,
}

impl SchemaSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: TableDef) -> Self {
        self.tables.push(table);
        self
    }

    /// Add several tables of the same schema.
    pub fn with_tables(mut self, schema: &str, names: &[&str]) -> Self {
        self.tables
            .extend(names.iter().map(|name| TableDef::new(schema, *name)));
        self
    }

    pub fn with_relationship(mut self, relationship: RelationshipDef) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Look up a table by qualified name.
    pub fn table(&self, qualified_name: &str) -> Option<&TableDef> {
        self.tables
            .iter()
            .find(|t| t.qualified_name() == qualified_name)
    }

    pub fn relationship(&self, id: RelationshipId) -> Option<&RelationshipDef> {
        self.relationships.get(id)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }
}
