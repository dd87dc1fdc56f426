//! Edge weight policy.
//!
//! The weight of a join is `default_edge_cost`, plus `cross_schema_cost` when
//! the two tables live in different schemas, plus the surcharge of every custom
//! rule whose glob pattern matches. Each rule contributes at most once per edge.

use regex::Regex;

use crate::config::{CostAttribute, CostObject, CostRule, CostSettings};
use crate::schema::{RelationshipDef, TableDef};

use super::{GraphError, GraphResult};

/// Translate a glob pattern (`*`, `?`) into an anchored, case-insensitive regex.
pub fn glob_to_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() + 8);
    regex.push_str("(?i)^");
    for c in pattern.chars() {
        match c {
            '*' => regex.push_str(".*"),
            '?' => regex.push('.'),
            _ => regex.push_str(&regex::escape(&c.to_string())),
        }
    }
    regex.push('$');
    regex
}

#[derive(Debug, Clone)]
struct CompiledRule {
    object: CostObject,
    attribute: CostAttribute,
    matcher: Regex,
    cost: u32,
}

impl CompiledRule {
    fn compile(rule: &CostRule) -> GraphResult<Self> {
        let matcher =
            Regex::new(&glob_to_regex(&rule.pattern)).map_err(|e| GraphError::InvalidPattern {
                pattern: rule.pattern.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            object: rule.object,
            attribute: rule.attribute,
            matcher,
            cost: rule.cost,
        })
    }

    fn is_match(&self, value: Option<&str>) -> bool {
        value.is_some_and(|v| self.matcher.is_match(v))
    }

    /// Does this rule apply to the join `from -[relationship]- to`?
    fn applies(&self, relationship: &RelationshipDef, from: &TableDef, to: &TableDef) -> bool {
        use CostAttribute::{Comment, Name};

        match (self.object, self.attribute) {
            (CostObject::Relationship, Name) => self.is_match(Some(&relationship.name)),
            (CostObject::Relationship, Comment) => self.is_match(relationship.comment.as_deref()),
            (CostObject::Constraint, Name) => {
                self.is_match(relationship.constraint.as_ref().map(|c| c.name.as_str()))
            }
            (CostObject::Constraint, Comment) => self.is_match(
                relationship
                    .constraint
                    .as_ref()
                    .and_then(|c| c.comment.as_deref()),
            ),
            (CostObject::Table, Name) => {
                self.is_match(Some(&from.name)) || self.is_match(Some(&to.name))
            }
            (CostObject::Table, Comment) => {
                self.is_match(from.comment.as_deref()) || self.is_match(to.comment.as_deref())
            }
            (CostObject::Schema, Name) => {
                self.is_match(Some(&from.schema)) || self.is_match(Some(&to.schema))
            }
            (CostObject::Schema, Comment) => {
                self.is_match(from.schema_comment.as_deref())
                    || self.is_match(to.schema_comment.as_deref())
            }
        }
    }
}

/// Computes join weights from the cost settings.
#[derive(Debug, Clone)]
pub struct EdgeCostPolicy {
    default_edge_cost: u32,
    cross_schema_cost: u32,
    rules: Vec<CompiledRule>,
}

impl Default for EdgeCostPolicy {
    fn default() -> Self {
        Self {
            default_edge_cost: 1,
            cross_schema_cost: 1,
            rules: Vec::new(),
        }
    }
}

impl EdgeCostPolicy {
    /// Compile the rules of a cost configuration.
    pub fn from_settings(settings: &CostSettings) -> GraphResult<Self> {
        let rules = settings
            .rules
            .iter()
            .map(CompiledRule::compile)
            .collect::<GraphResult<Vec<_>>>()?;

        Ok(Self {
            default_edge_cost: settings.default_edge_cost,
            cross_schema_cost: settings.cross_schema_cost,
            rules,
        })
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Weight of joining `from` and `to` through `relationship`.
    pub fn weight(&self, relationship: &RelationshipDef, from: &TableDef, to: &TableDef) -> u32 {
        let mut weight = self.default_edge_cost;

        if from.schema != to.schema {
            weight = weight.saturating_add(self.cross_schema_cost);
        }

        for rule in &self.rules {
            if rule.applies(relationship, from, to) {
                weight = weight.saturating_add(rule.cost);
            }
        }

        weight
    }
}
