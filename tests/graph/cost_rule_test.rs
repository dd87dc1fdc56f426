// tests/graph/cost_rule_test.rs
use joinpath::config::{CostAttribute, CostObject, CostRule, Settings, SolverSettings};
use joinpath::graph::{GraphError, JoinGraph};
use joinpath::schema::{RelationshipDef, SchemaSnapshot, TableDef};
use joinpath::solver::{CancelToken, JoinSolver, Reporter};

/// a - b - c chain with a direct a - c shortcut named `audit_ac`.
fn triangle() -> SchemaSnapshot {
    SchemaSnapshot::new()
        .with_tables("s", &["a", "b", "c"])
        .with_relationship(RelationshipDef::foreign_key("ab", "s.a", "s.b"))
        .with_relationship(RelationshipDef::foreign_key("bc", "s.b", "s.c"))
        .with_relationship(
            RelationshipDef::foreign_key("audit_ac", "s.a", "s.c")
                .with_comment("Audit trail, avoid"),
        )
}

fn exact_settings() -> Settings {
    Settings {
        solver: SolverSettings::exact(),
        ..Settings::default()
    }
}

fn best_cost(snapshot: &SchemaSnapshot, settings: Settings) -> u32 {
    let graph = JoinGraph::build(snapshot, &["s.a", "s.c"], &settings).unwrap();
    let results = JoinSolver::new(graph, settings)
        .solve(&Reporter::silent(CancelToken::new()))
        .into_results()
        .unwrap();
    results.best().unwrap().cost
}

fn weight_of(graph: &JoinGraph, relationship: usize) -> u32 {
    (0..graph.edge_count())
        .filter_map(|e| graph.edge(e))
        .find(|(_, _, data)| data.relationship == relationship)
        .map(|(_, _, data)| data.weight)
        .unwrap()
}

#[test]
fn test_without_rules_shortcut_wins() {
    assert_eq!(best_cost(&triangle(), exact_settings()), 1);
}

#[test]
fn test_relationship_name_rule_steers_solution() {
    let mut settings = exact_settings();
    settings.costs.rules.push(CostRule::new(
        CostObject::Relationship,
        CostAttribute::Name,
        "AUDIT_*",
        5,
    ));

    let graph = JoinGraph::build(&triangle(), &["s.a", "s.c"], &settings).unwrap();
    assert_eq!(weight_of(&graph, 2), 6);
    assert_eq!(weight_of(&graph, 0), 1);

    let results = JoinSolver::new(graph, settings)
        .solve(&Reporter::silent(CancelToken::new()))
        .into_results()
        .unwrap();
    let best = results.best().unwrap();
    assert_eq!(best.cost, 2);
    assert_eq!(best.relationship_set().into_iter().collect::<Vec<_>>(), vec![0, 1]);
}

#[test]
fn test_comment_rule() {
    let mut settings = exact_settings();
    settings.costs.rules.push(CostRule::new(
        CostObject::Relationship,
        CostAttribute::Comment,
        "*avoid*",
        3,
    ));

    assert_eq!(best_cost(&triangle(), settings), 2);
}

#[test]
fn test_table_rule_applies_once_per_edge() {
    // Both endpoints match, the surcharge is still added once
    let mut settings = Settings::default();
    settings.costs.rules.push(CostRule::new(
        CostObject::Table,
        CostAttribute::Name,
        "?",
        10,
    ));

    let graph = JoinGraph::build(&triangle(), &["s.a", "s.c"], &settings).unwrap();
    assert_eq!(weight_of(&graph, 0), 11);
    assert_eq!(weight_of(&graph, 2), 11);
}

#[test]
fn test_cross_schema_cost() {
    let snapshot = SchemaSnapshot::new()
        .with_table(TableDef::new("sales", "orders"))
        .with_table(TableDef::new("hr", "employees"))
        .with_table(TableDef::new("sales", "customers"))
        .with_relationship(RelationshipDef::foreign_key(
            "orders_employee",
            "sales.orders",
            "hr.employees",
        ))
        .with_relationship(RelationshipDef::foreign_key(
            "orders_customer",
            "sales.orders",
            "sales.customers",
        ));

    let mut settings = Settings::default();
    settings.costs.cross_schema_cost = 4;
    let graph =
        JoinGraph::build(&snapshot, &["sales.orders", "hr.employees"], &settings).unwrap();

    assert_eq!(weight_of(&graph, 0), 5);
    assert_eq!(weight_of(&graph, 1), 1);
}

#[test]
fn test_schema_comment_rule() {
    let snapshot = SchemaSnapshot::new()
        .with_table(TableDef::new("s", "a"))
        .with_table(TableDef::new("legacy", "b").with_schema_comment("Deprecated schema"))
        .with_relationship(RelationshipDef::foreign_key("ab", "s.a", "legacy.b"));

    let mut settings = Settings::default();
    settings.costs.cross_schema_cost = 0;
    settings.costs.rules.push(CostRule::new(
        CostObject::Schema,
        CostAttribute::Comment,
        "deprecated*",
        7,
    ));

    let graph = JoinGraph::build(&snapshot, &["s.a", "legacy.b"], &settings).unwrap();
    assert_eq!(weight_of(&graph, 0), 8);
}

#[test]
fn test_constraint_rule_without_constraint_never_matches() {
    let mut settings = Settings::default();
    settings.costs.rules.push(CostRule::new(
        CostObject::Constraint,
        CostAttribute::Name,
        "*",
        9,
    ));

    let snapshot = triangle().with_relationship(
        RelationshipDef::foreign_key("bc_fk", "s.b", "s.c").with_constraint("fk_b_c", None),
    );
    let graph = JoinGraph::build(&snapshot, &["s.a", "s.c"], &settings).unwrap();

    assert_eq!(weight_of(&graph, 1), 1);
    assert_eq!(weight_of(&graph, 3), 10);
}

#[test]
fn test_glob_metacharacters_are_literal() {
    let mut settings = Settings::default();
    settings.costs.rules.push(CostRule::new(
        CostObject::Relationship,
        CostAttribute::Name,
        "a(b",
        1,
    ));

    // Escaped, so the pattern compiles and simply does not match
    let graph = JoinGraph::build(&triangle(), &["s.a", "s.c"], &settings);
    assert!(!matches!(graph, Err(GraphError::InvalidPattern { .. })));
    assert_eq!(weight_of(&graph.unwrap(), 0), 1);
}

#[test]
fn test_table_comment_rule() {
    let snapshot = SchemaSnapshot::new()
        .with_table(TableDef::new("s", "a"))
        .with_table(TableDef::new("s", "b").with_comment("Staging copy, do not join"))
        .with_table(TableDef::new("s", "c"))
        .with_relationship(RelationshipDef::foreign_key("ab", "s.a", "s.b"))
        .with_relationship(RelationshipDef::foreign_key("ac", "s.a", "s.c"));

    let mut settings = Settings::default();
    settings.costs.rules.push(CostRule::new(
        CostObject::Table,
        CostAttribute::Comment,
        "staging*",
        6,
    ));

    let graph = JoinGraph::build(&snapshot, &["s.a", "s.b", "s.c"], &settings).unwrap();
    assert_eq!(weight_of(&graph, 0), 7);
    assert_eq!(weight_of(&graph, 1), 1);
}
