//! Join tree resolution over model relationships.

mod fixtures;

use quarry::model::{Cardinality, InMemoryCatalog, Model};
use quarry::semantic::{join_type_for, JoinPlan};
use quarry::sql::JoinType;

/// A - B, A - C, B - D, C - D, and an isolated E.
fn diamond() -> Model {
    let catalog = InMemoryCatalog::new()
        .with_source("a", &["id", "b_id", "c_id"])
        .with_source("b", &["id", "d_id"])
        .with_source("c", &["id", "d_id"])
        .with_source("d", &["id"])
        .with_source("e", &["id"]);
    let mut m = Model::new("diamond");
    for (source, name) in [("a", "A"), ("b", "B"), ("c", "C"), ("d", "D"), ("e", "E")] {
        m.add_entity(&catalog, source, name).unwrap();
    }
    m.add_relationship("A", "B", "b_id", "id", Cardinality::ManyToOne).unwrap();
    m.add_relationship("A", "C", "c_id", "id", Cardinality::ManyToOne).unwrap();
    m.add_relationship("B", "D", "d_id", "id", Cardinality::ManyToOne).unwrap();
    m.add_relationship("C", "D", "d_id", "id", Cardinality::ManyToOne).unwrap();
    m
}

#[test]
fn test_breadth_first_discovery_order() {
    let plan = JoinPlan::resolve(&diamond(), "A").unwrap();
    assert_eq!(plan.reached().collect::<Vec<_>>(), vec!["A", "B", "C", "D"]);
    assert_eq!(plan.disconnected, vec!["E"]);
}

#[test]
fn test_first_discovering_relationship_wins() {
    let plan = JoinPlan::resolve(&diamond(), "A").unwrap();
    let d = plan.step_for("D").unwrap();
    assert_eq!(d.parent, "B");
    assert_eq!(d.relationship, 2);
}

#[test]
fn test_each_entity_joined_once() {
    let plan = JoinPlan::resolve(&diamond(), "D").unwrap();
    let mut entities: Vec<_> = plan.steps.iter().map(|s| s.entity.as_str()).collect();
    entities.sort_unstable();
    assert_eq!(entities, vec!["A", "B", "C"]);
    // Reached from D through B first (relationship #2 precedes #3).
    assert_eq!(plan.step_for("A").unwrap().parent, "B");
}

#[test]
fn test_parallel_relationships_use_the_earliest() {
    let catalog = InMemoryCatalog::new()
        .with_source("flights", &["id", "origin_id", "destination_id"])
        .with_source("airports", &["id"]);
    let mut m = Model::new("m");
    m.add_entity(&catalog, "flights", "Flights").unwrap();
    m.add_entity(&catalog, "airports", "Airports").unwrap();
    m.add_relationship("Flights", "Airports", "origin_id", "id", Cardinality::ManyToOne)
        .unwrap();
    m.add_relationship("Flights", "Airports", "destination_id", "id", Cardinality::ManyToOne)
        .unwrap();

    let plan = JoinPlan::resolve(&m, "Flights").unwrap();
    assert_eq!(plan.steps.len(), 1);
    assert_eq!(plan.steps[0].parent_field, "origin_id");
}

#[test]
fn test_self_join_recorded() {
    let catalog = fixtures::catalog();
    let mut m = Model::new("hr");
    m.add_entity(&catalog, "hr.employees", "Employees").unwrap();
    m.add_relationship("Employees", "Employees", "manager_id", "employee_id", Cardinality::ManyToOne)
        .unwrap();

    let plan = JoinPlan::resolve(&m, "Employees").unwrap();
    assert!(plan.steps.is_empty());
    assert_eq!(plan.self_joins.len(), 1);
    assert_eq!(plan.self_joins[0].from_field, "manager_id");
    assert_eq!(plan.self_joins[0].to_field, "employee_id");
}

#[test]
fn test_join_types() {
    assert_eq!(join_type_for(Cardinality::OneToOne), JoinType::Inner);
    assert_eq!(join_type_for(Cardinality::ManyToOne), JoinType::LeftOuter);
    assert_eq!(join_type_for(Cardinality::OneToMany), JoinType::LeftOuter);
    assert_eq!(join_type_for(Cardinality::ManyToMany), JoinType::LeftOuter);
}

#[test]
fn test_prune_to_targets() {
    let plan = JoinPlan::resolve(&diamond(), "A").unwrap();
    let (pruned, unreachable) = plan.prune_to(["D", "E"]);
    assert_eq!(pruned.reached().collect::<Vec<_>>(), vec!["A", "B", "D"]);
    assert_eq!(unreachable, vec!["E"]);
}
