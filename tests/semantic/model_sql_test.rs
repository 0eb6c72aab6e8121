//! Whole-model compilation: projections, join assembly, warnings.

mod fixtures;

use fixtures::{catalog, sales, validate_sql, ALL_DIALECTS};
use quarry::compile::{compile_model, CompileOptions};
use quarry::model::{Cardinality, InMemoryCatalog, Model};
use quarry::semantic::{CompileError, Warning};
use quarry::sql::Dialect;

fn orders_customers() -> Model {
    let catalog = InMemoryCatalog::new()
        .with_source("orders", &["order_id", "customer_id", "total_amount"])
        .with_source("customers", &["customer_id", "country"]);
    let mut m = Model::new("sales");
    m.add_entity(&catalog, "orders", "Orders").unwrap();
    m.add_entity(&catalog, "customers", "Customers").unwrap();
    m.add_relationship("Orders", "Customers", "customer_id", "customer_id", Cardinality::ManyToOne)
        .unwrap();
    m
}

// ============================================================================
// Assembly
// ============================================================================

#[test]
fn test_two_entity_model() {
    let output = compile_model(&orders_customers(), &CompileOptions::default()).unwrap();
    assert!(output.warnings.is_empty());
    insta::assert_snapshot!(output.sql, @r#"
WITH orders_base AS (
SELECT
  order_id AS "Order_Id",
  customer_id AS "Customer_Id",
  total_amount AS "Total_Amount"
FROM orders
),
customers_view AS (
SELECT
  customer_id AS "Customers_Customer_Id",
  country AS "Customers_Country"
FROM customers
)
SELECT
  b."Order_Id",
  b."Customer_Id",
  b."Total_Amount",
  customers."Customers_Customer_Id",
  customers."Customers_Country"
FROM orders_base AS b
LEFT OUTER JOIN customers_view AS customers ON b."Customer_Id" = customers."Customers_Customer_Id"
"#);
}

#[test]
fn test_base_entity_override() {
    let options = CompileOptions::default().with_base_entity("Customers");
    let sql = compile_model(&orders_customers(), &options).unwrap().sql;
    assert!(sql.starts_with("WITH customers_base AS ("));
    assert!(sql.contains("orders_view AS ("));
    assert!(sql.contains("FROM customers_base AS b"));
    assert!(sql.contains(
        "LEFT OUTER JOIN orders_view AS orders ON b.\"Customer_Id\" = orders.\"Orders_Customer_Id\""
    ));
}

#[test]
fn test_one_to_one_uses_inner_join() {
    let catalog = InMemoryCatalog::new()
        .with_source("users", &["user_id"])
        .with_source("profiles", &["user_id", "bio"]);
    let mut m = Model::new("m");
    m.add_entity(&catalog, "users", "Users").unwrap();
    m.add_entity(&catalog, "profiles", "Profiles").unwrap();
    m.add_relationship("Users", "Profiles", "user_id", "user_id", Cardinality::OneToOne)
        .unwrap();

    let sql = compile_model(&m, &CompileOptions::default()).unwrap().sql;
    assert!(sql.contains("\nINNER JOIN profiles_view AS profiles ON"));
}

#[test]
fn test_display_names_are_sanitized() {
    let mut m = orders_customers();
    m.set_field_display_name("Customers", "country", "Home  Country")
        .unwrap();
    let sql = compile_model(&m, &CompileOptions::default()).unwrap().sql;
    assert!(sql.contains("country AS \"Customers_Home_Country\""));
}

#[test]
fn test_schema_qualified_source() {
    let catalog = catalog();
    let mut m = Model::new("hr");
    m.add_entity(&catalog, "hr.employees", "Employees").unwrap();
    let sql = compile_model(&m, &CompileOptions::default().with_dialect(Dialect::Postgres))
        .unwrap()
        .sql;
    assert!(sql.contains("FROM \"hr\".\"employees\""));
}

// ============================================================================
// Self-joins
// ============================================================================

#[test]
fn test_self_reference_gets_two_aliases() {
    let catalog = catalog();
    let mut m = Model::new("hr");
    m.add_entity(&catalog, "hr.employees", "Employees").unwrap();
    m.add_relationship("Employees", "Employees", "manager_id", "employee_id", Cardinality::ManyToOne)
        .unwrap();

    let output = compile_model(&m, &CompileOptions::default()).unwrap();
    let sql = &output.sql;
    assert!(sql.contains("FROM employees_base AS b"));
    assert!(sql.contains(
        "LEFT OUTER JOIN employees_base AS b_self ON b.\"Manager_Id\" = b_self.\"Employee_Id\""
    ));
    assert!(sql.contains("b_self.\"Full_Name\" AS \"b_self_Full_Name\""));
    for dialect in ALL_DIALECTS {
        validate_sql(&compile_model(&m, &CompileOptions::default().with_dialect(dialect)).unwrap().sql, dialect);
    }
}

// ============================================================================
// Warnings and edge cases
// ============================================================================

#[test]
fn test_disconnected_entity_is_commented_and_excluded() {
    let catalog = catalog();
    let mut m = orders_customers();
    m.add_entity(&catalog, "costs", "Costs").unwrap();

    let output = compile_model(&m, &CompileOptions::default()).unwrap();
    assert_eq!(
        output.warnings,
        vec![Warning::DisconnectedEntity {
            entity: "Costs".into(),
            base: "Orders".into()
        }]
    );
    assert!(output.sql.starts_with(
        "-- Entity 'Costs' is not connected to 'Orders'; excluded from the join assembly\nWITH"
    ));
    assert!(!output.sql.contains("costs_view"));
}

#[test]
fn test_base_without_visible_fields() {
    let mut m = orders_customers();
    for field in ["order_id", "customer_id", "total_amount"] {
        m.set_field_visible("Orders", field, false).unwrap();
    }

    let output = compile_model(&m, &CompileOptions::default()).unwrap();
    assert!(output.warnings.contains(&Warning::EmptyProjection {
        entity: "Orders".into()
    }));
    // The join key is still projected so the join can be expressed.
    assert!(output.sql.contains("customer_id AS \"Customer_Id\""));
    assert!(!output.sql.contains("b.\"Order_Id\""));
    validate_sql(&output.sql, Dialect::Ansi);
}

#[test]
fn test_single_entity_with_nothing_visible() {
    let catalog = InMemoryCatalog::new().with_source("t", &["a"]);
    let mut m = Model::new("m");
    m.add_entity(&catalog, "t", "T").unwrap();
    m.set_field_visible("T", "a", false).unwrap();

    let output = compile_model(&m, &CompileOptions::default()).unwrap();
    assert_eq!(
        output.sql,
        "WITH t_base AS (\nSELECT\n  NULL AS no_visible_fields\nFROM t\n)\nSELECT\n  NULL AS no_visible_fields\nFROM t_base AS b"
    );
}

#[test]
fn test_empty_model() {
    assert_eq!(
        compile_model(&Model::new("empty"), &CompileOptions::default()).unwrap_err(),
        CompileError::EmptyModel
    );
}

#[test]
fn test_unknown_base() {
    let options = CompileOptions::default().with_base_entity("Nope");
    assert_eq!(
        compile_model(&orders_customers(), &options).unwrap_err(),
        CompileError::UnknownEntity("Nope".into())
    );
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_compilation_is_deterministic() {
    let m = sales();
    let options = CompileOptions::default();
    assert_eq!(
        compile_model(&m, &options).unwrap().sql,
        compile_model(&m, &options).unwrap().sql
    );
}

#[test]
fn test_every_reachable_entity_projected_once() {
    let m = fixtures::sales_with_regions();
    let sql = compile_model(&m, &CompileOptions::default()).unwrap().sql;
    for cte in ["orders_base AS (", "customers_view AS (", "regions_view AS ("] {
        assert_eq!(sql.matches(cte).count(), 1, "{} in\n{}", cte, sql);
    }
}

#[test]
fn test_parses_in_every_dialect() {
    let m = fixtures::sales_with_regions();
    for dialect in ALL_DIALECTS {
        let options = CompileOptions::default().with_dialect(dialect);
        validate_sql(&compile_model(&m, &options).unwrap().sql, dialect);
    }
}
