//! Shared sales model used across the semantic test targets.
#![allow(dead_code)]

use quarry::model::{Aggregation, Cardinality, InMemoryCatalog, Metric, Model};
use quarry::sql::Dialect;

pub fn catalog() -> InMemoryCatalog {
    InMemoryCatalog::new()
        .with_source("orders", &["order_id", "customer_id", "total_amount", "order_date"])
        .with_source("customers", &["customer_id", "country", "region_id"])
        .with_source("regions", &["region_id", "region_name"])
        .with_source("costs", &["cost_id", "amount"])
        .with_source("hr.employees", &["employee_id", "manager_id", "full_name"])
}

/// Orders -> Customers (many-to-one) with revenue, country and order date.
pub fn sales() -> Model {
    let catalog = catalog();
    let mut m = Model::new("sales");
    m.add_entity(&catalog, "orders", "Orders").unwrap();
    m.add_entity(&catalog, "customers", "Customers").unwrap();
    m.add_relationship("Orders", "Customers", "customer_id", "customer_id", Cardinality::ManyToOne)
        .unwrap();
    m.add_metric(Metric::measure("TotalRevenue", "Orders", "total_amount", Aggregation::Sum))
        .unwrap();
    m.add_metric(Metric::dimension("CustomerCountry", "Customers", "country"))
        .unwrap();
    m.add_metric(Metric::dimension("OrderDate", "Orders", "order_date"))
        .unwrap();
    m
}

/// `sales()` plus an unrelated Costs entity and a Profit formula over both.
pub fn sales_with_costs() -> Model {
    let catalog = catalog();
    let mut m = sales();
    m.add_entity(&catalog, "costs", "Costs").unwrap();
    m.add_metric(Metric::measure("TotalCost", "Costs", "amount", Aggregation::Sum))
        .unwrap();
    m.add_metric(Metric::calculated("Profit", "[TotalRevenue] - [TotalCost]"))
        .unwrap();
    m
}

/// `sales()` plus Customers -> Regions.
pub fn sales_with_regions() -> Model {
    let catalog = catalog();
    let mut m = sales();
    m.add_entity(&catalog, "regions", "Regions").unwrap();
    m.add_relationship("Customers", "Regions", "region_id", "region_id", Cardinality::ManyToOne)
        .unwrap();
    m.add_metric(Metric::dimension("RegionName", "Regions", "region_name"))
        .unwrap();
    m
}

/// Parse `sql` with sqlparser's dialect for `dialect`.
pub fn validate_sql(sql: &str, dialect: Dialect) {
    use sqlparser::dialect::{DuckDbDialect, GenericDialect, MsSqlDialect, PostgreSqlDialect};
    use sqlparser::parser::Parser;

    let result = match dialect {
        Dialect::Ansi => Parser::parse_sql(&GenericDialect {}, sql),
        Dialect::Postgres => Parser::parse_sql(&PostgreSqlDialect {}, sql),
        Dialect::DuckDb => Parser::parse_sql(&DuckDbDialect {}, sql),
        Dialect::TSql => Parser::parse_sql(&MsSqlDialect {}, sql),
    };
    if let Err(e) = result {
        panic!("{} SQL failed to parse: {}\n{}", dialect, e, sql);
    }
}

pub const ALL_DIALECTS: [Dialect; 4] = [Dialect::Ansi, Dialect::Postgres, Dialect::DuckDb, Dialect::TSql];
