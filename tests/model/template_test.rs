//! Applying a model as a template, in merge and replace modes.

use std::collections::HashMap;

use quarry::model::{
    Aggregation, Cardinality, InMemoryCatalog, Metric, Model, ModelDocument, ModelError,
    ModelStore, TemplateMode,
};
use quarry::validation::validate;

fn catalog() -> InMemoryCatalog {
    InMemoryCatalog::new()
        .with_source("orders", &["order_id", "customer_id", "total_amount"])
        .with_source("customers", &["customer_id", "country", "region_id"])
        .with_source("regions", &["region_id", "region_name"])
        .with_source("returns", &["return_id", "order_id"])
        .with_source("costs", &["cost_id", "amount"])
        .with_source("geo.regions", &["region_id", "region_name", "continent"])
        .with_source("crm.clients", &["customer_id", "country", "region_id", "segment"])
}

/// Orders -> Customers -> Regions, plus a metric left orphaned by removing
/// Returns.
fn template() -> Model {
    let catalog = catalog();
    let mut t = Model::new("sales_template");
    t.add_entity(&catalog, "orders", "Orders").unwrap();
    t.add_entity(&catalog, "customers", "Customers").unwrap();
    t.add_entity(&catalog, "regions", "Regions").unwrap();
    t.add_entity(&catalog, "returns", "Returns").unwrap();
    t.set_entity_display_name("Regions", "Sales Regions").unwrap();
    t.add_relationship("Orders", "Customers", "customer_id", "customer_id", Cardinality::ManyToOne)
        .unwrap();
    t.add_relationship("Customers", "Regions", "region_id", "region_id", Cardinality::ManyToOne)
        .unwrap();
    t.add_metric(Metric::measure("TotalRevenue", "Orders", "total_amount", Aggregation::Sum))
        .unwrap();
    t.add_metric(Metric::dimension("CustomerCountry", "Customers", "country"))
        .unwrap();
    t.add_metric(Metric::dimension("RegionName", "Regions", "region_name"))
        .unwrap();
    t.add_metric(Metric::measure("ReturnCount", "Returns", "return_id", Aggregation::Count))
        .unwrap();
    t.add_metric(Metric::calculated("HalfRevenue", "[TotalRevenue] / 2"))
        .unwrap();
    t.delete_entity("Returns").unwrap();
    t
}

fn names<'a>(keys: impl Iterator<Item = &'a String>) -> Vec<&'a str> {
    keys.map(String::as_str).collect()
}

#[test]
fn test_merge_adds_only_what_is_missing() {
    let catalog = catalog();
    let mut target = Model::new("sales");
    target.add_entity(&catalog, "orders", "Orders").unwrap();
    target.add_entity(&catalog, "customers", "Customers").unwrap();
    target
        .add_relationship("Orders", "Customers", "customer_id", "customer_id", Cardinality::ManyToOne)
        .unwrap();
    target
        .add_metric(
            Metric::measure("TotalRevenue", "Orders", "total_amount", Aggregation::Avg)
                .with_description("kept"),
        )
        .unwrap();

    let sources = HashMap::from([("Regions".to_string(), "geo.regions".to_string())]);
    let report = target
        .apply_template(&template(), &catalog, &sources, TemplateMode::Merge)
        .unwrap();

    assert_eq!(report.entities_added, vec!["Regions"]);
    assert_eq!(report.entities_skipped, vec!["Orders", "Customers"]);
    assert_eq!(report.relationships_added, 1);
    assert_eq!(report.relationships_skipped, 1);
    assert_eq!(
        report.metrics_added,
        vec!["CustomerCountry", "RegionName", "HalfRevenue"]
    );
    assert_eq!(report.metrics_skipped, vec!["TotalRevenue", "ReturnCount"]);

    let regions = target.entity("Regions").unwrap();
    assert_eq!(regions.source, "geo.regions");
    assert_eq!(regions.display_name, "Sales Regions");
    assert_eq!(
        names(regions.fields.keys()),
        vec!["region_id", "region_name", "continent"]
    );
    assert_eq!(target.relationships().len(), 2);
    assert_eq!(target.metric("TotalRevenue").unwrap().description, "kept");
    assert!(target.metric("ReturnCount").is_none());
    assert_eq!(validate(&target), Ok(()));
}

#[test]
fn test_replace_rebuilds_from_template() {
    let catalog = catalog();
    let mut target = Model::new("sales");
    target.set_description("Order analytics");
    target.add_entity(&catalog, "costs", "Costs").unwrap();
    target
        .add_metric(Metric::measure("TotalCost", "Costs", "amount", Aggregation::Sum))
        .unwrap();

    let sources = HashMap::from([("Customers".to_string(), "crm.clients".to_string())]);
    let report = target
        .apply_template(&template(), &catalog, &sources, TemplateMode::Replace)
        .unwrap();

    assert_eq!(target.name(), "sales");
    assert_eq!(target.description(), "Order analytics");
    assert_eq!(
        names(target.entities().keys()),
        vec!["Orders", "Customers", "Regions"]
    );
    assert!(report.entities_skipped.is_empty());
    assert_eq!(target.entity("Customers").unwrap().source, "crm.clients");
    assert!(target.entity("Customers").unwrap().has_field("segment"));

    assert_eq!(report.relationships_added, 2);
    assert_eq!(report.relationships_skipped, 0);

    assert_eq!(
        names(target.metrics().keys()),
        vec!["TotalRevenue", "CustomerCountry", "RegionName", "ReturnCount", "HalfRevenue"]
    );
    assert!(report.metrics_skipped.is_empty());
    assert!(target.metric("TotalCost").is_none());
    assert!(target.metric("ReturnCount").unwrap().orphaned);
    assert!(!target.metric("CustomerCountry").unwrap().orphaned);
}

#[test]
fn test_relationship_to_remapped_field_dropped() {
    let catalog = catalog();
    let mut target = Model::new("sales");
    // costs has no customer_id, so Orders -> Customers cannot be kept.
    let sources = HashMap::from([("Customers".to_string(), "costs".to_string())]);
    let report = target
        .apply_template(&template(), &catalog, &sources, TemplateMode::Replace)
        .unwrap();

    assert_eq!(report.relationships_added, 0);
    assert_eq!(report.relationships_skipped, 2);
    assert!(target.relationships().is_empty());
    assert!(target.metric("CustomerCountry").unwrap().orphaned);
}

#[test]
fn test_store_applies_stored_template() {
    let mut store = ModelStore::new();
    store
        .import("template", ModelDocument::from_model(&template(), true), false)
        .unwrap();
    store.create_model("blank").unwrap();

    let report = store
        .apply_template("blank", "template", &catalog(), &HashMap::new(), TemplateMode::Merge)
        .unwrap();
    assert_eq!(report.entities_added, vec!["Orders", "Customers", "Regions"]);
    assert_eq!(store.get("blank").unwrap().metrics().len(), 4);

    assert!(matches!(
        store.apply_template("blank", "nope", &catalog(), &HashMap::new(), TemplateMode::Merge),
        Err(ModelError::UnknownModel(name)) if name == "nope"
    ));
}
