//! Document persistence and the in-memory model store.

use std::path::PathBuf;

use quarry::model::{
    Aggregation, Cardinality, InMemoryCatalog, Metric, MetricFormat, MetricKind, Model,
    ModelDocument, ModelError, ModelStore, FORMAT_VERSION,
};

fn sales() -> Model {
    let catalog = InMemoryCatalog::new()
        .with_source("orders", &["order_id", "customer_id", "total_amount"])
        .with_source("customers", &["customer_id", "country"]);
    let mut m = Model::new("sales");
    m.set_description("Order analytics");
    m.add_entity(&catalog, "orders", "Orders").unwrap();
    m.add_entity(&catalog, "customers", "Customers").unwrap();
    m.set_field_visible("Customers", "customer_id", false).unwrap();
    m.add_relationship("Orders", "Customers", "customer_id", "customer_id", Cardinality::ManyToOne)
        .unwrap();
    m.add_metric(
        Metric::measure("TotalRevenue", "Orders", "total_amount", Aggregation::Sum)
            .with_format(MetricFormat::Currency),
    )
    .unwrap();
    m.add_metric(Metric::dimension("CustomerCountry", "Customers", "country"))
        .unwrap();
    m.add_metric(Metric::calculated("Doubled", "[TotalRevenue] * 2"))
        .unwrap();
    m
}

/// `Model` equality ignores map order, so order is compared separately.
fn assert_same_order(restored: &Model, original: &Model) {
    assert_eq!(
        restored.entities().keys().collect::<Vec<_>>(),
        original.entities().keys().collect::<Vec<_>>()
    );
    for (name, entity) in original.entities() {
        assert_eq!(
            restored.entity(name).unwrap().fields.keys().collect::<Vec<_>>(),
            entity.fields.keys().collect::<Vec<_>>(),
            "fields of {}",
            name
        );
    }
    assert_eq!(
        restored.metrics().keys().collect::<Vec<_>>(),
        original.metrics().keys().collect::<Vec<_>>()
    );
}

fn temp_path(file: &str) -> PathBuf {
    std::env::temp_dir().join(format!("quarry-{}-{}", std::process::id(), file))
}

// ============================================================================
// Round trips
// ============================================================================

#[test]
fn test_json_round_trip() {
    let model = sales();
    let json = ModelDocument::from_model(&model, true).to_json().unwrap();
    let restored = ModelDocument::from_json(&json).unwrap().into_model("sales").unwrap();
    assert_eq!(restored, model);
    assert_same_order(&restored, &model);
}

#[test]
fn test_toml_round_trip() {
    let model = sales();
    let text = ModelDocument::from_model(&model, true).to_toml().unwrap();
    let restored = ModelDocument::from_toml(&text).unwrap().into_model("sales").unwrap();
    assert_eq!(restored, model);
    assert_same_order(&restored, &model);
    assert_eq!(restored.first_entity().map(|(name, _)| name), Some("Orders"));
}

#[test]
fn test_file_round_trip() {
    let model = sales();
    let doc = ModelDocument::from_model(&model, true);
    for file in ["model.json", "model.toml"] {
        let path = temp_path(file);
        doc.write(&path).unwrap();
        let restored = ModelDocument::read(&path).unwrap().into_model("sales").unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(restored, model, "{}", file);
        assert_same_order(&restored, &model);
    }
}

#[test]
fn test_metrics_are_optional() {
    let doc = ModelDocument::from_model(&sales(), false);
    assert!(doc.metrics.is_none());
    assert!(!doc.to_json().unwrap().contains("\"metrics\""));

    let restored = doc.into_model("structure").unwrap();
    assert_eq!(restored.name(), "structure");
    assert!(restored.metrics().is_empty());
    assert_eq!(restored.entities().len(), 2);
}

// ============================================================================
// Reading hand-written and legacy documents
// ============================================================================

#[test]
fn test_legacy_cardinality_spelling() {
    let json = r#"{
        "format_version": "1.0",
        "model": {
            "entities": {
                "Orders": {
                    "display_name": "Orders",
                    "source": "orders",
                    "fields": {
                        "customer_id": {"source_column": "customer_id", "display_name": "Customer"}
                    }
                },
                "Customers": {
                    "display_name": "Customers",
                    "source": "customers",
                    "fields": {
                        "customer_id": {"source_column": "customer_id", "display_name": "Id"}
                    }
                }
            },
            "relationships": [{
                "from_entity": "Orders",
                "to_entity": "Customers",
                "from_field": "customer_id",
                "to_field": "customer_id",
                "type": "Many-to-One"
            }]
        }
    }"#;
    let model = ModelDocument::from_json(json).unwrap().into_model("legacy").unwrap();
    assert_eq!(model.relationships()[0].cardinality, Cardinality::ManyToOne);
    assert!(model.entity("Orders").unwrap().field("customer_id").unwrap().visible);
}

#[test]
fn test_metric_names_come_from_keys() {
    let toml = r#"
format_version = "1.0"

[model.entities.Orders]
display_name = "Orders"
source = "orders"

[model.entities.Orders.fields.total_amount]
source_column = "total_amount"
display_name = "Total Amount"

[metrics.Revenue]
type = "measure"
entity = "Orders"
field = "total_amount"
aggregation = "SUM"

[metrics.Lost]
type = "dimension"
entity = "Orders"
field = "status"
"#;
    let model = ModelDocument::from_toml(toml).unwrap().into_model("t").unwrap();
    let revenue = model.metric("Revenue").unwrap();
    assert_eq!(revenue.name, "Revenue");
    assert!(matches!(
        revenue.kind,
        MetricKind::Measure { aggregation: Aggregation::Sum, .. }
    ));
    // Bound to a field the document never declared.
    assert!(model.metric("Lost").unwrap().orphaned);
}

#[test]
fn test_unsupported_version() {
    let err = ModelDocument::from_toml("format_version = \"0.9\"\n[model]\n").unwrap_err();
    assert_eq!(
        err.to_string(),
        "unsupported model format version '0.9' (expected 1.x)"
    );
}

#[test]
fn test_unsupported_extension() {
    let err = ModelDocument::from_model(&sales(), true)
        .write(&temp_path("model.yaml"))
        .unwrap_err();
    assert!(matches!(err, ModelError::UnsupportedExtension { extension } if extension == "yaml"));
    assert!(matches!(
        ModelDocument::read(&temp_path("model.xml")),
        Err(ModelError::UnsupportedExtension { .. })
    ));
}

#[test]
fn test_written_version() {
    let doc = ModelDocument::from_model(&sales(), true);
    assert_eq!(doc.format_version, FORMAT_VERSION);
    assert!(doc.to_toml().unwrap().starts_with("format_version = \"1.0\""));
}

// ============================================================================
// Store
// ============================================================================

#[test]
fn test_store_export_import() {
    let mut store = ModelStore::new();
    store.import("sales", ModelDocument::from_model(&sales(), true), false)
        .unwrap();

    let exported = store.export("sales", true).unwrap();
    assert_eq!(exported.metrics.as_ref().map(|m| m.len()), Some(3));

    assert!(matches!(
        store.import("sales", exported.clone(), false),
        Err(ModelError::DuplicateModel(name)) if name == "sales"
    ));

    let structure_only = store.export("sales", false).unwrap();
    store.import("sales", structure_only, true).unwrap();
    assert!(store.get("sales").unwrap().metrics().is_empty());

    store.import("copy", exported, false).unwrap();
    assert_eq!(store.names().collect::<Vec<_>>(), vec!["sales", "copy"]);
    assert_eq!(store.get("copy").unwrap().name(), "copy");
}

#[test]
fn test_store_edits_through_get_mut() {
    let mut store = ModelStore::new();
    store.create_model("scratch").unwrap().set_description("draft");
    store.get_mut("scratch").unwrap().set_description("final");
    assert_eq!(store.get("scratch").unwrap().description(), "final");
    assert_eq!(store.len(), 1);
    assert!(matches!(store.export("nope", true), Err(ModelError::UnknownModel(_))));
}
