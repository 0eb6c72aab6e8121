//! Physical schema catalog consumed when entities are created.
//!
//! Introspection of live databases happens elsewhere; the model only needs
//! the ordered column list for a source. [`InMemoryCatalog`] reads the JSON
//! an introspection run produces:
//!
//! ```json
//! {"tables": {"orders": {"columns": [{"name": "order_id", "type": "integer"}]}}}
//! ```
//!
//! Document stores report `{"collections": {"events": {"fields": [...]}}}`
//! instead; both shapes are accepted.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::error::ModelResult;

/// One physical column (or document field) of a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogField {
    pub name: String,
    #[serde(rename = "type", default)]
    pub data_type: String,
}

impl CatalogField {
    pub fn new(name: &str, data_type: &str) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Source of physical field lists.
pub trait SchemaCatalog {
    /// Ordered fields of `source`, or `None` if the source is unknown.
    fn list_fields(&self, source: &str) -> Option<Vec<CatalogField>>;
}

/// A catalog held in memory, keyed by source identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InMemoryCatalog {
    sources: IndexMap<String, Vec<CatalogField>>,
}

#[derive(Deserialize)]
struct IntrospectionOutput {
    #[serde(default)]
    tables: IndexMap<String, TableColumns>,
    #[serde(default)]
    collections: IndexMap<String, CollectionFields>,
}

#[derive(Deserialize)]
struct TableColumns {
    #[serde(default)]
    columns: Vec<CatalogField>,
}

#[derive(Deserialize)]
struct CollectionFields {
    #[serde(default)]
    fields: Vec<CatalogField>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source with untyped column names.
    pub fn with_source(mut self, source: &str, columns: &[&str]) -> Self {
        self.add_source(
            source,
            columns.iter().map(|c| CatalogField::new(c, "")).collect(),
        );
        self
    }

    /// Register (or replace) a source.
    pub fn add_source(&mut self, source: &str, fields: Vec<CatalogField>) {
        self.sources.insert(source.to_string(), fields);
    }

    /// Parse introspection output (`tables` and/or `collections`).
    pub fn from_json(json: &str) -> ModelResult<Self> {
        let output: IntrospectionOutput = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        for (name, table) in output.tables {
            catalog.add_source(&name, table.columns);
        }
        for (name, collection) in output.collections {
            catalog.add_source(&name, collection.fields);
        }
        Ok(catalog)
    }

    /// Source identifiers in registration order.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }
}

impl SchemaCatalog for InMemoryCatalog {
    fn list_fields(&self, source: &str) -> Option<Vec<CatalogField>> {
        self.sources.get(source).cloned()
    }
}
