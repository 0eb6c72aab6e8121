// src/model/entity.rs
use indexmap::IndexMap;
use inflector::cases::titlecase::to_title_case;
use serde::{Deserialize, Serialize};

use super::catalog::CatalogField;

/// A business entity mapped to one physical source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    /// Physical source, optionally schema-qualified (`sales.orders`).
    pub source: String,
    /// Fields in catalog order, keyed by field name.
    #[serde(default)]
    pub fields: IndexMap<String, Field>,
}

/// A field of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub source_column: String,
    pub display_name: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl Field {
    /// A visible field whose display name is the title-cased column
    /// (`customer_id` -> `Customer Id`).
    pub fn from_column(column: &str) -> Self {
        Self {
            source_column: column.into(),
            display_name: to_title_case(column),
            visible: true,
        }
    }
}

impl Entity {
    /// Seed an entity from the catalog's column list.
    pub fn from_catalog(name: &str, source: &str, columns: &[CatalogField]) -> Self {
        let fields = columns
            .iter()
            .map(|c| (c.name.clone(), Field::from_column(&c.name)))
            .collect();
        Self {
            display_name: name.into(),
            description: String::new(),
            source: source.into(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn visible_fields(&self) -> impl Iterator<Item = (&String, &Field)> {
        self.fields.iter().filter(|(_, f)| f.visible)
    }
}
