//! Versioned on-disk layout of a model.
//!
//! ```text
//! { "format_version": "1.0",
//!   "model":   { "description": ..., "entities": {...}, "relationships": [...] },
//!   "metrics": { ... } }            <- optional
//! ```
//!
//! The same layout is written as JSON or TOML, picked by file extension.
//! Readers accept any `1.x` version and ignore keys they do not know.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::entity::Entity;
use super::error::{ModelError, ModelResult};
use super::metric::Metric;
use super::relationship::Relationship;
use super::Model;

/// Version written by this crate.
pub const FORMAT_VERSION: &str = "1.0";

/// Exported model, ready for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDocument {
    pub format_version: String,
    pub model: ModelBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<IndexMap<String, Metric>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelBody {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub entities: IndexMap<String, Entity>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

/// Serialization format chosen from a path's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

impl Format {
    fn from_path(path: &Path) -> ModelResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match extension.as_str() {
            "json" => Ok(Format::Json),
            "toml" => Ok(Format::Toml),
            _ => Err(ModelError::UnsupportedExtension { extension }),
        }
    }
}

impl ModelDocument {
    /// Snapshot a model. Metrics are included only when asked for.
    pub fn from_model(model: &Model, include_metrics: bool) -> Self {
        Self {
            format_version: FORMAT_VERSION.into(),
            model: ModelBody {
                description: model.description().into(),
                entities: model.entities().clone(),
                relationships: model.relationships().to_vec(),
            },
            metrics: include_metrics.then(|| model.metrics().clone()),
        }
    }

    /// Build a model named `name`. Metric names are taken from their map
    /// keys and orphan flags are recomputed.
    pub fn into_model(self, name: &str) -> ModelResult<Model> {
        self.check_version()?;
        let metrics = self
            .metrics
            .unwrap_or_default()
            .into_iter()
            .map(|(key, mut metric)| {
                metric.name = key.clone();
                (key, metric)
            })
            .collect();
        Ok(Model::from_parts(
            name,
            self.model.description,
            self.model.entities,
            self.model.relationships,
            metrics,
        ))
    }

    fn check_version(&self) -> ModelResult<()> {
        let major = self.format_version.split('.').next().unwrap_or_default();
        if major == "1" {
            Ok(())
        } else {
            Err(ModelError::UnsupportedFormatVersion {
                found: self.format_version.clone(),
            })
        }
    }

    pub fn to_json(&self) -> ModelResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> ModelResult<Self> {
        let doc: Self = serde_json::from_str(json)?;
        doc.check_version()?;
        Ok(doc)
    }

    pub fn to_toml(&self) -> ModelResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn from_toml(text: &str) -> ModelResult<Self> {
        let doc: Self = toml::from_str(text)?;
        doc.check_version()?;
        Ok(doc)
    }

    /// Read a `.json` or `.toml` document.
    pub fn read(path: &Path) -> ModelResult<Self> {
        let format = Format::from_path(path)?;
        let text = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), ?format, "reading model document");
        match format {
            Format::Json => Self::from_json(&text),
            Format::Toml => Self::from_toml(&text),
        }
    }

    /// Write as `.json` or `.toml`.
    pub fn write(&self, path: &Path) -> ModelResult<()> {
        let text = match Format::from_path(path)? {
            Format::Json => self.to_json()?,
            Format::Toml => self.to_toml()?,
        };
        std::fs::write(path, text)?;
        Ok(())
    }
}
