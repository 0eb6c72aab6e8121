// src/model/store.rs
use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::debug;

use super::catalog::SchemaCatalog;
use super::document::ModelDocument;
use super::error::{ModelError, ModelResult};
use super::template::{TemplateMode, TemplateReport};
use super::Model;

/// A keyed collection of models owned by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelStore {
    models: IndexMap<String, Model>,
}

impl ModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_model(&mut self, name: &str) -> ModelResult<&mut Model> {
        if self.models.contains_key(name) {
            return Err(ModelError::DuplicateModel(name.into()));
        }
        self.models.insert(name.to_string(), Model::new(name));
        self.get_mut(name)
    }

    pub fn get(&self, name: &str) -> ModelResult<&Model> {
        self.models
            .get(name)
            .ok_or_else(|| ModelError::UnknownModel(name.into()))
    }

    pub fn get_mut(&mut self, name: &str) -> ModelResult<&mut Model> {
        self.models
            .get_mut(name)
            .ok_or_else(|| ModelError::UnknownModel(name.into()))
    }

    pub fn delete_model(&mut self, name: &str) -> ModelResult<Model> {
        self.models
            .shift_remove(name)
            .ok_or_else(|| ModelError::UnknownModel(name.into()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn export(&self, name: &str, include_metrics: bool) -> ModelResult<ModelDocument> {
        Ok(ModelDocument::from_model(self.get(name)?, include_metrics))
    }

    /// Store `document` under `name`. An existing model with that name is
    /// replaced only when `overwrite` is set.
    pub fn import(
        &mut self,
        name: &str,
        document: ModelDocument,
        overwrite: bool,
    ) -> ModelResult<&Model> {
        if self.models.contains_key(name) && !overwrite {
            return Err(ModelError::DuplicateModel(name.into()));
        }
        let model = document.into_model(name)?;
        debug!(
            model = name,
            entities = model.entities().len(),
            metrics = model.metrics().len(),
            overwrite,
            "imported model"
        );
        self.models.insert(name.to_string(), model);
        self.get(name)
    }

    /// Apply the stored model `template` to the stored model `target`.
    /// See [`Model::apply_template`].
    pub fn apply_template(
        &mut self,
        target: &str,
        template: &str,
        catalog: &impl SchemaCatalog,
        sources: &HashMap<String, String>,
        mode: TemplateMode,
    ) -> ModelResult<TemplateReport> {
        let template = self.get(template)?.clone();
        self.get_mut(target)?
            .apply_template(&template, catalog, sources, mode)
    }
}
