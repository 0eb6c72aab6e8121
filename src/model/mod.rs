//! Semantic model: entities, relationships and metrics.
//!
//! A [`Model`] owns everything one business domain defines. All mutation goes
//! through its methods, which validate against the current state and either
//! apply fully or return an error without touching the model.
//!
//! ```
//! use quarry::model::{Aggregation, Cardinality, InMemoryCatalog, Metric, Model};
//!
//! let catalog = InMemoryCatalog::new()
//!     .with_source("orders", &["order_id", "customer_id", "total_amount"])
//!     .with_source("customers", &["customer_id", "country"]);
//!
//! let mut model = Model::new("sales");
//! model.add_entity(&catalog, "orders", "Orders")?;
//! model.add_entity(&catalog, "customers", "Customers")?;
//! model.add_relationship("Orders", "Customers", "customer_id", "customer_id", Cardinality::ManyToOne)?;
//! model.add_metric(Metric::measure("TotalRevenue", "Orders", "total_amount", Aggregation::Sum))?;
//! # Ok::<(), quarry::model::ModelError>(())
//! ```

pub mod catalog;
pub mod document;
mod entity;
mod error;
mod metric;
mod relationship;
mod store;
mod template;

pub use catalog::{CatalogField, InMemoryCatalog, SchemaCatalog};
pub use document::{ModelBody, ModelDocument, FORMAT_VERSION};
pub use entity::{Entity, Field};
pub use error::{InvalidReference, ModelError, ModelResult};
pub use metric::{Aggregation, Metric, MetricFormat, MetricKind};
pub use relationship::{Cardinality, Oriented, Relationship};
pub use store::ModelStore;
pub use template::{TemplateMode, TemplateReport};

use indexmap::IndexMap;
use tracing::debug;

/// One named semantic model.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Model {
    name: String,
    description: String,
    entities: IndexMap<String, Entity>,
    relationships: Vec<Relationship>,
    metrics: IndexMap<String, Metric>,
}

/// What [`Model::delete_entity`] removed or invalidated.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRemoval {
    pub entity: Entity,
    pub relationships: Vec<Relationship>,
    /// Metrics newly flagged as orphaned.
    pub orphaned_metrics: Vec<String>,
}

impl Model {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub(crate) fn from_parts(
        name: &str,
        description: String,
        entities: IndexMap<String, Entity>,
        relationships: Vec<Relationship>,
        metrics: IndexMap<String, Metric>,
    ) -> Self {
        let mut model = Self {
            name: name.into(),
            description,
            entities,
            relationships,
            metrics,
        };
        model.refresh_orphans();
        model
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn entities(&self) -> &IndexMap<String, Entity> {
        &self.entities
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }

    /// First entity in insertion order.
    pub fn first_entity(&self) -> Option<(&str, &Entity)> {
        self.entities.first().map(|(k, v)| (k.as_str(), v))
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn metrics(&self) -> &IndexMap<String, Metric> {
        &self.metrics
    }

    pub fn metric(&self, name: &str) -> Option<&Metric> {
        self.metrics.get(name)
    }

    /// First relationship (insertion order) linking `from` directly to `to`,
    /// viewed from `from`. Self-references never qualify.
    pub fn direct_relationship(&self, from: &str, to: &str) -> Option<Oriented<'_>> {
        if from == to {
            return None;
        }
        self.relationships
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.oriented_from(i, from))
            .find(|o| o.far_entity == to)
    }

    // =========================================================================
    // Model-level edits
    // =========================================================================

    pub fn set_description(&mut self, description: &str) {
        self.description = description.into();
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Create an entity from a catalog source. Fields are seeded from the
    /// catalog's column list.
    pub fn add_entity(
        &mut self,
        catalog: &impl SchemaCatalog,
        source: &str,
        name: &str,
    ) -> ModelResult<&Entity> {
        if self.entities.contains_key(name) {
            return Err(ModelError::DuplicateEntity(name.into()));
        }
        let columns = catalog
            .list_fields(source)
            .ok_or_else(|| InvalidReference::UnknownSource(source.into()))?;

        debug!(model = %self.name, entity = name, source, fields = columns.len(), "adding entity");
        self.entities
            .insert(name.to_string(), Entity::from_catalog(name, source, &columns));
        self.refresh_orphans();
        Ok(&self.entities[name])
    }

    /// Remove an entity, every relationship touching it, and flag metrics
    /// bound to it as orphaned.
    pub fn delete_entity(&mut self, name: &str) -> ModelResult<EntityRemoval> {
        let entity = self
            .entities
            .shift_remove(name)
            .ok_or_else(|| InvalidReference::UnknownEntity(name.into()))?;

        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.relationships)
            .into_iter()
            .partition(|r| r.touches(name));
        self.relationships = kept;

        let orphaned_metrics = self.refresh_orphans();
        debug!(
            model = %self.name,
            entity = name,
            relationships = removed.len(),
            orphaned = orphaned_metrics.len(),
            "deleted entity"
        );
        Ok(EntityRemoval {
            entity,
            relationships: removed,
            orphaned_metrics,
        })
    }

    pub fn set_entity_display_name(&mut self, entity: &str, display_name: &str) -> ModelResult<()> {
        self.entity_mut(entity)?.display_name = display_name.into();
        Ok(())
    }

    pub fn set_entity_description(&mut self, entity: &str, description: &str) -> ModelResult<()> {
        self.entity_mut(entity)?.description = description.into();
        Ok(())
    }

    pub fn set_field_display_name(
        &mut self,
        entity: &str,
        field: &str,
        display_name: &str,
    ) -> ModelResult<()> {
        self.field_mut(entity, field)?.display_name = display_name.into();
        Ok(())
    }

    pub fn set_field_visible(&mut self, entity: &str, field: &str, visible: bool) -> ModelResult<()> {
        self.field_mut(entity, field)?.visible = visible;
        Ok(())
    }

    fn entity_mut(&mut self, name: &str) -> ModelResult<&mut Entity> {
        self.entities
            .get_mut(name)
            .ok_or_else(|| InvalidReference::UnknownEntity(name.into()).into())
    }

    fn field_mut(&mut self, entity: &str, field: &str) -> ModelResult<&mut Field> {
        self.entity_mut(entity)?
            .fields
            .get_mut(field)
            .ok_or_else(|| {
                InvalidReference::UnknownField {
                    entity: entity.into(),
                    field: field.into(),
                }
                .into()
            })
    }

    // =========================================================================
    // Relationships
    // =========================================================================

    /// Link two entity fields. Self-references are allowed; a relationship
    /// with the same four endpoints as an existing one is rejected.
    pub fn add_relationship(
        &mut self,
        from_entity: &str,
        to_entity: &str,
        from_field: &str,
        to_field: &str,
        cardinality: Cardinality,
    ) -> ModelResult<&Relationship> {
        self.check_field(from_entity, from_field)?;
        self.check_field(to_entity, to_field)?;

        let relationship =
            Relationship::new(from_entity, to_entity, from_field, to_field, cardinality);
        if self
            .relationships
            .iter()
            .any(|r| r.same_endpoints(&relationship))
        {
            return Err(ModelError::DuplicateRelationship {
                from_entity: from_entity.into(),
                from_field: from_field.into(),
                to_entity: to_entity.into(),
                to_field: to_field.into(),
            });
        }

        debug!(model = %self.name, from_entity, to_entity, %cardinality, "adding relationship");
        self.relationships.push(relationship);
        Ok(&self.relationships[self.relationships.len() - 1])
    }

    pub fn delete_relationship(&mut self, index: usize) -> ModelResult<Relationship> {
        if index >= self.relationships.len() {
            return Err(ModelError::UnknownRelationship(index));
        }
        Ok(self.relationships.remove(index))
    }

    fn check_field(&self, entity: &str, field: &str) -> Result<(), InvalidReference> {
        let e = self
            .entities
            .get(entity)
            .ok_or_else(|| InvalidReference::UnknownEntity(entity.into()))?;
        if !e.has_field(field) {
            return Err(InvalidReference::UnknownField {
                entity: entity.into(),
                field: field.into(),
            });
        }
        Ok(())
    }

    // =========================================================================
    // Metrics
    // =========================================================================

    /// Add a metric. Measure and dimension bindings must resolve; calculated
    /// references are checked at compile time so definitions can come in any
    /// order.
    pub fn add_metric(&mut self, metric: Metric) -> ModelResult<&Metric> {
        if self.metrics.contains_key(&metric.name) {
            return Err(ModelError::DuplicateMetric(metric.name));
        }
        self.insert_metric(metric)
    }

    /// Replace an existing metric in place, keeping its position.
    pub fn replace_metric(&mut self, metric: Metric) -> ModelResult<&Metric> {
        if !self.metrics.contains_key(&metric.name) {
            return Err(InvalidReference::UnknownMetric(metric.name).into());
        }
        self.insert_metric(metric)
    }

    fn insert_metric(&mut self, mut metric: Metric) -> ModelResult<&Metric> {
        if let Some((entity, field)) = metric.binding() {
            self.check_field(entity, field)?;
        }
        metric.orphaned = false;
        debug!(model = %self.name, metric = %metric.name, "storing metric");
        let name = metric.name.clone();
        self.metrics.insert(name.clone(), metric);
        Ok(&self.metrics[&name])
    }

    pub fn delete_metric(&mut self, name: &str) -> ModelResult<Metric> {
        self.metrics
            .shift_remove(name)
            .ok_or_else(|| InvalidReference::UnknownMetric(name.into()).into())
    }

    /// Recompute every measure/dimension `orphaned` flag against the current
    /// entities. Returns the metrics that became orphaned by this call.
    pub fn refresh_orphans(&mut self) -> Vec<String> {
        let mut newly_orphaned = Vec::new();
        for metric in self.metrics.values_mut() {
            let Some((entity, field)) = metric.binding() else {
                continue;
            };
            let resolves = self
                .entities
                .get(entity)
                .is_some_and(|e| e.has_field(field));
            if !resolves && !metric.orphaned {
                newly_orphaned.push(metric.name.clone());
            }
            metric.orphaned = !resolves;
        }
        newly_orphaned
    }
}
