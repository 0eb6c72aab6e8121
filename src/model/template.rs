//! Applying one model to another as a template.
//!
//! A template is an ordinary model, usually loaded from a document. Its
//! entities can be remapped onto different catalog sources; remapped
//! entities are re-seeded from the catalog and keep only the template's
//! display name and description.

use std::collections::HashMap;

use tracing::debug;

use super::catalog::SchemaCatalog;
use super::entity::Entity;
use super::error::{InvalidReference, ModelResult};
use super::Model;

/// How a template combines with the target model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemplateMode {
    /// Discard the target's entities, relationships and metrics. Its name and
    /// description survive.
    Replace,
    /// Keep everything the target has and add only what is missing.
    #[default]
    Merge,
}

/// What [`Model::apply_template`] added and passed over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateReport {
    pub entities_added: Vec<String>,
    /// Already present in the target (merge only).
    pub entities_skipped: Vec<String>,
    pub relationships_added: usize,
    /// Duplicates, or endpoints missing from the result.
    pub relationships_skipped: usize,
    pub metrics_added: Vec<String>,
    /// Already present, or bound to an entity missing from the result.
    pub metrics_skipped: Vec<String>,
}

impl Model {
    /// Apply `template` to this model.
    ///
    /// `sources` maps template entity names to catalog sources. Unmapped
    /// entities are copied as the template defines them. Relationships are
    /// added when both endpoints resolve in the result and no relationship
    /// with the same four endpoints exists. On error the model is unchanged.
    pub fn apply_template(
        &mut self,
        template: &Model,
        catalog: &impl SchemaCatalog,
        sources: &HashMap<String, String>,
        mode: TemplateMode,
    ) -> ModelResult<TemplateReport> {
        let mut next = match mode {
            TemplateMode::Replace => {
                let mut fresh = Model::new(&self.name);
                fresh.description = self.description.clone();
                fresh
            }
            TemplateMode::Merge => self.clone(),
        };
        let mut report = TemplateReport::default();

        for (name, entity) in &template.entities {
            if next.entities.contains_key(name) {
                report.entities_skipped.push(name.clone());
                continue;
            }
            let entity = match sources.get(name) {
                Some(source) => reseed(entity, name, source, catalog)?,
                None => entity.clone(),
            };
            next.entities.insert(name.clone(), entity);
            report.entities_added.push(name.clone());
        }

        for relationship in &template.relationships {
            let resolves = next.check_field(&relationship.from_entity, &relationship.from_field).is_ok()
                && next.check_field(&relationship.to_entity, &relationship.to_field).is_ok();
            let duplicate = next
                .relationships
                .iter()
                .any(|r| r.same_endpoints(relationship));
            if resolves && !duplicate {
                next.relationships.push(relationship.clone());
                report.relationships_added += 1;
            } else {
                report.relationships_skipped += 1;
            }
        }

        for (name, metric) in &template.metrics {
            let entity_missing = metric
                .binding()
                .is_some_and(|(entity, _)| !next.entities.contains_key(entity));
            let keep = match mode {
                TemplateMode::Replace => true,
                TemplateMode::Merge => !next.metrics.contains_key(name) && !entity_missing,
            };
            if keep {
                next.metrics.insert(name.clone(), metric.clone());
                report.metrics_added.push(name.clone());
            } else {
                report.metrics_skipped.push(name.clone());
            }
        }

        next.refresh_orphans();
        debug!(
            model = %self.name,
            ?mode,
            entities = report.entities_added.len(),
            relationships = report.relationships_added,
            metrics = report.metrics_added.len(),
            "applied template"
        );
        *self = next;
        Ok(report)
    }
}

fn reseed(
    template: &Entity,
    name: &str,
    source: &str,
    catalog: &impl SchemaCatalog,
) -> ModelResult<Entity> {
    let columns = catalog
        .list_fields(source)
        .ok_or_else(|| InvalidReference::UnknownSource(source.into()))?;
    let mut entity = Entity::from_catalog(name, source, &columns);
    entity.display_name = template.display_name.clone();
    entity.description = template.description.clone();
    Ok(entity)
}
