//! Validation of semantic models.
//!
//! Mutation keeps a model consistent one call at a time, but a document
//! loaded from disk is taken as written. `validate` reports everything that
//! would make compilation fail or surprise.

use std::collections::HashSet;

use crate::model::{MetricKind, Model};
use crate::semantic::{Formula, ReferenceGraph};

/// Validation error.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Calculated metrics that reference each other.
    CircularDependency { cycle: Vec<String> },
    /// Reference to something the model does not define.
    UndefinedReference {
        entity_type: String,
        entity_name: String,
        reference_type: String,
        reference_name: String,
    },
    /// Formula that does not parse as a SQL expression.
    InvalidExpression { metric: String, message: String },
    /// Metric whose entity or field was deleted.
    OrphanedMetric { metric: String },
    /// Two relationships over the same endpoints.
    DuplicateRelationship { first: usize, second: usize },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::CircularDependency { cycle } => {
                write!(f, "Circular dependency between metrics: {}", cycle.join(", "))
            }
            ValidationError::UndefinedReference {
                entity_type,
                entity_name,
                reference_type,
                reference_name,
            } => {
                write!(
                    f,
                    "{} '{}' references undefined {} '{}'",
                    entity_type, entity_name, reference_type, reference_name
                )
            }
            ValidationError::InvalidExpression { metric, message } => {
                write!(f, "Metric '{}' has an invalid expression: {}", metric, message)
            }
            ValidationError::OrphanedMetric { metric } => {
                write!(f, "Metric '{}' is orphaned", metric)
            }
            ValidationError::DuplicateRelationship { first, second } => {
                write!(
                    f,
                    "Relationship #{} duplicates relationship #{}",
                    second, first
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a semantic model.
pub fn validate(model: &Model) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_relationships(model, &mut errors);
    validate_metrics(model, &mut errors);
    validate_circular_dependencies(model, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn undefined(entity_type: &str, entity_name: &str, reference_type: &str, reference_name: &str) -> ValidationError {
    ValidationError::UndefinedReference {
        entity_type: entity_type.to_string(),
        entity_name: entity_name.to_string(),
        reference_type: reference_type.to_string(),
        reference_name: reference_name.to_string(),
    }
}

fn validate_relationships(model: &Model, errors: &mut Vec<ValidationError>) {
    let relationships = model.relationships();
    for (index, rel) in relationships.iter().enumerate() {
        let label = format!("#{}", index);
        for (entity, field) in [(&rel.from_entity, &rel.from_field), (&rel.to_entity, &rel.to_field)] {
            match model.entity(entity) {
                None => errors.push(undefined("Relationship", &label, "entity", entity)),
                Some(e) if !e.has_field(field) => errors.push(undefined(
                    "Relationship",
                    &label,
                    "field",
                    &format!("{}.{}", entity, field),
                )),
                Some(_) => {}
            }
        }

        if let Some(first) = relationships[..index].iter().position(|r| r.same_endpoints(rel)) {
            errors.push(ValidationError::DuplicateRelationship {
                first,
                second: index,
            });
        }
    }
}

fn validate_metrics(model: &Model, errors: &mut Vec<ValidationError>) {
    for (name, metric) in model.metrics() {
        if metric.orphaned {
            errors.push(ValidationError::OrphanedMetric {
                metric: name.clone(),
            });
            continue;
        }

        let MetricKind::Calculated { expression } = &metric.kind else {
            continue;
        };
        let formula = Formula::parse(expression);
        if let Err(message) = formula.check_syntax() {
            errors.push(ValidationError::InvalidExpression {
                metric: name.clone(),
                message,
            });
        }
    }

    let graph = ReferenceGraph::build(model);
    let mut reported = HashSet::new();
    for (metric, reference) in graph.unresolved() {
        if reported.insert((metric, reference)) {
            errors.push(undefined("Metric", metric, "metric", reference));
        }
    }
}

fn validate_circular_dependencies(model: &Model, errors: &mut Vec<ValidationError>) {
    for cycle in ReferenceGraph::build(model).cycles() {
        errors.push(ValidationError::CircularDependency { cycle });
    }
}
