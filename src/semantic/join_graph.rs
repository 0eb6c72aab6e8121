//! Join path resolution over the relationship graph.
//!
//! Relationships are undirected edges between entities. Starting from a base
//! entity, a breadth-first walk assigns every reachable entity the
//! relationship that discovered it first; when several relationships could
//! discover the same entity at the same depth, the one added to the model
//! earliest wins. The result is a join tree rooted at the base.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::model::{Cardinality, Model};
use crate::sql::JoinType;

use super::error::{CompileError, CompileResult};

/// How one entity is attached to the join tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinStep {
    pub entity: String,
    /// Entity already in the tree that this one joins to.
    pub parent: String,
    /// Index of the discovering relationship in the model.
    pub relationship: usize,
    pub parent_field: String,
    pub entity_field: String,
    /// Cardinality read from the parent side.
    pub cardinality: Cardinality,
}

impl JoinStep {
    pub fn join_type(&self) -> JoinType {
        join_type_for(self.cardinality)
    }
}

/// A self-referencing relationship on a reached entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfJoin {
    pub entity: String,
    pub relationship: usize,
    pub from_field: String,
    pub to_field: String,
    pub cardinality: Cardinality,
}

impl SelfJoin {
    pub fn join_type(&self) -> JoinType {
        join_type_for(self.cardinality)
    }
}

/// `INNER` for one-to-one links, `LEFT OUTER` for everything else.
pub fn join_type_for(cardinality: Cardinality) -> JoinType {
    match cardinality {
        Cardinality::OneToOne => JoinType::Inner,
        _ => JoinType::LeftOuter,
    }
}

/// BFS join tree from a base entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinPlan {
    pub base: String,
    /// Non-base entities in discovery order.
    pub steps: Vec<JoinStep>,
    pub self_joins: Vec<SelfJoin>,
    /// Entities with no path from the base, in model order.
    pub disconnected: Vec<String>,
}

impl JoinPlan {
    /// Walk the relationship graph from `base`.
    pub fn resolve(model: &Model, base: &str) -> CompileResult<Self> {
        if model.entity(base).is_none() {
            return Err(CompileError::UnknownEntity(base.into()));
        }

        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        let mut steps = Vec::new();
        let mut self_joins = Vec::new();

        visited.insert(base);
        queue.push_back(base);

        while let Some(current) = queue.pop_front() {
            for (index, rel) in model.relationships().iter().enumerate() {
                if rel.is_self_referencing() {
                    if rel.from_entity == current {
                        self_joins.push(SelfJoin {
                            entity: current.to_string(),
                            relationship: index,
                            from_field: rel.from_field.clone(),
                            to_field: rel.to_field.clone(),
                            cardinality: rel.cardinality,
                        });
                    }
                    continue;
                }

                let Some(edge) = rel.oriented_from(index, current) else {
                    continue;
                };
                if visited.contains(edge.far_entity) {
                    continue;
                }

                visited.insert(edge.far_entity);
                queue.push_back(edge.far_entity);
                steps.push(JoinStep {
                    entity: edge.far_entity.to_string(),
                    parent: current.to_string(),
                    relationship: index,
                    parent_field: edge.near_field.to_string(),
                    entity_field: edge.far_field.to_string(),
                    cardinality: edge.cardinality,
                });
            }
        }

        let disconnected = model
            .entities()
            .keys()
            .filter(|name| !visited.contains(name.as_str()))
            .cloned()
            .collect();

        Ok(Self {
            base: base.to_string(),
            steps,
            self_joins,
            disconnected,
        })
    }

    /// Base first, then every joined entity in discovery order.
    pub fn reached(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.base.as_str()).chain(self.steps.iter().map(|s| s.entity.as_str()))
    }

    pub fn contains(&self, entity: &str) -> bool {
        self.base == entity || self.step_for(entity).is_some()
    }

    pub fn step_for(&self, entity: &str) -> Option<&JoinStep> {
        self.steps.iter().find(|s| s.entity == entity)
    }

    /// Keep only the steps needed to reach `targets`: each target plus the
    /// intermediate entities on its path back to the base. Self-joins are
    /// dropped. Targets that are not reachable are returned separately.
    pub fn prune_to<'a>(&self, targets: impl IntoIterator<Item = &'a str>) -> (JoinPlan, Vec<String>) {
        let parents: HashMap<&str, &JoinStep> =
            self.steps.iter().map(|s| (s.entity.as_str(), s)).collect();

        let mut needed: HashSet<&str> = HashSet::new();
        let mut unreachable = Vec::new();

        for target in targets {
            if target == self.base {
                continue;
            }
            if !parents.contains_key(target) {
                if !unreachable.iter().any(|u| u == target) {
                    unreachable.push(target.to_string());
                }
                continue;
            }
            let mut current = target;
            while let Some(step) = parents.get(current) {
                if !needed.insert(current) {
                    break;
                }
                current = step.parent.as_str();
            }
        }

        let plan = JoinPlan {
            base: self.base.clone(),
            steps: self
                .steps
                .iter()
                .filter(|s| needed.contains(s.entity.as_str()))
                .cloned()
                .collect(),
            self_joins: Vec::new(),
            disconnected: Vec::new(),
        };
        (plan, unreachable)
    }
}
