//! Whole-model SQL: one projection per reachable entity plus a join assembly.
//!
//! ```text
//! WITH orders_base AS (SELECT <visible fields> FROM orders),
//!      customers_view AS (SELECT <visible fields, prefixed> FROM customers)
//! SELECT b.*, customers.*
//! FROM orders_base AS b
//! LEFT OUTER JOIN customers_view AS customers ON b.<key> = customers.<key>
//! ```

use std::collections::{HashMap, HashSet};

use inflector::cases::snakecase::to_snake_case;
use tracing::debug;

use crate::model::{Entity, Model};
use crate::sql::{col, lit_null, table_col, Cte, ExprExt, Query, SelectExpr, TableRef};

use super::error::{CompileError, CompileResult};
use super::join_graph::JoinPlan;
use super::scope::source_table;
use super::warning::Warning;
use super::Emitted;

/// Alias of the placeholder column projected when nothing is visible.
const EMPTY_PROJECTION_ALIAS: &str = "no_visible_fields";

/// Hands out names that are unique within one statement.
#[derive(Debug, Default)]
struct NameAllocator {
    taken: HashSet<String>,
}

impl NameAllocator {
    fn claim(&mut self, wanted: &str) -> String {
        let mut name = wanted.to_string();
        let mut n = 2;
        while self.taken.contains(&name) {
            name = format!("{}_{}", wanted, n);
            n += 1;
        }
        self.taken.insert(name.clone());
        name
    }
}

/// Whitespace runs become `_`: `Order Date` -> `Order_Date`.
fn sanitize(display_name: &str) -> String {
    display_name.split_whitespace().collect::<Vec<_>>().join("_")
}

struct ProjectedColumn {
    field: String,
    source_column: String,
    alias: String,
    visible: bool,
}

/// One entity's CTE.
struct Projection {
    entity: String,
    cte: String,
    alias: String,
    columns: Vec<ProjectedColumn>,
}

impl Projection {
    fn build(
        name: &str,
        entity: &Entity,
        is_base: bool,
        join_keys: &HashSet<&str>,
        names: &mut NameAllocator,
        aliases: &mut NameAllocator,
    ) -> Self {
        let snake = to_snake_case(name);
        let cte = names.claim(&format!("{}_{}", snake, if is_base { "base" } else { "view" }));
        let alias = if is_base {
            names.claim("b")
        } else {
            names.claim(&snake)
        };

        let prefix = sanitize(name);
        let columns = entity
            .fields
            .iter()
            .filter(|(field, f)| f.visible || join_keys.contains(field.as_str()))
            .map(|(field, f)| {
                let display = sanitize(&f.display_name);
                let wanted = if is_base {
                    display
                } else {
                    format!("{}_{}", prefix, display)
                };
                ProjectedColumn {
                    field: field.clone(),
                    source_column: f.source_column.clone(),
                    alias: aliases.claim(&wanted),
                    visible: f.visible,
                }
            })
            .collect();

        Self {
            entity: name.to_string(),
            cte,
            alias,
            columns,
        }
    }

    fn has_visible(&self) -> bool {
        self.columns.iter().any(|c| c.visible)
    }

    fn column_alias(&self, field: &str) -> CompileResult<&str> {
        self.columns
            .iter()
            .find(|c| c.field == field)
            .map(|c| c.alias.as_str())
            .ok_or_else(|| CompileError::UnknownField {
                entity: self.entity.clone(),
                field: field.into(),
            })
    }

    fn to_cte(&self, source: &str) -> Cte {
        let select: Vec<SelectExpr> = if self.columns.is_empty() {
            vec![SelectExpr::new(lit_null()).with_alias(EMPTY_PROJECTION_ALIAS)]
        } else {
            self.columns
                .iter()
                .map(|c| SelectExpr::new(col(&c.source_column)).with_alias(&c.alias))
                .collect()
        };
        Cte::new(&self.cte, Query::new().select(select).from(source_table(source)))
    }
}

/// Compile the whole model from `base` (default: first entity).
pub fn emit_model(model: &Model, base: Option<&str>) -> CompileResult<Emitted> {
    let (first, _) = model.first_entity().ok_or(CompileError::EmptyModel)?;
    let base = base.unwrap_or(first);
    let plan = JoinPlan::resolve(model, base)?;

    let mut warnings: Vec<Warning> = plan
        .disconnected
        .iter()
        .map(|entity| Warning::DisconnectedEntity {
            entity: entity.clone(),
            base: base.to_string(),
        })
        .collect();

    // Fields every join needs, per entity.
    let mut join_keys: HashMap<&str, HashSet<&str>> = HashMap::new();
    for step in &plan.steps {
        join_keys
            .entry(step.parent.as_str())
            .or_default()
            .insert(step.parent_field.as_str());
        join_keys
            .entry(step.entity.as_str())
            .or_default()
            .insert(step.entity_field.as_str());
    }
    for self_join in &plan.self_joins {
        let keys = join_keys.entry(self_join.entity.as_str()).or_default();
        keys.insert(self_join.from_field.as_str());
        keys.insert(self_join.to_field.as_str());
    }

    // Table names and output column names are separate namespaces.
    let mut names = NameAllocator::default();
    let mut aliases = NameAllocator::default();
    let no_keys = HashSet::new();
    let mut projections: Vec<Projection> = Vec::new();
    for (i, name) in plan.reached().enumerate() {
        let entity = model
            .entity(name)
            .ok_or_else(|| CompileError::UnknownEntity(name.into()))?;
        let keys = join_keys.get(name).unwrap_or(&no_keys);
        let projection = Projection::build(name, entity, i == 0, keys, &mut names, &mut aliases);
        if !projection.has_visible() {
            warnings.push(Warning::EmptyProjection {
                entity: name.to_string(),
            });
        }
        projections.push(projection);
    }
    let by_entity: HashMap<&str, &Projection> =
        projections.iter().map(|p| (p.entity.as_str(), p)).collect();

    let mut query = Query::new();
    for entity in &plan.disconnected {
        query = query.comment(format!(
            "Entity '{}' is not connected to '{}'; excluded from the join assembly",
            entity, base
        ));
    }
    for projection in &projections {
        let source = &model
            .entity(&projection.entity)
            .ok_or_else(|| CompileError::UnknownEntity(projection.entity.clone()))?
            .source;
        query = query.with_cte(projection.to_cte(source));
    }

    let mut select: Vec<SelectExpr> = Vec::new();
    for projection in &projections {
        for column in projection.columns.iter().filter(|c| c.visible) {
            select.push(SelectExpr::new(table_col(&projection.alias, &column.alias)));
        }
    }

    let root = projections.first().ok_or(CompileError::EmptyModel)?;
    query = query.from(TableRef::new(&root.cte).with_alias(&root.alias));

    for step in &plan.steps {
        let parent = by_entity
            .get(step.parent.as_str())
            .ok_or_else(|| CompileError::UnknownEntity(step.parent.clone()))?;
        let child = by_entity
            .get(step.entity.as_str())
            .ok_or_else(|| CompileError::UnknownEntity(step.entity.clone()))?;
        let on = table_col(&parent.alias, parent.column_alias(&step.parent_field)?)
            .eq(table_col(&child.alias, child.column_alias(&step.entity_field)?));
        query = query.join(
            step.join_type(),
            TableRef::new(&child.cte).with_alias(&child.alias),
            on,
        );
    }

    for self_join in &plan.self_joins {
        let projection = by_entity
            .get(self_join.entity.as_str())
            .ok_or_else(|| CompileError::UnknownEntity(self_join.entity.clone()))?;
        let self_alias = names.claim(&format!("{}_self", projection.alias));
        let on = table_col(&projection.alias, projection.column_alias(&self_join.from_field)?)
            .eq(table_col(&self_alias, projection.column_alias(&self_join.to_field)?));
        query = query.join(
            self_join.join_type(),
            TableRef::new(&projection.cte).with_alias(&self_alias),
            on,
        );
        for column in projection.columns.iter().filter(|c| c.visible) {
            select.push(
                SelectExpr::new(table_col(&self_alias, &column.alias))
                    .with_alias(&aliases.claim(&format!("{}_{}", self_alias, column.alias))),
            );
        }
    }

    if select.is_empty() {
        select.push(SelectExpr::new(lit_null()).with_alias(EMPTY_PROJECTION_ALIAS));
    }
    query = query.select(select);

    debug!(
        model = model.name(),
        base,
        entities = projections.len(),
        self_joins = plan.self_joins.len(),
        warnings = warnings.len(),
        "emitted model query"
    );
    Ok(Emitted { query, warnings })
}
