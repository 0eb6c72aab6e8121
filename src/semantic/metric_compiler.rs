//! Single-metric SQL.
//!
//! Measures and dimensions read one entity field, joined to the primary
//! entity when a direct relationship exists. Calculated metrics substitute
//! every `[Reference]` with the referenced metric's own SQL fragment, after
//! the reference graph has been checked for cycles.

use std::collections::HashMap;

use tracing::debug;

use crate::model::{Aggregation, MetricKind, Model};
use crate::sql::{
    avg, count, count_distinct, max, min, raw_sql, sum, Expr, ExprExt, Query, SelectExpr,
};

use super::error::{CompileError, CompileResult};
use super::formula::{Formula, FormulaPart, ReferenceGraph};
use super::join_graph::join_type_for;
use super::scope::QueryScope;
use super::warning::Warning;
use super::Emitted;

/// Wrap a column in its aggregate function.
pub(crate) fn aggregate(aggregation: Aggregation, column: Expr) -> Expr {
    match aggregation {
        Aggregation::Sum => sum(column),
        Aggregation::Avg => avg(column),
        Aggregation::Min => min(column),
        Aggregation::Max => max(column),
        Aggregation::Count => count(column),
        Aggregation::CountDistinct => count_distinct(column),
    }
}

/// Upper bound on the parts (columns, aggregates, formula text) a single
/// expansion may splice together. Shared references are expanded once but
/// still appear in the output every time they are mentioned.
pub const MAX_EXPANDED_PARTS: usize = 10_000;

/// A metric's finished expansion.
struct Expanded {
    expr: Expr,
    /// Longest reference chain below this metric.
    height: usize,
    /// Parts in `expr` once fully spliced.
    size: usize,
}

/// Expands metrics into SQL expressions, binding every entity it touches
/// in the shared scope. Each metric is expanded at most once per expander.
pub(crate) struct Expander<'m, 's> {
    model: &'m Model,
    scope: &'s mut QueryScope,
    limit: usize,
    expanded: HashMap<String, Expanded>,
}

impl<'m, 's> Expander<'m, 's> {
    pub fn new(model: &'m Model, scope: &'s mut QueryScope, limit: usize) -> Self {
        Self {
            model,
            scope,
            limit,
            expanded: HashMap::new(),
        }
    }

    pub fn expand(&mut self, name: &str) -> CompileResult<Expr> {
        self.resolve(name, name, 0)?;
        self.cached(name)
    }

    fn cached(&self, name: &str) -> CompileResult<Expr> {
        self.expanded
            .get(name)
            .map(|e| e.expr.clone())
            .ok_or_else(|| CompileError::UnknownMetric(name.into()))
    }

    fn too_deep(&self, root: &str) -> CompileError {
        CompileError::ExpressionTooDeep {
            metric: root.into(),
            limit: self.limit,
        }
    }

    /// Expand `name` into the cache and return its `(height, size)`.
    fn resolve(&mut self, name: &str, root: &str, depth: usize) -> CompileResult<(usize, usize)> {
        if depth > self.limit {
            return Err(self.too_deep(root));
        }
        if let Some(done) = self.expanded.get(name) {
            if depth + done.height > self.limit {
                return Err(self.too_deep(root));
            }
            return Ok((done.height, done.size));
        }

        let model = self.model;
        let metric = model
            .metric(name)
            .ok_or_else(|| CompileError::UnknownMetric(name.into()))?;
        if metric.orphaned {
            return Err(CompileError::OrphanedMetric(name.into()));
        }

        let expanded = match &metric.kind {
            MetricKind::Measure {
                entity,
                field,
                aggregation,
            } => Expanded {
                expr: aggregate(*aggregation, self.scope.field_column(model, entity, field)?),
                height: 0,
                size: 1,
            },
            MetricKind::Dimension { entity, field } => Expanded {
                expr: self.scope.field_column(model, entity, field)?,
                height: 0,
                size: 1,
            },
            MetricKind::Calculated { expression } => {
                let formula = Formula::parse(expression);
                formula
                    .check_syntax()
                    .map_err(|message| CompileError::InvalidExpression {
                        metric: name.into(),
                        message,
                    })?;

                let mut parts = Vec::with_capacity(formula.parts().len());
                let mut height = 0;
                let mut size = 0;
                for part in formula.parts() {
                    match part {
                        FormulaPart::Text(text) => {
                            size += 1;
                            parts.push(raw_sql(text));
                        }
                        FormulaPart::Reference(reference) => {
                            let (inner_height, inner_size) =
                                self.resolve(reference, root, depth + 1)?;
                            height = height.max(inner_height + 1);
                            size += inner_size;
                            if size > MAX_EXPANDED_PARTS {
                                return Err(CompileError::ExpressionTooLarge {
                                    metric: root.into(),
                                    limit: MAX_EXPANDED_PARTS,
                                });
                            }
                            let inner = self.cached(reference)?;
                            let nested = model.metric(reference).is_some_and(|m| m.is_calculated());
                            parts.push(if nested { inner.paren() } else { inner });
                        }
                    }
                }
                Expanded {
                    expr: Expr::Formula(parts),
                    height,
                    size,
                }
            }
        };

        let footprint = (expanded.height, expanded.size);
        self.expanded.insert(name.to_string(), expanded);
        Ok(footprint)
    }
}

/// Fail with the cycle path if `name` reaches a reference cycle.
pub(crate) fn check_cycles(graph: &ReferenceGraph, name: &str) -> CompileResult<()> {
    match graph.cycle_from(name) {
        Some(path) => Err(CompileError::CircularReference { path }),
        None => Ok(()),
    }
}

/// Compile one metric to a standalone query.
pub fn emit_metric(
    model: &Model,
    name: &str,
    primary: Option<&str>,
    max_depth: usize,
) -> CompileResult<Emitted> {
    let metric = model
        .metric(name)
        .ok_or_else(|| CompileError::UnknownMetric(name.into()))?;
    if metric.orphaned {
        return Err(CompileError::OrphanedMetric(name.into()));
    }

    let emitted = match &metric.kind {
        MetricKind::Calculated { expression } => emit_calculated(model, name, expression, max_depth)?,
        MetricKind::Measure { entity, .. } | MetricKind::Dimension { entity, .. } => {
            emit_bound(model, name, entity, primary, max_depth)?
        }
    };
    debug!(metric = name, warnings = emitted.warnings.len(), "emitted metric query");
    Ok(emitted)
}

fn emit_bound(
    model: &Model,
    name: &str,
    entity: &str,
    primary: Option<&str>,
    max_depth: usize,
) -> CompileResult<Emitted> {
    let primary = match primary {
        Some(p) if model.entity(p).is_none() => return Err(CompileError::UnknownEntity(p.into())),
        Some(p) => p,
        None => model.first_entity().ok_or(CompileError::EmptyModel)?.0,
    };

    let mut warnings = Vec::new();
    let link = model.direct_relationship(primary, entity);
    if entity != primary && link.is_none() {
        warnings.push(Warning::UnjoinedEntity {
            metric: name.into(),
            entity: entity.into(),
            primary: primary.into(),
        });
    }

    let mut scope = QueryScope::default();
    if link.is_some() {
        scope.bind(model, primary)?;
    }
    let expr = Expander::new(model, &mut scope, max_depth).expand(name)?;

    let mut query = Query::new().select(vec![SelectExpr::new(expr).with_alias(name)]);
    if model.metric(name).is_some_and(|m| m.is_dimension()) {
        query = query.distinct();
    }

    match link {
        Some(link) => {
            query = query.from(scope.table_ref(primary)?);
            let on = scope
                .field_column(model, primary, link.near_field)?
                .eq(scope.field_column(model, entity, link.far_field)?);
            query = query.join(join_type_for(link.cardinality), scope.table_ref(entity)?, on);
        }
        None => query = query.from(scope.table_ref(entity)?),
    }

    Ok(Emitted { query, warnings })
}

fn emit_calculated(
    model: &Model,
    name: &str,
    expression: &str,
    max_depth: usize,
) -> CompileResult<Emitted> {
    check_cycles(&ReferenceGraph::build(model), name)?;

    let mut scope = QueryScope::default();
    let expr = Expander::new(model, &mut scope, max_depth).expand(name)?;

    let mut query = Query::new()
        .comment(format!("Expression: {}", expression))
        .select(vec![SelectExpr::new(expr).with_alias(name)]);
    let mut warnings = Vec::new();

    let touched: Vec<String> = scope.entities().map(String::from).collect();
    if let Some((first, rest)) = touched.split_first() {
        query = query.from(scope.table_ref(first)?);
        let (joined_query, joined, unjoined) = join_direct(model, &mut scope, query, first, rest)?;
        query = joined_query;
        if !unjoined.is_empty() {
            let warning = Warning::MultiSourceJoinUnresolved {
                context: format!("metric '{}'", name),
                joined: scope.table_names(joined.iter().map(String::as_str)),
                unjoined: scope.table_names(unjoined.iter().map(String::as_str)),
            };
            query = query.join_note(warning.to_string());
            warnings.push(warning);
        }
    }

    Ok(Emitted { query, warnings })
}

/// Join each pending entity through a direct relationship to any entity
/// already in the query, repeating until no more can be attached.
fn join_direct(
    model: &Model,
    scope: &mut QueryScope,
    mut query: Query,
    first: &str,
    rest: &[String],
) -> CompileResult<(Query, Vec<String>, Vec<String>)> {
    let mut joined = vec![first.to_string()];
    let mut pending: Vec<String> = rest.to_vec();

    let mut progress = true;
    while progress {
        progress = false;
        let mut i = 0;
        while i < pending.len() {
            let candidate = pending[i].clone();
            let link = joined
                .iter()
                .find_map(|anchor| model.direct_relationship(anchor, &candidate).map(|l| (anchor.clone(), l)));
            match link {
                Some((anchor, link)) => {
                    let on = scope
                        .field_column(model, &anchor, link.near_field)?
                        .eq(scope.field_column(model, &candidate, link.far_field)?);
                    query = query.join(
                        join_type_for(link.cardinality),
                        scope.table_ref(&candidate)?,
                        on,
                    );
                    joined.push(candidate);
                    pending.remove(i);
                    progress = true;
                }
                None => i += 1,
            }
        }
    }

    Ok((query, joined, pending))
}
