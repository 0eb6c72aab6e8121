//! Natural-language questions over a model's metrics.
//!
//! Matching is substring based: a metric is picked when the question
//! mentions its name, its humanized name (`TotalRevenue` -> `total revenue`),
//! its description, or the field it reads. Picked aggregates and dimensions
//! are compiled into one grouped query, with the join tree pruned to the
//! entities they touch.

use inflector::cases::snakecase::to_snake_case;
use tracing::debug;

use crate::model::{Metric, Model};
use crate::sql::{Expr, ExprExt, OrderByExpr, Query, SelectExpr};

use super::error::{CompileError, CompileResult};
use super::formula::ReferenceGraph;
use super::join_graph::JoinPlan;
use super::metric_compiler::{check_cycles, Expander};
use super::period::RelativePeriod;
use super::scope::QueryScope;
use super::warning::Warning;

/// The compiled answer to a question.
#[derive(Debug, Clone)]
pub struct Answer {
    pub query: Query,
    pub warnings: Vec<Warning>,
    /// Aggregated metrics (measures and calculated), in model order.
    pub matched_metrics: Vec<String>,
    /// Grouping dimensions, in model order.
    pub matched_dimensions: Vec<String>,
}

/// `TotalRevenue` -> `total revenue`, `order_date` -> `order date`.
pub fn humanize(name: &str) -> String {
    to_snake_case(name).replace('_', " ")
}

/// `needle` occurs in `haystack` with no alphanumeric neighbours.
fn contains_words(haystack: &str, needle: &str) -> bool {
    if needle.trim().is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, m)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + m.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Whether `question` (lowercased) mentions `metric`.
pub fn is_mentioned(metric: &Metric, question: &str) -> bool {
    let phrases = [
        metric.name.to_lowercase(),
        humanize(&metric.name),
        metric.description.to_lowercase(),
    ];
    if phrases
        .iter()
        .any(|p| !p.trim().is_empty() && question.contains(p.as_str()))
    {
        return true;
    }
    match metric.binding() {
        Some((_, field)) => contains_words(question, &humanize(field)),
        None => false,
    }
}

fn is_date_like(metric: &Metric, indicators: &[String]) -> bool {
    let name = metric.name.to_lowercase();
    let field = metric.binding().map(|(_, f)| f.to_lowercase()).unwrap_or_default();
    indicators.iter().any(|i| {
        let i = i.to_lowercase();
        !i.is_empty() && (name.contains(&i) || field.contains(&i))
    })
}

/// Compile `question` against `model`.
pub fn answer_question(
    model: &Model,
    question: &str,
    max_depth: usize,
    date_indicators: &[String],
) -> CompileResult<Answer> {
    let text = question.to_lowercase();
    let mut warnings = Vec::new();

    let mut aggregates: Vec<&Metric> = Vec::new();
    let mut dimensions: Vec<&Metric> = Vec::new();
    for metric in model.metrics().values() {
        if !is_mentioned(metric, &text) {
            continue;
        }
        if metric.orphaned {
            warnings.push(Warning::OrphanedMetricIgnored {
                metric: metric.name.clone(),
            });
            continue;
        }
        if metric.is_dimension() {
            dimensions.push(metric);
        } else {
            aggregates.push(metric);
        }
    }
    if aggregates.is_empty() && dimensions.is_empty() {
        return Err(CompileError::NoMetricsFound);
    }

    if aggregates.iter().any(|m| m.is_calculated()) {
        let graph = ReferenceGraph::build(model);
        for metric in aggregates.iter().filter(|m| m.is_calculated()) {
            check_cycles(&graph, &metric.name)?;
        }
    }

    // Aggregates bind first so the primary entity is the one being measured.
    let mut scope = QueryScope::default();
    let mut measure_select = Vec::new();
    let mut dimension_columns: Vec<(&Metric, Expr)> = Vec::new();
    {
        let mut expander = Expander::new(model, &mut scope, max_depth);
        for metric in &aggregates {
            let expr = expander.expand(&metric.name)?;
            measure_select.push(SelectExpr::new(expr).with_alias(&metric.name));
        }
        for metric in dimensions.iter().copied() {
            dimension_columns.push((metric, expander.expand(&metric.name)?));
        }
    }

    let mut query = Query::new();
    let touched: Vec<String> = scope.entities().map(String::from).collect();
    if let Some(primary) = touched.first() {
        let plan = JoinPlan::resolve(model, primary)?;
        let (plan, unreachable) = plan.prune_to(touched.iter().map(String::as_str));
        for step in &plan.steps {
            scope.bind(model, &step.entity)?;
        }

        query = query.from(scope.table_ref(primary)?);
        for step in &plan.steps {
            let on = scope
                .field_column(model, &step.parent, &step.parent_field)?
                .eq(scope.field_column(model, &step.entity, &step.entity_field)?);
            query = query.join(step.join_type(), scope.table_ref(&step.entity)?, on);
        }

        if !unreachable.is_empty() {
            let warning = Warning::MultiSourceJoinUnresolved {
                context: "question".into(),
                joined: scope.table_names(plan.reached()),
                unjoined: scope.table_names(unreachable.iter().map(String::as_str)),
            };
            query = query.join_note(warning.to_string());
            warnings.push(warning);
        }
    }

    let mut select: Vec<SelectExpr> = dimension_columns
        .iter()
        .map(|(metric, column)| SelectExpr::new(column.clone()).with_alias(&metric.name))
        .collect();
    select.extend(measure_select);
    query = query.select(select);

    if !dimension_columns.is_empty() {
        if aggregates.is_empty() {
            query = query.distinct();
        } else {
            let mut group_by: Vec<Expr> = Vec::new();
            for (_, column) in &dimension_columns {
                if !group_by.contains(column) {
                    group_by.push(column.clone());
                }
            }
            query = query.group_by(group_by);
        }
    }

    let date_column = dimension_columns
        .iter()
        .find(|(metric, _)| is_date_like(metric, date_indicators))
        .map(|(_, column)| column);
    for period in RelativePeriod::find_all(&text) {
        match date_column {
            Some(column) => query = query.filter(period.predicate(column.clone())),
            None => warnings.push(Warning::TimeFilterUnapplied {
                phrase: period.phrase().to_string(),
            }),
        }
    }

    let order_by: Vec<OrderByExpr> = dimension_columns
        .iter()
        .filter(|(metric, _)| is_date_like(metric, date_indicators))
        .map(|(_, column)| OrderByExpr::asc(column.clone()))
        .collect();
    if !order_by.is_empty() {
        query = query.order_by(order_by);
    }

    let answer = Answer {
        query,
        warnings,
        matched_metrics: aggregates.iter().map(|m| m.name.clone()).collect(),
        matched_dimensions: dimensions.iter().map(|m| m.name.clone()).collect(),
    };
    debug!(
        metrics = answer.matched_metrics.len(),
        dimensions = answer.matched_dimensions.len(),
        warnings = answer.warnings.len(),
        "answered question"
    );
    Ok(answer)
}
