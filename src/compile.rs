//! End-to-end compilation from a model to SQL text.
//!
//! ```text
//! Model → join plan / metric expansion / question matching → Query → SQL
//! ```
//!
//! # Example
//!
//! ```
//! use quarry::compile::{compile_metric, CompileOptions};
//! use quarry::model::{Aggregation, InMemoryCatalog, Metric, Model};
//! use quarry::sql::Dialect;
//!
//! let catalog = InMemoryCatalog::new().with_source("orders", &["order_id", "total_amount"]);
//! let mut model = Model::new("sales");
//! model.add_entity(&catalog, "orders", "Orders").unwrap();
//! model
//!     .add_metric(Metric::measure("TotalRevenue", "Orders", "total_amount", Aggregation::Sum))
//!     .unwrap();
//!
//! let options = CompileOptions::default().with_dialect(Dialect::Postgres);
//! let output = compile_metric(&model, "TotalRevenue", &options).unwrap();
//! assert!(output.sql.contains("SUM(\"orders\".\"total_amount\")"));
//! ```

use serde::Serialize;
use tracing::debug;

use crate::model::Model;
use crate::semantic::{self, CompileResult, Emitted, Warning};
use crate::sql::query::Query;
use crate::sql::Dialect;

/// Default cap on nested calculated-metric references.
pub const DEFAULT_MAX_EXPRESSION_DEPTH: usize = 32;

/// Substrings marking a dimension as date-like.
pub const DEFAULT_DATE_INDICATORS: [&str; 7] =
    ["date", "time", "day", "week", "month", "quarter", "year"];

// ============================================================================
// Options
// ============================================================================

/// Options for compilation.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// SQL dialect to generate.
    pub dialect: Dialect,
    /// Root of the whole-model join tree (default: first entity).
    pub base_entity: Option<String>,
    /// Entity single metrics are joined to (default: first entity).
    pub primary_entity: Option<String>,
    pub max_expression_depth: usize,
    pub date_indicators: Vec<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            base_entity: None,
            primary_entity: None,
            max_expression_depth: DEFAULT_MAX_EXPRESSION_DEPTH,
            date_indicators: DEFAULT_DATE_INDICATORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CompileOptions {
    /// Set the SQL dialect.
    #[must_use]
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    #[must_use]
    pub fn with_base_entity(mut self, entity: &str) -> Self {
        self.base_entity = Some(entity.into());
        self
    }

    #[must_use]
    pub fn with_primary_entity(mut self, entity: &str) -> Self {
        self.primary_entity = Some(entity.into());
        self
    }

    #[must_use]
    pub fn with_max_expression_depth(mut self, depth: usize) -> Self {
        self.max_expression_depth = depth;
        self
    }

    #[must_use]
    pub fn with_date_indicators(mut self, indicators: Vec<String>) -> Self {
        self.date_indicators = indicators;
        self
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Result of compiling a model or a metric to SQL.
#[derive(Debug, Clone, Serialize)]
pub struct CompileOutput {
    /// The generated SQL string.
    pub sql: String,

    /// The SQL query AST (for further manipulation if needed).
    #[serde(skip)]
    pub query: Query,

    pub warnings: Vec<Warning>,

    /// The dialect used for generation.
    pub dialect: Dialect,
}

impl CompileOutput {
    fn render(emitted: Emitted, dialect: Dialect) -> Self {
        Self {
            sql: emitted.query.to_sql(dialect),
            query: emitted.query,
            warnings: emitted.warnings,
            dialect,
        }
    }
}

/// Result of answering a question.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionOutput {
    pub sql: String,
    #[serde(skip)]
    pub query: Query,
    pub matched_metrics: Vec<String>,
    pub matched_dimensions: Vec<String>,
    pub warnings: Vec<Warning>,
    pub dialect: Dialect,
}

// ============================================================================
// Compilation Functions
// ============================================================================

/// Compile the whole model into one multi-entity query.
pub fn compile_model(model: &Model, options: &CompileOptions) -> CompileResult<CompileOutput> {
    let emitted = semantic::emit_model(model, options.base_entity.as_deref())?;
    debug!(model = model.name(), dialect = %options.dialect, "compiled model");
    Ok(CompileOutput::render(emitted, options.dialect))
}

/// Compile a single metric into a standalone query.
pub fn compile_metric(
    model: &Model,
    name: &str,
    options: &CompileOptions,
) -> CompileResult<CompileOutput> {
    let emitted = semantic::emit_metric(
        model,
        name,
        options.primary_entity.as_deref(),
        options.max_expression_depth,
    )?;
    debug!(model = model.name(), metric = name, dialect = %options.dialect, "compiled metric");
    Ok(CompileOutput::render(emitted, options.dialect))
}

/// Pick the metrics mentioned in `question` and compile them into one query.
pub fn answer_question(
    model: &Model,
    question: &str,
    options: &CompileOptions,
) -> CompileResult<QuestionOutput> {
    let answer = semantic::answer_question(
        model,
        question,
        options.max_expression_depth,
        &options.date_indicators,
    )?;
    debug!(model = model.name(), dialect = %options.dialect, "compiled question");
    Ok(QuestionOutput {
        sql: answer.query.to_sql(options.dialect),
        query: answer.query,
        matched_metrics: answer.matched_metrics,
        matched_dimensions: answer.matched_dimensions,
        warnings: answer.warnings,
        dialect: options.dialect,
    })
}
