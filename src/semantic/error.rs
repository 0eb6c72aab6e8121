//! Errors raised while compiling a model, metric or question to SQL.

use thiserror::Error;

/// Result type for semantic compilation.
pub type CompileResult<T> = Result<T, CompileError>;

/// Structural problems that make a compilation impossible.
///
/// Recoverable situations (disconnected entities, unresolved joins...) are
/// reported as [`Warning`](super::Warning)s alongside a best-effort result
/// instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("model has no entities")]
    EmptyModel,

    #[error("entity '{0}' does not exist")]
    UnknownEntity(String),

    #[error("field '{field}' does not exist on entity '{entity}'")]
    UnknownField { entity: String, field: String },

    #[error("metric '{0}' does not exist")]
    UnknownMetric(String),

    #[error("metric '{0}' is orphaned: its entity or field no longer exists")]
    OrphanedMetric(String),

    #[error("circular metric reference: {}", path.join(" -> "))]
    CircularReference { path: Vec<String> },

    #[error("metric '{metric}' nests calculated references deeper than {limit}")]
    ExpressionTooDeep { metric: String, limit: usize },

    #[error("metric '{metric}' expands to more than {limit} formula parts")]
    ExpressionTooLarge { metric: String, limit: usize },

    #[error("invalid expression in metric '{metric}': {message}")]
    InvalidExpression { metric: String, message: String },

    #[error("no metrics or dimensions matched the question")]
    NoMetricsFound,
}
