//! Semantic layer - turns a model and its metrics into SQL queries.
//!
//! Three compilation paths share the same building blocks:
//!
//! 1. **Model** - one CTE per entity reachable from a base entity, joined
//!    along a breadth-first join tree ([`model_emitter`])
//! 2. **Metric** - a single measure, dimension, or calculated formula with
//!    references expanded inline ([`metric_compiler`])
//! 3. **Question** - metrics picked out of free text, grouped by matched
//!    dimensions and filtered by relative time phrases ([`question`])
//!
//! Every path returns a [`crate::sql::Query`] plus non-fatal [`Warning`]s.

pub mod error;
pub mod formula;
pub mod join_graph;
pub mod metric_compiler;
pub mod model_emitter;
pub mod period;
pub mod question;
pub(crate) mod scope;
pub mod warning;

use crate::sql::Query;

pub use error::{CompileError, CompileResult};
pub use formula::{Formula, FormulaPart, ReferenceGraph};
pub use join_graph::{join_type_for, JoinPlan, JoinStep, SelfJoin};
pub use metric_compiler::{emit_metric, MAX_EXPANDED_PARTS};
pub use model_emitter::emit_model;
pub use period::RelativePeriod;
pub use question::{answer_question, humanize, Answer};
pub use warning::Warning;

/// A compiled query and the warnings raised while building it.
#[derive(Debug, Clone)]
pub struct Emitted {
    pub query: Query,
    pub warnings: Vec<Warning>,
}
