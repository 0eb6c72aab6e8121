//! # Quarry
//!
//! A semantic metric layer that compiles business models to multi-dialect SQL.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Schema catalog (sources and their columns)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [model mutation API]
//! ┌─────────────────────────────────────────────────────────┐
//! │      Model: entities, relationships, metrics             │
//! │      (saved and loaded as JSON / TOML documents)         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [semantic]
//! ┌─────────────────────────────────────────────────────────┐
//! │  join plan (model) · formula expansion (metric)          │
//! │  mention matching + time phrases (question)              │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [sql builder + dialect]
//! ┌─────────────────────────────────────────────────────────┐
//! │          SQL text + warnings                             │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod compile;
pub mod config;
pub mod model;
pub mod semantic;
pub mod sql;
pub mod validation;

// Re-export SQL submodules at crate level
pub use sql::dialect;
pub use sql::expr;
pub use sql::query;
pub use sql::token;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::compile::{
        answer_question, compile_metric, compile_model, CompileOptions, CompileOutput,
        QuestionOutput,
    };
    pub use crate::dialect::{Dialect, SqlDialect};
    pub use crate::model::{
        Aggregation, Cardinality, CatalogField, Entity, Field, InMemoryCatalog, Metric,
        MetricFormat, MetricKind, Model, ModelDocument, ModelError, ModelStore, Relationship,
        SchemaCatalog, TemplateMode,
    };
    pub use crate::semantic::{CompileError, Warning};
    pub use crate::validation::{validate, ValidationError};
}

// Also export at crate root for convenience
pub use compile::{answer_question, compile_metric, compile_model, CompileOptions};
pub use dialect::Dialect;
pub use model::Model;
