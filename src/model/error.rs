// src/model/error.rs
use thiserror::Error;

/// Result type for model mutations and persistence.
pub type ModelResult<T> = Result<T, ModelError>;

/// A name in a mutation request that does not resolve against the model
/// (or the schema catalog, for sources).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidReference {
    #[error("source '{0}' is not in the schema catalog")]
    UnknownSource(String),

    #[error("entity '{0}' does not exist")]
    UnknownEntity(String),

    #[error("field '{field}' does not exist on entity '{entity}'")]
    UnknownField { entity: String, field: String },

    #[error("metric '{0}' does not exist")]
    UnknownMetric(String),
}

/// Errors from model mutation, the model store, and document I/O.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid reference: {0}")]
    InvalidReference(#[from] InvalidReference),

    #[error("model '{0}' already exists")]
    DuplicateModel(String),

    #[error("model '{0}' does not exist")]
    UnknownModel(String),

    #[error("entity '{0}' already exists")]
    DuplicateEntity(String),

    #[error("relationship {from_entity}.{from_field} -> {to_entity}.{to_field} already exists")]
    DuplicateRelationship {
        from_entity: String,
        from_field: String,
        to_entity: String,
        to_field: String,
    },

    #[error("relationship #{0} does not exist")]
    UnknownRelationship(usize),

    #[error("metric '{0}' already exists")]
    DuplicateMetric(String),

    #[error("unsupported model format version '{found}' (expected 1.x)")]
    UnsupportedFormatVersion { found: String },

    #[error("unsupported file extension '{extension}'. Supported: .json, .toml")]
    UnsupportedExtension { extension: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}
