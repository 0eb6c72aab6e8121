//! Non-fatal findings returned alongside compiled SQL.

use serde::Serialize;

/// Something the compiler worked around. The SQL is still produced, but
/// may not mean what the caller expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Entity unreachable from the base entity; left out of the join assembly.
    DisconnectedEntity { entity: String, base: String },

    /// Entity with no visible fields; a placeholder column was projected.
    EmptyProjection { entity: String },

    /// No direct relationship between the metric's entity and the primary
    /// entity; the metric reads its own source unjoined.
    UnjoinedEntity {
        metric: String,
        entity: String,
        primary: String,
    },

    /// Some touched tables could not be joined to the rest of the query.
    MultiSourceJoinUnresolved {
        context: String,
        joined: Vec<String>,
        unjoined: Vec<String>,
    },

    /// A time phrase was found but no date-like dimension was matched.
    TimeFilterUnapplied { phrase: String },

    /// An orphaned metric matched the question and was skipped.
    OrphanedMetricIgnored { metric: String },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::DisconnectedEntity { entity, base } => write!(
                f,
                "entity '{}' is not connected to '{}' and was left out",
                entity, base
            ),
            Warning::EmptyProjection { entity } => {
                write!(f, "entity '{}' has no visible fields", entity)
            }
            Warning::UnjoinedEntity {
                metric,
                entity,
                primary,
            } => write!(
                f,
                "metric '{}': no direct relationship between '{}' and '{}'; reading '{}' unjoined",
                metric, primary, entity, entity
            ),
            Warning::MultiSourceJoinUnresolved {
                context,
                joined,
                unjoined,
            } => write!(
                f,
                "{}: no relationship connects {} to {}; join omitted",
                context,
                unjoined.join(", "),
                joined.join(", ")
            ),
            Warning::TimeFilterUnapplied { phrase } => write!(
                f,
                "time phrase '{}' ignored: no date dimension matched",
                phrase
            ),
            Warning::OrphanedMetricIgnored { metric } => {
                write!(f, "orphaned metric '{}' ignored", metric)
            }
        }
    }
}
