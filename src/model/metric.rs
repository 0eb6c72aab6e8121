// src/model/metric.rs
use serde::{Deserialize, Serialize};

/// Aggregation applied by a measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Aggregation {
    Sum,
    Avg,
    Min,
    Max,
    Count,
    CountDistinct,
}

impl std::fmt::Display for Aggregation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Aggregation::Sum => "SUM",
            Aggregation::Avg => "AVG",
            Aggregation::Min => "MIN",
            Aggregation::Max => "MAX",
            Aggregation::Count => "COUNT",
            Aggregation::CountDistinct => "COUNT_DISTINCT",
        };
        write!(f, "{}", s)
    }
}

/// Display hint for metric values. Has no effect on compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricFormat {
    #[default]
    Number,
    Currency,
    Percentage,
    Date,
    Text,
}

/// What a metric computes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetricKind {
    /// Aggregate over an entity field.
    Measure {
        entity: String,
        field: String,
        aggregation: Aggregation,
    },
    /// A grouping/slicing column.
    Dimension { entity: String, field: String },
    /// A formula over other metrics, referenced as `[Name]`.
    Calculated { expression: String },
}

/// A named, reusable business metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    /// Filled from the map key when loaded from a document.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub format: MetricFormat,
    /// Set when the bound entity or field no longer exists.
    #[serde(default)]
    pub orphaned: bool,
    #[serde(flatten)]
    pub kind: MetricKind,
}

impl Metric {
    pub fn measure(name: &str, entity: &str, field: &str, aggregation: Aggregation) -> Self {
        Self::with_kind(
            name,
            MetricKind::Measure {
                entity: entity.into(),
                field: field.into(),
                aggregation,
            },
        )
    }

    pub fn dimension(name: &str, entity: &str, field: &str) -> Self {
        Self::with_kind(
            name,
            MetricKind::Dimension {
                entity: entity.into(),
                field: field.into(),
            },
        )
    }

    pub fn calculated(name: &str, expression: &str) -> Self {
        Self::with_kind(
            name,
            MetricKind::Calculated {
                expression: expression.into(),
            },
        )
    }

    fn with_kind(name: &str, kind: MetricKind) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            format: MetricFormat::default(),
            orphaned: false,
            kind,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: MetricFormat) -> Self {
        self.format = format;
        self
    }

    /// The `(entity, field)` binding of a measure or dimension.
    pub fn binding(&self) -> Option<(&str, &str)> {
        match &self.kind {
            MetricKind::Measure { entity, field, .. } | MetricKind::Dimension { entity, field } => {
                Some((entity, field))
            }
            MetricKind::Calculated { .. } => None,
        }
    }

    pub fn is_dimension(&self) -> bool {
        matches!(self.kind, MetricKind::Dimension { .. })
    }

    pub fn is_calculated(&self) -> bool {
        matches!(self.kind, MetricKind::Calculated { .. })
    }
}
