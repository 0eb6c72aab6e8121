// src/model/relationship.rs
use serde::{Deserialize, Serialize};

/// Cardinality of a relationship, read from the `from` side.
///
/// Legacy documents spell these `One-to-Many` etc.; both forms load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    #[serde(alias = "One-to-One")]
    OneToOne,
    #[serde(alias = "One-to-Many")]
    OneToMany,
    #[serde(alias = "Many-to-One")]
    ManyToOne,
    #[serde(alias = "Many-to-Many")]
    ManyToMany,
}

impl Cardinality {
    /// Reverse the cardinality (swap from/to sides).
    pub fn reverse(self) -> Self {
        match self {
            Cardinality::OneToMany => Cardinality::ManyToOne,
            Cardinality::ManyToOne => Cardinality::OneToMany,
            Cardinality::OneToOne => Cardinality::OneToOne,
            Cardinality::ManyToMany => Cardinality::ManyToMany,
        }
    }
}

impl std::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Cardinality::OneToOne => "one-to-one",
            Cardinality::OneToMany => "one-to-many",
            Cardinality::ManyToOne => "many-to-one",
            Cardinality::ManyToMany => "many-to-many",
        };
        write!(f, "{}", s)
    }
}

/// A typed link between two entity fields. Traversed in both directions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub from_entity: String,
    pub to_entity: String,
    pub from_field: String,
    pub to_field: String,
    #[serde(alias = "type")]
    pub cardinality: Cardinality,
    #[serde(default)]
    pub description: String,
}

/// A relationship seen from one of its endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Oriented<'a> {
    /// Position in the model's relationship list.
    pub index: usize,
    pub near_field: &'a str,
    pub far_entity: &'a str,
    pub far_field: &'a str,
    /// Cardinality read from the near side.
    pub cardinality: Cardinality,
}

impl Relationship {
    pub fn new(
        from_entity: &str,
        to_entity: &str,
        from_field: &str,
        to_field: &str,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            from_entity: from_entity.into(),
            to_entity: to_entity.into(),
            from_field: from_field.into(),
            to_field: to_field.into(),
            cardinality,
            description: format!("Relates {} to {}", from_entity, to_entity),
        }
    }

    pub fn is_self_referencing(&self) -> bool {
        self.from_entity == self.to_entity
    }

    pub fn touches(&self, entity: &str) -> bool {
        self.from_entity == entity || self.to_entity == entity
    }

    /// Same four endpoints, regardless of cardinality or description.
    pub fn same_endpoints(&self, other: &Relationship) -> bool {
        self.from_entity == other.from_entity
            && self.to_entity == other.to_entity
            && self.from_field == other.from_field
            && self.to_field == other.to_field
    }

    /// View this relationship from `entity`, if it is one of the endpoints.
    ///
    /// For self-references the `from` side is the near side.
    pub fn oriented_from(&self, index: usize, entity: &str) -> Option<Oriented<'_>> {
        if self.from_entity == entity {
            Some(Oriented {
                index,
                near_field: &self.from_field,
                far_entity: &self.to_entity,
                far_field: &self.to_field,
                cardinality: self.cardinality,
            })
        } else if self.to_entity == entity {
            Some(Oriented {
                index,
                near_field: &self.to_field,
                far_entity: &self.from_entity,
                far_field: &self.from_field,
                cardinality: self.cardinality.reverse(),
            })
        } else {
            None
        }
    }
}
