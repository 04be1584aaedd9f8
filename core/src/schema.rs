//! The schema contract consumed by the compiler.
//!
//! Model definitions live outside this crate; they are handed to the compiler as a read-only [`Schema`],
//! either built in code or loaded from a JSON document:
//!
//! ```json
//! {
//!   "models": {
//!     "labor":   { "table": "labor", "identity": "id",
//!                  "attributes": { "name": "string", "number": "integer" },
//!                  "relationships": { "monster": { "target": "monster", "kind": "child", "foreign_key": "labor_id" } } },
//!     "monster": { "table": "monster", "attributes": { "name": "string" } }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Declared semantic type of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    String,
    Text,
    Integer,
    Float,
    Number,
    Boolean,
    DateTime,
    Date,
    File,
    Blob,
}

impl AttributeType {
    pub const ALL: [AttributeType; 10] = [
        AttributeType::String,
        AttributeType::Text,
        AttributeType::Integer,
        AttributeType::Float,
        AttributeType::Number,
        AttributeType::Boolean,
        AttributeType::DateTime,
        AttributeType::Date,
        AttributeType::File,
        AttributeType::Blob,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    One,
    Many,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RelationshipKind {
    /// `owner.foreign_key` references the target identity
    Parent { foreign_key: String },
    /// `target.foreign_key` references the owner identity
    Child { foreign_key: String },
    /// Rows of `through` pair `source_key` (owner identity) with `target_key` (target identity)
    Link { through: String, source_key: String, target_key: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Name of the target model
    pub target: String,
    #[serde(flatten)]
    pub kind: RelationshipKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cardinality: Option<Cardinality>,
}

impl Relationship {
    pub fn new(target: impl Into<String>, kind: RelationshipKind) -> Self { Self { target: target.into(), kind, cardinality: None } }

    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = Some(cardinality);
        self
    }

    /// Declared cardinality, or the one implied by the relationship kind
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality.unwrap_or(match self.kind {
            RelationshipKind::Parent { .. } => Cardinality::One,
            RelationshipKind::Child { .. } | RelationshipKind::Link { .. } => Cardinality::Many,
        })
    }
}

fn default_identity() -> String { "id".to_string() }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    #[serde(skip)]
    name: String,
    pub table: String,
    #[serde(default = "default_identity")]
    pub identity: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeType>,
    #[serde(default)]
    pub relationships: BTreeMap<String, Relationship>,
}

impl Model {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self { name: name.into(), table: table.into(), identity: default_identity(), attributes: BTreeMap::new(), relationships: BTreeMap::new() }
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn identity(mut self, column: impl Into<String>) -> Self {
        self.identity = column.into();
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, ty: AttributeType) -> Self {
        self.attributes.insert(name.into(), ty);
        self
    }

    pub fn relationship(mut self, name: impl Into<String>, relationship: Relationship) -> Self {
        self.relationships.insert(name.into(), relationship);
        self
    }

    pub fn parent(self, name: impl Into<String>, target: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        self.relationship(name, Relationship::new(target, RelationshipKind::Parent { foreign_key: foreign_key.into() }))
    }

    pub fn child(self, name: impl Into<String>, target: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        self.relationship(name, Relationship::new(target, RelationshipKind::Child { foreign_key: foreign_key.into() }))
    }

    pub fn link(
        self,
        name: impl Into<String>,
        target: impl Into<String>,
        through: impl Into<String>,
        source_key: impl Into<String>,
        target_key: impl Into<String>,
    ) -> Self {
        let kind = RelationshipKind::Link { through: through.into(), source_key: source_key.into(), target_key: target_key.into() };
        self.relationship(name, Relationship::new(target, kind))
    }

    pub fn attribute_type(&self, name: &str) -> Option<AttributeType> { self.attributes.get(name).copied() }

    pub fn get_relationship(&self, name: &str) -> Option<&Relationship> { self.relationships.get(name) }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    models: BTreeMap<String, Model>,
}

impl Schema {
    pub fn new() -> Self { Self::default() }

    pub fn model(mut self, model: Model) -> Self {
        self.models.insert(model.name.clone(), model);
        self
    }

    /// Parse and validate a JSON schema document
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let mut schema: Schema = serde_json::from_str(json)?;
        for (name, model) in schema.models.iter_mut() {
            model.name = name.clone();
        }
        schema.validate()?;
        Ok(schema)
    }

    pub fn get(&self, name: &str) -> Option<&Model> { self.models.get(name) }

    pub fn validate(&self) -> Result<(), SchemaError> {
        for (name, model) in &self.models {
            if model.table.is_empty() || model.identity.is_empty() {
                return Err(SchemaError::Incomplete(name.clone()));
            }
            for (relationship, definition) in &model.relationships {
                if !self.models.contains_key(&definition.target) {
                    return Err(SchemaError::UnknownTarget {
                        model: name.clone(),
                        relationship: relationship.clone(),
                        target: definition.target.clone(),
                    });
                }
                if model.attributes.contains_key(relationship) {
                    return Err(SchemaError::AmbiguousName { model: name.clone(), name: relationship.clone() });
                }
            }
        }
        Ok(())
    }
}
