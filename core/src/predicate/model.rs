use indexmap::IndexSet;
use serde_json::Value as JsonValue;

use super::{chained, partition, NodeKind, Predicate, RecordPredicate, TokenShape, Tokens};
use crate::context::Context;
use crate::error::QuestionError;
use crate::query::{through_alias, Filter, Join, QualifiedColumn};
use crate::schema::{Cardinality, Model, Relationship, RelationshipKind};
use crate::value::{Row, ValueKind};

/// Selects a model: the root of every chain, and each relationship traversal after it.
///
/// The rows of a model node are partitioned by its identity; with `Cardinality::Many` the answer is
/// the list of per-record answers, with `Cardinality::One` it is the single record's answer (or null).
/// Each traversal addresses its table through its own alias, so returning to a table already in the
/// query (a self-relationship, or back along the way the chain came) joins a fresh copy of it.
#[derive(Debug)]
pub struct ModelPredicate {
    model: String,
    table: String,
    alias: String,
    identity: QualifiedColumn,
    /// Joins that bring this model into the query; empty at the root
    joins: Vec<Join>,
    cardinality: Cardinality,
    child: RecordPredicate,
}

impl ModelPredicate {
    /// Build a chain from the full token list; the first token names the root model
    pub fn root(ctx: &Context, tokens: Tokens<'_>) -> Result<Self, QuestionError> {
        let mut tokens = tokens;
        let token = tokens.require("model name")?;
        let name = match TokenShape::of(token) {
            TokenShape::Identifier(name) => name,
            _ => return Err(super::unexpected(token, "a model name")),
        };
        let model = ctx.schema().get(name).ok_or_else(|| QuestionError::invalid(format!("unknown model: {}", name)))?;
        Self::build(ctx, model, model.table.clone(), Vec::new(), Cardinality::Many, tokens)
    }

    /// Follow `relationship` out of `owner` (addressed as `owner_alias`) into a table aliased `alias`;
    /// the relationship name has already been consumed
    pub(crate) fn traverse(
        ctx: &Context,
        owner: &Model,
        owner_alias: &str,
        relationship: &Relationship,
        alias: String,
        tokens: Tokens<'_>,
    ) -> Result<Self, QuestionError> {
        let target = ctx
            .schema()
            .get(&relationship.target)
            .ok_or_else(|| QuestionError::invalid(format!("unknown model: {}", relationship.target)))?;
        let joins = relationship_joins(owner, owner_alias, relationship, target, &alias);
        Self::build(ctx, target, alias, joins, relationship.cardinality(), tokens)
    }

    fn build(ctx: &Context, model: &Model, alias: String, joins: Vec<Join>, cardinality: Cardinality, tokens: Tokens<'_>) -> Result<Self, QuestionError> {
        let child = RecordPredicate::new(ctx, model, &alias, tokens)?;
        Ok(Self {
            model: model.name().to_string(),
            table: model.table.clone(),
            identity: QualifiedColumn::new(&alias, &model.identity),
            alias,
            joins,
            cardinality,
            child,
        })
    }

    pub fn model(&self) -> &str { &self.model }

    pub fn table(&self) -> &str { &self.table }

    pub fn alias(&self) -> &str { &self.alias }

    pub fn identity(&self) -> &QualifiedColumn { &self.identity }

    pub fn cardinality(&self) -> Cardinality { self.cardinality }
}

/// Joins realizing a relationship, in the order they must be applied
fn relationship_joins(owner: &Model, owner_alias: &str, relationship: &Relationship, target: &Model, alias: &str) -> Vec<Join> {
    match &relationship.kind {
        RelationshipKind::Parent { foreign_key } => vec![Join::new(
            &target.table,
            QualifiedColumn::new(owner_alias, foreign_key),
            QualifiedColumn::new(alias, &target.identity),
        )],
        RelationshipKind::Child { foreign_key } => vec![Join::new(
            &target.table,
            QualifiedColumn::new(owner_alias, &owner.identity),
            QualifiedColumn::new(alias, foreign_key),
        )],
        RelationshipKind::Link { through, source_key, target_key } => {
            let link = through_alias(alias, through);
            vec![
                Join::new(through, QualifiedColumn::new(owner_alias, &owner.identity), QualifiedColumn::new(&link, source_key)),
                Join::new(&target.table, QualifiedColumn::new(&link, target_key), QualifiedColumn::new(alias, &target.identity)),
            ]
        }
    }
}

impl Predicate for ModelPredicate {
    fn kind(&self) -> NodeKind { NodeKind::Model }

    fn child(&self) -> Option<&dyn Predicate> { Some(&self.child) }

    fn join(&self) -> IndexSet<Join> { chained(self.joins.iter().cloned(), Some(self.child.join())) }

    fn filter(&self) -> IndexSet<Filter> { self.child.filter() }

    /// The identity is always projected so rows can be partitioned by record
    fn select(&self) -> IndexSet<QualifiedColumn> { chained([self.identity.clone()], Some(self.child.select())) }

    fn order(&self) -> IndexSet<QualifiedColumn> { chained([self.identity.clone()], Some(self.child.order())) }

    fn reduced_type(&self) -> ValueKind { self.child.reduced_type() }

    fn extract(&self, rows: &[&Row]) -> Result<JsonValue, QuestionError> {
        let groups = partition(rows, &self.identity)?;
        match self.cardinality {
            Cardinality::Many => {
                let mut answers = Vec::with_capacity(groups.len());
                for records in groups.values() {
                    answers.push(self.child.extract(records)?);
                }
                Ok(JsonValue::Array(answers))
            }
            Cardinality::One => match groups.values().next() {
                Some(records) => self.child.extract(records),
                None => Ok(JsonValue::Null),
            },
        }
    }
}
