use indexmap::IndexSet;
use serde_json::Value as JsonValue;

use super::{chained, first_cell, ColumnPredicate, ModelPredicate, NodeKind, Predicate, TokenShape, Tokens, ALL};
use crate::context::Context;
use crate::error::QuestionError;
use crate::query::{condition_alias, traversal_alias, Filter, Join, Operator, QualifiedColumn};
use crate::schema::Model;
use crate::value::{Literal, Row, ValueKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordSelector {
    All,
    Identity(i64),
}

/// Where the next relationship traversal of a chain leads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Branch {
    /// Along the chain itself; its rows shape the answer
    Chain,
    /// Into a sub-specification, which only decides which records of the owning model remain
    Condition,
}

impl Branch {
    fn alias(self, from: &str, relationship: &str) -> String {
        match self {
            Branch::Chain => traversal_alias(from, relationship),
            Branch::Condition => condition_alias(from, relationship),
        }
    }
}

/// Narrows the record set of a model: to one identity, or by nested sub-specifications whose filters
/// (and the joins those filters need) become part of the query. Relationships crossed inside a
/// sub-specification get aliases of their own, so the condition removes records without trimming
/// the rows a later traversal collects.
#[derive(Debug)]
pub struct RecordPredicate {
    identity: QualifiedColumn,
    selector: RecordSelector,
    conditions: Vec<Box<dyn Predicate>>,
    child: Option<Box<dyn Predicate>>,
}

impl RecordPredicate {
    pub(crate) fn new(ctx: &Context, model: &Model, alias: &str, tokens: Tokens<'_>) -> Result<Self, QuestionError> {
        let mut tokens = tokens;
        let selector = match tokens.shape() {
            Some(TokenShape::Identifier(ALL)) => {
                tokens.advance();
                RecordSelector::All
            }
            Some(TokenShape::Identity(id)) => {
                tokens.advance();
                RecordSelector::Identity(id)
            }
            _ => RecordSelector::All,
        };

        let mut conditions = Vec::new();
        while let Some(TokenShape::SubSpec(spec)) = tokens.shape() {
            tokens.advance();
            match continuation(ctx, model, alias, Branch::Condition, Tokens::new(spec))? {
                Some(condition) => conditions.push(condition),
                None => return Err(QuestionError::missing(format!("condition on {}", model.name()))),
            }
        }

        let child = continuation(ctx, model, alias, Branch::Chain, tokens)?;
        Ok(Self { identity: QualifiedColumn::new(alias, &model.identity), selector, conditions, child })
    }
}

/// Resolve the next identifier on `model` (addressed as `alias`) as a relationship traversal or an
/// attribute. Returns `None` when no tokens remain.
pub(crate) fn continuation(
    ctx: &Context,
    model: &Model,
    alias: &str,
    branch: Branch,
    tokens: Tokens<'_>,
) -> Result<Option<Box<dyn Predicate>>, QuestionError> {
    let mut tokens = tokens;
    let Some(token) = tokens.advance() else {
        return Ok(None);
    };
    match TokenShape::of(token) {
        TokenShape::Identifier(name) => {
            if let Some(relationship) = model.get_relationship(name) {
                let target_alias = branch.alias(alias, name);
                Ok(Some(Box::new(ModelPredicate::traverse(ctx, model, alias, relationship, target_alias, tokens)?)))
            } else if let Some(ty) = model.attribute_type(name) {
                Ok(Some(Box::new(ColumnPredicate::new(ctx, QualifiedColumn::new(alias, name), ty, tokens)?)))
            } else {
                Err(QuestionError::invalid(format!("unknown attribute: {} on {}", name, model.name())))
            }
        }
        TokenShape::Operator(op) => Err(QuestionError::invalid(format!("operator ::{} must follow an attribute of {}", op, model.name()))),
        _ => Err(super::unexpected(token, &format!("an attribute or relationship of {}", model.name()))),
    }
}

impl Predicate for RecordPredicate {
    fn kind(&self) -> NodeKind { NodeKind::Record }

    fn child(&self) -> Option<&dyn Predicate> { self.child.as_deref() }

    fn join(&self) -> IndexSet<Join> {
        let mut joins = IndexSet::new();
        for condition in &self.conditions {
            joins.extend(condition.join());
        }
        chained(joins, self.child.as_ref().map(|c| c.join()))
    }

    fn filter(&self) -> IndexSet<Filter> {
        let mut filters = IndexSet::new();
        if let RecordSelector::Identity(id) = self.selector {
            filters.insert(Filter::new(self.identity.clone(), ValueKind::Number, Operator::Equal, vec![Literal::Integer(id)]));
        }
        for condition in &self.conditions {
            filters.extend(condition.filter());
        }
        chained(filters, self.child.as_ref().map(|c| c.filter()))
    }

    fn select(&self) -> IndexSet<QualifiedColumn> {
        match &self.child {
            Some(child) => child.select(),
            None => IndexSet::from([self.identity.clone()]),
        }
    }

    /// A bare record set answers with its identities
    fn extract(&self, rows: &[&Row]) -> Result<JsonValue, QuestionError> {
        match &self.child {
            Some(child) => child.extract(rows),
            None => Ok(first_cell(rows, &self.identity)?.to_json()),
        }
    }
}
