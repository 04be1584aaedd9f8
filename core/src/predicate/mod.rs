//! The predicate chain.
//!
//! A chain is built from a token list by successive nodes, each consuming a prefix of the tokens and
//! constructing the next node from the remainder:
//!
//! ```text
//! ["labor", 3, "monster", ["name", "::starts_with", "Hy"], "strength", "::gt", 5]
//!  Model   Record  Model   Record (sub-spec)             Column      Number terminal
//! ```
//!
//! Joins, filters, selects and ordering columns are collected by walking the chain; every node
//! contributes its own part and delegates the rest to its child.

mod column;
mod model;
mod record;
pub mod terminal;

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde_json::Value as JsonValue;

use crate::error::QuestionError;
use crate::query::{Filter, Join, QualifiedColumn};
use crate::value::{IdentityKey, Row, Value, ValueKind};

pub use column::ColumnPredicate;
pub use model::ModelPredicate;
pub use record::RecordPredicate;
pub use terminal::Terminal;

/// Keyword selecting every record of a model
pub const ALL: &str = "all";

/// Prefix marking a token as an operator symbol (`"::gt"`)
pub const OPERATOR_PREFIX: &str = "::";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Model,
    Record,
    Column,
    Terminal(ValueKind),
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Model => f.write_str("model"),
            NodeKind::Record => f.write_str("record"),
            NodeKind::Column => f.write_str("column"),
            NodeKind::Terminal(kind) => write!(f, "terminal({})", kind),
        }
    }
}

/// One element of a chain
pub trait Predicate: fmt::Debug + Send + Sync {
    fn kind(&self) -> NodeKind;

    fn child(&self) -> Option<&dyn Predicate>;

    fn join(&self) -> IndexSet<Join> { self.child().map(|c| c.join()).unwrap_or_default() }

    fn filter(&self) -> IndexSet<Filter> { self.child().map(|c| c.filter()).unwrap_or_default() }

    fn select(&self) -> IndexSet<QualifiedColumn> { self.child().map(|c| c.select()).unwrap_or_default() }

    /// Ascending ordering columns, outermost first
    fn order(&self) -> IndexSet<QualifiedColumn> { self.child().map(|c| c.order()).unwrap_or_default() }

    /// Value kind of the terminal this chain reduces to
    fn reduced_type(&self) -> ValueKind { self.child().map(|c| c.reduced_type()).unwrap_or(ValueKind::None) }

    /// Build the answer for this node out of the rows belonging to it
    fn extract(&self, rows: &[&Row]) -> Result<JsonValue, QuestionError> {
        match self.child() {
            Some(child) => child.extract(rows),
            None => Ok(JsonValue::Null),
        }
    }
}

/// Own contribution first, then the child's, deduplicated in discovery order
pub(crate) fn chained<T: std::hash::Hash + Eq>(own: impl IntoIterator<Item = T>, child: Option<IndexSet<T>>) -> IndexSet<T> {
    let mut set: IndexSet<T> = own.into_iter().collect();
    if let Some(child) = child {
        set.extend(child);
    }
    set
}

/// How a token drives the next transition of the chain
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenShape<'a> {
    /// Model, relationship or attribute name (or the `all` keyword)
    Identifier(&'a str),
    /// Identity literal narrowing to one record
    Identity(i64),
    /// Nested token list filtering the current record set
    SubSpec(&'a [JsonValue]),
    /// `::name`, stripped of its prefix
    Operator(&'a str),
    Other(&'a JsonValue),
}

impl<'a> TokenShape<'a> {
    pub fn of(token: &'a JsonValue) -> Self {
        match token {
            JsonValue::String(s) => match s.strip_prefix(OPERATOR_PREFIX) {
                Some(op) => TokenShape::Operator(op),
                None => TokenShape::Identifier(s),
            },
            JsonValue::Number(n) => match n.as_i64() {
                Some(id) => TokenShape::Identity(id),
                None => TokenShape::Other(token),
            },
            JsonValue::Array(items) => TokenShape::SubSpec(items),
            _ => TokenShape::Other(token),
        }
    }
}

/// Cursor over the tokens a node has not consumed yet
#[derive(Debug, Clone, Copy)]
pub struct Tokens<'a> {
    remaining: &'a [JsonValue],
}

impl<'a> Tokens<'a> {
    pub fn new(tokens: &'a [JsonValue]) -> Self { Self { remaining: tokens } }

    pub fn is_empty(&self) -> bool { self.remaining.is_empty() }

    pub fn remaining(&self) -> &'a [JsonValue] { self.remaining }

    pub fn peek(&self) -> Option<&'a JsonValue> { self.remaining.first() }

    pub fn shape(&self) -> Option<TokenShape<'a>> { self.peek().map(TokenShape::of) }

    pub fn advance(&mut self) -> Option<&'a JsonValue> {
        let (first, rest) = self.remaining.split_first()?;
        self.remaining = rest;
        Some(first)
    }

    /// Consume a token that must be present and non-null
    pub fn require(&mut self, what: &str) -> Result<&'a JsonValue, QuestionError> {
        match self.advance() {
            None | Some(JsonValue::Null) => Err(QuestionError::missing(what)),
            Some(token) => Ok(token),
        }
    }

    /// Succeeds only if every token has been consumed
    pub fn finish(self) -> Result<(), QuestionError> {
        if self.remaining.is_empty() {
            Ok(())
        } else {
            Err(QuestionError::TrailingArguments(self.remaining.to_vec()))
        }
    }
}

/// "argument invalid" for a token outside the expected domain
pub(crate) fn unexpected(token: &JsonValue, expected: &str) -> QuestionError {
    QuestionError::invalid(format!("expected {}, got {}", expected, token))
}

static NULL: Value = Value::Null;

/// Cell of `column` in the first row; rows of one partition all describe the same record
pub(crate) fn first_cell<'r>(rows: &[&'r Row], column: &QualifiedColumn) -> Result<&'r Value, QuestionError> {
    match rows.first().copied() {
        None => Ok(&NULL),
        Some(row) => row.get(&column.key()).ok_or_else(|| QuestionError::Extraction(format!("column {} missing from result row", column))),
    }
}

/// Group rows by the identity in `column`, keeping first-seen order. Rows whose identity is `NULL`
/// belong to no record (an outer join found nothing) and are dropped.
pub(crate) fn partition<'r>(rows: &[&'r Row], column: &QualifiedColumn) -> Result<IndexMap<IdentityKey, Vec<&'r Row>>, QuestionError> {
    let key = column.key();
    let mut groups: IndexMap<IdentityKey, Vec<&'r Row>> = IndexMap::new();
    for &row in rows {
        let cell = row.get(&key).ok_or_else(|| QuestionError::Extraction(format!("column {} missing from result row", column)))?;
        if let Some(identity) = cell.identity_key() {
            groups.entry(identity).or_default().push(row);
        }
    }
    Ok(groups)
}
