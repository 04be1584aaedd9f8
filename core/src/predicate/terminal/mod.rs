//! Terminal predicates: the leaves of a chain.
//!
//! Each terminal resolves an optional operator (with its operands) against one attribute column. It
//! always projects the column, contributes a filter when an operator is present, and coerces the raw
//! cell into the JSON shape of its value kind when the answer is extracted.

mod boolean;
mod datetime;
mod file;
mod number;
mod string;

use indexmap::IndexSet;
use serde_json::Value as JsonValue;

use super::{first_cell, NodeKind, Predicate, TokenShape, Tokens};
use crate::context::Context;
use crate::error::QuestionError;
use crate::query::{Filter, Operator, QualifiedColumn};
use crate::schema::AttributeType;
use crate::value::{Literal, Row, Value, ValueKind};

pub use boolean::BooleanPredicate;
pub use datetime::DateTimePredicate;
pub use file::FilePredicate;
pub use number::NumberPredicate;
pub use string::StringPredicate;

#[derive(Debug)]
pub enum Terminal {
    Boolean(BooleanPredicate),
    DateTime(DateTimePredicate),
    File(FilePredicate),
    Number(NumberPredicate),
    String(StringPredicate),
}

impl Terminal {
    pub fn as_predicate(&self) -> &dyn Predicate {
        match self {
            Terminal::Boolean(p) => p,
            Terminal::DateTime(p) => p,
            Terminal::File(p) => p,
            Terminal::Number(p) => p,
            Terminal::String(p) => p,
        }
    }
}

pub type TerminalConstructor = fn(&Context, QualifiedColumn, Tokens<'_>) -> Result<Terminal, QuestionError>;

fn build_boolean(_: &Context, column: QualifiedColumn, tokens: Tokens<'_>) -> Result<Terminal, QuestionError> {
    BooleanPredicate::new(column, tokens).map(Terminal::Boolean)
}

fn build_datetime(_: &Context, column: QualifiedColumn, tokens: Tokens<'_>) -> Result<Terminal, QuestionError> {
    DateTimePredicate::new(column, tokens).map(Terminal::DateTime)
}

fn build_file(ctx: &Context, column: QualifiedColumn, tokens: Tokens<'_>) -> Result<Terminal, QuestionError> {
    FilePredicate::new(ctx.files().clone(), column, tokens).map(Terminal::File)
}

fn build_number(_: &Context, column: QualifiedColumn, tokens: Tokens<'_>) -> Result<Terminal, QuestionError> {
    NumberPredicate::new(column, tokens).map(Terminal::Number)
}

fn build_string(_: &Context, column: QualifiedColumn, tokens: Tokens<'_>) -> Result<Terminal, QuestionError> {
    StringPredicate::new(column, tokens).map(Terminal::String)
}

/// Semantic attribute type → terminal constructor. Every type the schema can declare has an entry.
pub const TERMINALS: &[(AttributeType, TerminalConstructor)] = &[
    (AttributeType::String, build_string),
    (AttributeType::Text, build_string),
    (AttributeType::Integer, build_number),
    (AttributeType::Float, build_number),
    (AttributeType::Number, build_number),
    (AttributeType::Boolean, build_boolean),
    (AttributeType::DateTime, build_datetime),
    (AttributeType::Date, build_datetime),
    (AttributeType::File, build_file),
    (AttributeType::Blob, build_file),
];

pub fn constructor(ty: AttributeType) -> Result<TerminalConstructor, QuestionError> {
    TERMINALS
        .iter()
        .find(|(declared, _)| *declared == ty)
        .map(|(_, construct)| *construct)
        .ok_or_else(|| QuestionError::invalid(format!("no terminal predicate for attribute type {:?}", ty)))
}

/// A resolved operator with its operands
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub operator: Operator,
    pub operands: Vec<Literal>,
}

impl Operation {
    pub fn new(operator: Operator, operands: Vec<Literal>) -> Self { Self { operator, operands } }
}

/// Behaviour shared by every terminal kind; [`Predicate`] is implemented on top of it
pub trait ValuePredicate: std::fmt::Debug + Send + Sync {
    const KIND: ValueKind;

    fn column(&self) -> &QualifiedColumn;

    fn operation(&self) -> Option<&Operation>;

    /// Coerce a non-null cell
    fn coerce(&self, cell: &Value) -> Result<JsonValue, QuestionError>;
}

impl<T: ValuePredicate> Predicate for T {
    fn kind(&self) -> NodeKind { NodeKind::Terminal(T::KIND) }

    fn child(&self) -> Option<&dyn Predicate> { None }

    fn filter(&self) -> IndexSet<Filter> {
        self.operation().map(|op| Filter::new(self.column().clone(), T::KIND, op.operator, op.operands.clone())).into_iter().collect()
    }

    fn select(&self) -> IndexSet<QualifiedColumn> { IndexSet::from([self.column().clone()]) }

    fn reduced_type(&self) -> ValueKind { T::KIND }

    fn extract(&self, rows: &[&Row]) -> Result<JsonValue, QuestionError> {
        let cell = first_cell(rows, self.column())?;
        if cell.is_null() {
            return Ok(JsonValue::Null);
        }
        self.coerce(cell)
    }
}

/// Consume the operator token, if any. Anything other than an operator symbol is invalid here.
pub(crate) fn operator<'a>(tokens: &mut Tokens<'a>, kind: ValueKind, column: &QualifiedColumn) -> Result<Option<&'a str>, QuestionError> {
    let Some(token) = tokens.peek() else {
        return Ok(None);
    };
    match TokenShape::of(token) {
        TokenShape::Operator(op) => {
            tokens.advance();
            Ok(Some(op))
        }
        _ => Err(super::unexpected(token, &format!("an operator for {} attribute {}", kind, column))),
    }
}

pub(crate) fn unknown_operator(op: &str, kind: ValueKind) -> QuestionError {
    QuestionError::invalid(format!("unknown operator ::{} for {} attribute", op, kind))
}

/// Consume one operand and convert it with `parse`
pub(crate) fn operand<T>(tokens: &mut Tokens<'_>, op: &str, expected: &str, parse: impl Fn(&JsonValue) -> Option<T>) -> Result<T, QuestionError> {
    let token = tokens.require(&format!("operand of ::{}", op))?;
    parse(token).ok_or_else(|| super::unexpected(token, expected))
}

/// Consume a non-empty array operand and convert every element with `parse`
pub(crate) fn operand_list<T>(
    tokens: &mut Tokens<'_>,
    op: &str,
    expected: &str,
    parse: impl Fn(&JsonValue) -> Option<T>,
) -> Result<Vec<T>, QuestionError> {
    let token = tokens.require(&format!("operand of ::{}", op))?;
    let items = match token {
        JsonValue::Array(items) if !items.is_empty() => items,
        _ => return Err(super::unexpected(token, &format!("a non-empty list of {}", expected))),
    };
    items.iter().map(|item| parse(item).ok_or_else(|| super::unexpected(item, expected))).collect()
}

/// Error for a cell whose storage type cannot represent the attribute's kind
pub(crate) fn uncoercible(cell: &Value, kind: ValueKind, column: &QualifiedColumn) -> QuestionError {
    QuestionError::Extraction(format!("cannot read {} cell of {} as {}", cell.type_name(), column, kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_attribute_type_has_a_terminal() {
        for ty in AttributeType::ALL {
            assert!(constructor(ty).is_ok(), "missing terminal for {:?}", ty);
        }
        assert_eq!(TERMINALS.len(), AttributeType::ALL.len());
    }
}
