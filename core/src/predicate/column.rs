use super::terminal::{self, Terminal};
use super::{NodeKind, Predicate, Tokens};
use crate::context::Context;
use crate::error::QuestionError;
use crate::query::QualifiedColumn;
use crate::schema::AttributeType;

/// Selects an attribute and hands the remaining tokens to the terminal for its declared type
#[derive(Debug)]
pub struct ColumnPredicate {
    terminal: Terminal,
}

impl ColumnPredicate {
    /// The attribute name has been consumed; `column` addresses it through its table's alias
    pub(crate) fn new(ctx: &Context, column: QualifiedColumn, ty: AttributeType, tokens: Tokens<'_>) -> Result<Self, QuestionError> {
        let construct = terminal::constructor(ty)?;
        Ok(Self { terminal: construct(ctx, column, tokens)? })
    }
}

impl Predicate for ColumnPredicate {
    fn kind(&self) -> NodeKind { NodeKind::Column }

    fn child(&self) -> Option<&dyn Predicate> { Some(self.terminal.as_predicate()) }
}
