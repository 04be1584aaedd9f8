use serde_json::Value as JsonValue;

use super::{operand, operator, uncoercible, unknown_operator, Operation, ValuePredicate};
use crate::error::QuestionError;
use crate::predicate::Tokens;
use crate::query::{Operator, QualifiedColumn};
use crate::value::{Literal, Value, ValueKind};

#[derive(Debug)]
pub struct BooleanPredicate {
    column: QualifiedColumn,
    operation: Option<Operation>,
}

fn boolean_literal(token: &JsonValue) -> Option<Literal> { token.as_bool().map(Literal::Boolean) }

impl BooleanPredicate {
    pub fn new(column: QualifiedColumn, tokens: Tokens<'_>) -> Result<Self, QuestionError> {
        let mut tokens = tokens;
        let Some(op) = operator(&mut tokens, ValueKind::Boolean, &column)? else {
            return Ok(Self { column, operation: None });
        };
        let operation = match op {
            "equals" => Operation::new(Operator::Equal, vec![operand(&mut tokens, op, "true or false", boolean_literal)?]),
            "not_equals" => Operation::new(Operator::NotEqual, vec![operand(&mut tokens, op, "true or false", boolean_literal)?]),
            "present" => Operation::new(Operator::IsNotNull, Vec::new()),
            "absent" => Operation::new(Operator::IsNull, Vec::new()),
            other => return Err(unknown_operator(other, ValueKind::Boolean)),
        };
        tokens.finish()?;
        Ok(Self { column, operation: Some(operation) })
    }
}

impl ValuePredicate for BooleanPredicate {
    const KIND: ValueKind = ValueKind::Boolean;

    fn column(&self) -> &QualifiedColumn { &self.column }

    fn operation(&self) -> Option<&Operation> { self.operation.as_ref() }

    fn coerce(&self, cell: &Value) -> Result<JsonValue, QuestionError> {
        match cell {
            Value::Integer(i) => Ok(JsonValue::Bool(*i != 0)),
            Value::Text(s) => match s.to_ascii_lowercase().as_str() {
                "true" | "t" | "1" => Ok(JsonValue::Bool(true)),
                "false" | "f" | "0" => Ok(JsonValue::Bool(false)),
                _ => Err(uncoercible(cell, Self::KIND, &self.column)),
            },
            _ => Err(uncoercible(cell, Self::KIND, &self.column)),
        }
    }
}
