use serde_json::Value as JsonValue;

use super::{operand, operand_list, operator, uncoercible, unknown_operator, Operation, ValuePredicate};
use crate::error::QuestionError;
use crate::predicate::Tokens;
use crate::query::{Operator, QualifiedColumn};
use crate::value::{Literal, Value, ValueKind};

/// String and text attributes
#[derive(Debug)]
pub struct StringPredicate {
    column: QualifiedColumn,
    operation: Option<Operation>,
}

const EXPECTED: &str = "a string";

fn text(token: &JsonValue) -> Option<String> { token.as_str().map(str::to_string) }

fn text_literal(token: &JsonValue) -> Option<Literal> { text(token).map(Literal::Text) }

/// Escape LIKE wildcards so the operand matches literally (the escape character is `\`)
pub fn escape_like(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl StringPredicate {
    pub fn new(column: QualifiedColumn, tokens: Tokens<'_>) -> Result<Self, QuestionError> {
        let mut tokens = tokens;
        let Some(op) = operator(&mut tokens, ValueKind::String, &column)? else {
            return Ok(Self { column, operation: None });
        };
        let operation = match op {
            "equals" => Operation::new(Operator::Equal, vec![operand(&mut tokens, op, EXPECTED, text_literal)?]),
            "not_equals" => Operation::new(Operator::NotEqual, vec![operand(&mut tokens, op, EXPECTED, text_literal)?]),
            "in" => Operation::new(Operator::In, operand_list(&mut tokens, op, "strings", text_literal)?),
            // raw pattern, wildcards included
            "matches" => Operation::new(Operator::Like, vec![operand(&mut tokens, op, EXPECTED, text_literal)?]),
            "contains" => {
                let needle = operand(&mut tokens, op, EXPECTED, text)?;
                Operation::new(Operator::Like, vec![Literal::Text(format!("%{}%", escape_like(&needle)))])
            }
            "starts_with" => {
                let prefix = operand(&mut tokens, op, EXPECTED, text)?;
                Operation::new(Operator::Like, vec![Literal::Text(format!("{}%", escape_like(&prefix)))])
            }
            "ends_with" => {
                let suffix = operand(&mut tokens, op, EXPECTED, text)?;
                Operation::new(Operator::Like, vec![Literal::Text(format!("%{}", escape_like(&suffix)))])
            }
            "present" => Operation::new(Operator::IsNotNull, Vec::new()),
            "absent" => Operation::new(Operator::IsNull, Vec::new()),
            other => return Err(unknown_operator(other, ValueKind::String)),
        };
        tokens.finish()?;
        Ok(Self { column, operation: Some(operation) })
    }
}

impl ValuePredicate for StringPredicate {
    const KIND: ValueKind = ValueKind::String;

    fn column(&self) -> &QualifiedColumn { &self.column }

    fn operation(&self) -> Option<&Operation> { self.operation.as_ref() }

    fn coerce(&self, cell: &Value) -> Result<JsonValue, QuestionError> {
        match cell {
            Value::Text(s) => Ok(JsonValue::String(s.clone())),
            Value::Integer(i) => Ok(JsonValue::String(i.to_string())),
            Value::Real(f) => Ok(JsonValue::String(f.to_string())),
            Value::Blob(bytes) => match std::str::from_utf8(bytes) {
                Ok(s) => Ok(JsonValue::String(s.to_string())),
                Err(_) => Err(uncoercible(cell, Self::KIND, &self.column)),
            },
            Value::Null => Ok(JsonValue::Null),
        }
    }
}
