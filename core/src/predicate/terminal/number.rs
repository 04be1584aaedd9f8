use serde_json::Value as JsonValue;

use super::{operand, operand_list, operator, uncoercible, unknown_operator, Operation, ValuePredicate};
use crate::error::QuestionError;
use crate::predicate::Tokens;
use crate::query::{Operator, QualifiedColumn};
use crate::value::{Literal, Value, ValueKind};

/// Integer, float and number attributes
#[derive(Debug)]
pub struct NumberPredicate {
    column: QualifiedColumn,
    operation: Option<Operation>,
}

const EXPECTED: &str = "a number";

fn number_literal(token: &JsonValue) -> Option<Literal> {
    let JsonValue::Number(number) = token else {
        return None;
    };
    match number.as_i64() {
        Some(i) => Some(Literal::Integer(i)),
        None => number.as_f64().map(Literal::Float),
    }
}

impl NumberPredicate {
    pub fn new(column: QualifiedColumn, tokens: Tokens<'_>) -> Result<Self, QuestionError> {
        let mut tokens = tokens;
        let Some(op) = operator(&mut tokens, ValueKind::Number, &column)? else {
            return Ok(Self { column, operation: None });
        };
        let operation = match op {
            "equals" => Operation::new(Operator::Equal, vec![operand(&mut tokens, op, EXPECTED, number_literal)?]),
            "not_equals" => Operation::new(Operator::NotEqual, vec![operand(&mut tokens, op, EXPECTED, number_literal)?]),
            "gt" => Operation::new(Operator::GreaterThan, vec![operand(&mut tokens, op, EXPECTED, number_literal)?]),
            "gte" => Operation::new(Operator::GreaterThanOrEqual, vec![operand(&mut tokens, op, EXPECTED, number_literal)?]),
            "lt" => Operation::new(Operator::LessThan, vec![operand(&mut tokens, op, EXPECTED, number_literal)?]),
            "lte" => Operation::new(Operator::LessThanOrEqual, vec![operand(&mut tokens, op, EXPECTED, number_literal)?]),
            "between" => {
                let low = operand(&mut tokens, op, EXPECTED, number_literal)?;
                let high = operand(&mut tokens, op, EXPECTED, number_literal)?;
                Operation::new(Operator::Between, vec![low, high])
            }
            "in" => Operation::new(Operator::In, operand_list(&mut tokens, op, "numbers", number_literal)?),
            "present" => Operation::new(Operator::IsNotNull, Vec::new()),
            "absent" => Operation::new(Operator::IsNull, Vec::new()),
            other => return Err(unknown_operator(other, ValueKind::Number)),
        };
        tokens.finish()?;
        Ok(Self { column, operation: Some(operation) })
    }
}

impl ValuePredicate for NumberPredicate {
    const KIND: ValueKind = ValueKind::Number;

    fn column(&self) -> &QualifiedColumn { &self.column }

    fn operation(&self) -> Option<&Operation> { self.operation.as_ref() }

    fn coerce(&self, cell: &Value) -> Result<JsonValue, QuestionError> {
        match cell {
            Value::Integer(i) => Ok(JsonValue::from(*i)),
            Value::Real(f) => serde_json::Number::from_f64(*f).map(JsonValue::Number).ok_or_else(|| uncoercible(cell, Self::KIND, &self.column)),
            Value::Text(s) => {
                if let Ok(i) = s.trim().parse::<i64>() {
                    return Ok(JsonValue::from(i));
                }
                s.trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(JsonValue::Number)
                    .ok_or_else(|| uncoercible(cell, Self::KIND, &self.column))
            }
            _ => Err(uncoercible(cell, Self::KIND, &self.column)),
        }
    }
}
