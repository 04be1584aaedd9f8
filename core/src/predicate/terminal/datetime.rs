use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde_json::Value as JsonValue;

use super::{operand, operand_list, operator, uncoercible, unknown_operator, Operation, ValuePredicate};
use crate::error::QuestionError;
use crate::predicate::Tokens;
use crate::query::{Operator, QualifiedColumn};
use crate::value::{Literal, Value, ValueKind};

/// Datetime and date attributes.
///
/// Operands and stored cells are both normalized to RFC 3339 UTC text with second precision, so that
/// text comparison in the store orders them chronologically.
#[derive(Debug)]
pub struct DateTimePredicate {
    column: QualifiedColumn,
    operation: Option<Operation>,
}

const EXPECTED: &str = "a datetime string or unix timestamp";

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Accepts RFC 3339, naive `YYYY-MM-DD[ T]HH:MM:SS[.f]` (taken as UTC) and bare dates (midnight UTC)
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(s) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

fn normalize(datetime: DateTime<Utc>) -> String { datetime.to_rfc3339_opts(SecondsFormat::Secs, true) }

fn datetime_literal(token: &JsonValue) -> Option<Literal> {
    let datetime = match token {
        JsonValue::String(s) => parse_datetime(s)?,
        JsonValue::Number(n) => DateTime::from_timestamp(n.as_i64()?, 0)?,
        _ => return None,
    };
    Some(Literal::Text(normalize(datetime)))
}

impl DateTimePredicate {
    pub fn new(column: QualifiedColumn, tokens: Tokens<'_>) -> Result<Self, QuestionError> {
        let mut tokens = tokens;
        let Some(op) = operator(&mut tokens, ValueKind::DateTime, &column)? else {
            return Ok(Self { column, operation: None });
        };
        let operation = match op {
            "equals" => Operation::new(Operator::Equal, vec![operand(&mut tokens, op, EXPECTED, datetime_literal)?]),
            "not_equals" => Operation::new(Operator::NotEqual, vec![operand(&mut tokens, op, EXPECTED, datetime_literal)?]),
            "gt" | "after" => Operation::new(Operator::GreaterThan, vec![operand(&mut tokens, op, EXPECTED, datetime_literal)?]),
            "gte" => Operation::new(Operator::GreaterThanOrEqual, vec![operand(&mut tokens, op, EXPECTED, datetime_literal)?]),
            "lt" | "before" => Operation::new(Operator::LessThan, vec![operand(&mut tokens, op, EXPECTED, datetime_literal)?]),
            "lte" => Operation::new(Operator::LessThanOrEqual, vec![operand(&mut tokens, op, EXPECTED, datetime_literal)?]),
            "between" => {
                let start = operand(&mut tokens, op, EXPECTED, datetime_literal)?;
                let end = operand(&mut tokens, op, EXPECTED, datetime_literal)?;
                Operation::new(Operator::Between, vec![start, end])
            }
            "in" => Operation::new(Operator::In, operand_list(&mut tokens, op, "datetimes", datetime_literal)?),
            "present" => Operation::new(Operator::IsNotNull, Vec::new()),
            "absent" => Operation::new(Operator::IsNull, Vec::new()),
            other => return Err(unknown_operator(other, ValueKind::DateTime)),
        };
        tokens.finish()?;
        Ok(Self { column, operation: Some(operation) })
    }
}

impl ValuePredicate for DateTimePredicate {
    const KIND: ValueKind = ValueKind::DateTime;

    fn column(&self) -> &QualifiedColumn { &self.column }

    fn operation(&self) -> Option<&Operation> { self.operation.as_ref() }

    fn coerce(&self, cell: &Value) -> Result<JsonValue, QuestionError> {
        let datetime = match cell {
            Value::Text(s) => parse_datetime(s),
            Value::Integer(secs) => DateTime::from_timestamp(*secs, 0),
            _ => None,
        };
        datetime.map(|d| JsonValue::String(normalize(d))).ok_or_else(|| uncoercible(cell, Self::KIND, &self.column))
    }
}
