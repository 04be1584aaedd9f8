//! Mapping between core values and SQLite storage classes

use rusqlite::types::Value as SqlValue;
use trail_core::value::{Literal, Value};

/// Bind form of a filter operand. Booleans are stored as 0/1.
pub fn literal_to_sql(literal: &Literal) -> SqlValue {
    match literal {
        Literal::Integer(i) => SqlValue::Integer(*i),
        Literal::Float(f) => SqlValue::Real(*f),
        Literal::Text(s) => SqlValue::Text(s.clone()),
        Literal::Boolean(b) => SqlValue::Integer(if *b { 1 } else { 0 }),
    }
}

/// A fetched cell in core form
pub fn cell_from_sql(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(i) => Value::Integer(i),
        SqlValue::Real(f) => Value::Real(f),
        SqlValue::Text(s) => Value::Text(s),
        SqlValue::Blob(b) => Value::Blob(b),
    }
}
