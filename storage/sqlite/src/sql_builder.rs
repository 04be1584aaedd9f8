//! SQL builder for SQLite queries
//!
//! Renders a [`QuerySpec`] as one parameterized SELECT. Every column is qualified by its table alias and
//! every joined table is brought in with a LEFT JOIN, so records without related rows still appear
//! (with `NULL` in the related columns).

use rusqlite::types::Value as SqlValue;
use thiserror::Error;
use trail_core::query::{Filter, Join, Operator, QualifiedColumn, QuerySpec};
use trail_core::value::ValueKind;

use crate::error::SqliteError;
use crate::value::literal_to_sql;

#[derive(Debug, Error, Clone)]
pub enum SqlGenerationError {
    #[error("Nothing to select from {0}")]
    EmptySelection(String),
    #[error("Operator {operator} on {column} expects {expected} operands, got {actual}")]
    OperandCount { column: String, operator: Operator, expected: usize, actual: usize },
    #[error("Operator IN on {0} needs at least one operand")]
    EmptyList(String),
}

impl From<SqlGenerationError> for SqliteError {
    fn from(err: SqlGenerationError) -> Self { SqliteError::SqlGeneration(err.to_string()) }
}

/// Escape character declared on every LIKE; operands produced by the string terminal escape with it
pub const LIKE_ESCAPE: char = '\\';

pub fn quote_identifier(name: &str) -> String { format!(r#""{}""#, name.replace('"', "\"\"")) }

pub fn quote_column(column: &QualifiedColumn) -> String { format!("{}.{}", quote_identifier(&column.table), quote_identifier(&column.column)) }

/// Text form datetime operands arrive in; stored cells are rewritten to it before comparing
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// A datetime column normalized to [`DATETIME_FORMAT`]. SQLite parses ISO 8601 text (with or without
/// `T`, offset or time of day) on its own; integer cells are unix seconds.
pub fn normalized_datetime(column: &QualifiedColumn) -> String {
    let column = quote_column(column);
    format!(
        "CASE typeof({column}) WHEN 'integer' THEN strftime('{format}', {column}, 'unixepoch') ELSE strftime('{format}', {column}) END",
        column = column,
        format = DATETIME_FORMAT
    )
}

#[derive(Default)]
pub struct SqlBuilder {
    sql: String,
    params: Vec<SqlValue>,
}

impl SqlBuilder {
    pub fn new() -> Self { Self::default() }

    fn push_sql(&mut self, s: &str) { self.sql.push_str(s); }

    fn push_param(&mut self, value: SqlValue) {
        self.sql.push('?');
        self.params.push(value);
    }

    /// Render the whole query
    pub fn query(mut self, query: &QuerySpec) -> Result<(String, Vec<SqlValue>), SqlGenerationError> {
        if query.selects.is_empty() {
            return Err(SqlGenerationError::EmptySelection(query.table.clone()));
        }

        self.push_sql("SELECT ");
        let columns = query.selects.iter().map(quote_column).collect::<Vec<_>>().join(", ");
        self.push_sql(&columns);
        self.push_sql(" FROM ");
        self.push_sql(&quote_identifier(&query.table));

        for join in &query.joins {
            self.join(join);
        }

        for (i, filter) in query.filters.iter().enumerate() {
            self.push_sql(if i == 0 { " WHERE " } else { " AND " });
            self.filter(filter)?;
        }

        for (i, column) in query.order_by.iter().enumerate() {
            self.push_sql(if i == 0 { " ORDER BY " } else { ", " });
            self.push_sql(&quote_column(column));
            self.push_sql(" ASC");
        }

        Ok((self.sql, self.params))
    }

    pub fn join(&mut self, join: &Join) {
        self.push_sql(" LEFT JOIN ");
        self.push_sql(&quote_identifier(join.table()));
        if join.alias() != join.table() {
            self.push_sql(" AS ");
            self.push_sql(&quote_identifier(join.alias()));
        }
        self.push_sql(" ON ");
        self.push_sql(&quote_column(join.existing()));
        self.push_sql(" = ");
        self.push_sql(&quote_column(join.joined()));
    }

    pub fn filter(&mut self, filter: &Filter) -> Result<(), SqlGenerationError> {
        check_operands(filter)?;
        match (filter.kind, filter.operator) {
            (_, Operator::IsNull | Operator::IsNotNull) => self.push_sql(&quote_column(&filter.column)),
            (ValueKind::DateTime, _) => self.push_sql(&normalized_datetime(&filter.column)),
            _ => self.push_sql(&quote_column(&filter.column)),
        }
        self.push_sql(" ");
        self.push_sql(&filter.operator.to_string());
        match filter.operator {
            Operator::IsNull | Operator::IsNotNull => {}
            Operator::In => {
                self.push_sql(" (");
                for (i, operand) in filter.operands.iter().enumerate() {
                    if i > 0 {
                        self.push_sql(", ");
                    }
                    self.push_param(literal_to_sql(operand));
                }
                self.push_sql(")");
            }
            Operator::Between => {
                self.push_sql(" ");
                self.push_param(literal_to_sql(&filter.operands[0]));
                self.push_sql(" AND ");
                self.push_param(literal_to_sql(&filter.operands[1]));
            }
            Operator::Like => {
                self.push_sql(" ");
                self.push_param(literal_to_sql(&filter.operands[0]));
                self.push_sql(&format!(" ESCAPE '{}'", LIKE_ESCAPE));
            }
            _ => {
                self.push_sql(" ");
                self.push_param(literal_to_sql(&filter.operands[0]));
            }
        }
        Ok(())
    }
}

fn check_operands(filter: &Filter) -> Result<(), SqlGenerationError> {
    let actual = filter.operands.len();
    match filter.operator.arity() {
        Some(expected) if expected != actual => Err(SqlGenerationError::OperandCount {
            column: filter.column.to_string(),
            operator: filter.operator,
            expected,
            actual,
        }),
        None if actual == 0 => Err(SqlGenerationError::EmptyList(filter.column.to_string())),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trail_core::value::Literal;

    fn spec(table: &str, selects: &[QualifiedColumn], joins: &[Join], filters: &[Filter], order_by: &[QualifiedColumn]) -> QuerySpec {
        QuerySpec {
            table: table.to_string(),
            order_by: order_by.iter().cloned().collect(),
            joins: joins.iter().cloned().collect(),
            filters: filters.iter().cloned().collect(),
            selects: selects.iter().cloned().collect(),
        }
    }

    fn col(table: &str, column: &str) -> QualifiedColumn { QualifiedColumn::new(table, column) }

    #[test]
    fn test_plain_projection() {
        let query = spec("labor", &[col("labor", "id"), col("labor", "name")], &[], &[], &[col("labor", "id")]);
        let (sql, params) = SqlBuilder::new().query(&query).unwrap();
        assert_eq!(sql, r#"SELECT "labor"."id", "labor"."name" FROM "labor" ORDER BY "labor"."id" ASC"#);
        assert!(params.is_empty());
    }

    #[test]
    fn test_joins_and_filters() {
        let query = spec(
            "labor",
            &[col("labor", "id"), col("monster", "id"), col("monster", "name")],
            &[Join::new("monster", col("labor", "id"), col("monster", "labor_id"))],
            &[
                Filter::new(col("labor", "number"), ValueKind::Number, Operator::Between, vec![Literal::Integer(2), Literal::Integer(5)]),
                Filter::new(col("monster", "name"), ValueKind::String, Operator::Like, vec![Literal::Text("Hy%".into())]),
                Filter::new(col("monster", "heads"), ValueKind::Number, Operator::IsNotNull, vec![]),
            ],
            &[col("labor", "id"), col("monster", "id")],
        );
        let (sql, params) = SqlBuilder::new().query(&query).unwrap();
        assert_eq!(
            sql,
            concat!(
                r#"SELECT "labor"."id", "monster"."id", "monster"."name" FROM "labor""#,
                r#" LEFT JOIN "monster" ON "labor"."id" = "monster"."labor_id""#,
                r#" WHERE "labor"."number" BETWEEN ? AND ? AND "monster"."name" LIKE ? ESCAPE '\'"#,
                r#" AND "monster"."heads" IS NOT NULL"#,
                r#" ORDER BY "labor"."id" ASC, "monster"."id" ASC"#
            )
        );
        assert_eq!(params, vec![SqlValue::Integer(2), SqlValue::Integer(5), SqlValue::Text("Hy%".into())]);
    }

    #[test]
    fn test_in_operator() {
        let names = vec![Literal::Text("Hydra".into()), Literal::Text("Lion".into())];
        let filter = Filter::new(col("monster", "name"), ValueKind::String, Operator::In, names);
        let query = spec("monster", &[col("monster", "id")], &[], &[filter], &[col("monster", "id")]);
        let (sql, params) = SqlBuilder::new().query(&query).unwrap();
        assert!(sql.contains(r#"WHERE "monster"."name" IN (?, ?)"#));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_operand_count_checked() {
        let filter = Filter::new(col("labor", "number"), ValueKind::Number, Operator::Between, vec![Literal::Integer(2)]);
        let query = spec("labor", &[col("labor", "id")], &[], &[filter], &[col("labor", "id")]);
        assert!(matches!(SqlBuilder::new().query(&query), Err(SqlGenerationError::OperandCount { expected: 2, actual: 1, .. })));

        let empty = spec("labor", &[], &[], &[], &[]);
        assert!(matches!(SqlBuilder::new().query(&empty), Err(SqlGenerationError::EmptySelection(_))));
    }

    #[test]
    fn test_aliased_join() {
        let query = spec(
            "monster",
            &[col("monster", "id"), col("monster/rival", "name")],
            &[Join::new("monster", col("monster", "rival_id"), col("monster/rival", "id"))],
            &[],
            &[col("monster", "id")],
        );
        let (sql, _) = SqlBuilder::new().query(&query).unwrap();
        assert_eq!(
            sql,
            concat!(
                r#"SELECT "monster"."id", "monster/rival"."name" FROM "monster""#,
                r#" LEFT JOIN "monster" AS "monster/rival" ON "monster"."rival_id" = "monster/rival"."id""#,
                r#" ORDER BY "monster"."id" ASC"#
            )
        );
    }

    #[test]
    fn test_datetime_filters_compare_normalized_cells() {
        let started = col("labor", "started");
        let operand = vec![Literal::Text("2024-02-01T00:00:00Z".into())];
        let after = Filter::new(started.clone(), ValueKind::DateTime, Operator::GreaterThan, operand);
        let mut builder = SqlBuilder::new();
        builder.filter(&after).unwrap();
        assert_eq!(
            builder.sql,
            concat!(
                r#"CASE typeof("labor"."started") WHEN 'integer' THEN strftime('%Y-%m-%dT%H:%M:%SZ', "labor"."started", 'unixepoch')"#,
                r#" ELSE strftime('%Y-%m-%dT%H:%M:%SZ', "labor"."started") END > ?"#
            )
        );

        let mut builder = SqlBuilder::new();
        builder.filter(&Filter::new(started, ValueKind::DateTime, Operator::IsNull, vec![])).unwrap();
        assert_eq!(builder.sql, r#""labor"."started" IS NULL"#);
    }

    #[test]
    fn test_identifiers_are_quoted() {
        assert_eq!(quote_identifier(r#"odd"name"#), r#""odd""name""#);
    }
}
