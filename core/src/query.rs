//! Join / filter value objects and the compiled [`QuerySpec`].
//!
//! Joins and filters are collected from the chain into ordered sets; structural equality is what makes
//! the same condition reached through two paths collapse into a single clause.
//!
//! Every table enters the query under an alias naming the path that reached it: the root table is
//! addressed by its own name, `labor/monster` is the `monster` table reached from the root through the
//! `monster` relationship. Two traversals share a join only when they follow the same path.

use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::IndexSet;

use crate::value::{Literal, ValueKind};

/// Separates the relationship names of a traversal path in an alias
pub const PATH_SEPARATOR: char = '/';

/// Separates the first relationship of a sub-specification from the alias it narrows
pub const CONDITION_SEPARATOR: char = '?';

/// Alias of the table reached by following `relationship` from the table aliased `from`
pub fn traversal_alias(from: &str, relationship: &str) -> String { format!("{}{}{}", from, PATH_SEPARATOR, relationship) }

/// Alias of the table a sub-specification reaches through `relationship`. Kept apart from
/// [`traversal_alias`] so a condition never narrows the rows of a later traversal over the same
/// relationship.
pub fn condition_alias(from: &str, relationship: &str) -> String { format!("{}{}{}", from, CONDITION_SEPARATOR, relationship) }

/// Alias of the link table crossed on the way to the table aliased `target`
pub fn through_alias(target: &str, through: &str) -> String { format!("{}+{}", target, through) }

/// A column addressed through the alias of its table
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedColumn {
    /// Table alias; the table name itself at the root
    pub table: String,
    pub column: String,
}

impl QualifiedColumn {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self { Self { table: table.into(), column: column.into() } }

    /// Row key under which the storage engine reports this column
    pub fn key(&self) -> String { format!("{}.{}", self.table, self.column) }
}

impl fmt::Display for QualifiedColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}.{}", self.table, self.column) }
}

/// An equality join bringing `table` into the query under the alias of `joined`.
///
/// Equality and hashing look only at the unordered pair of qualified columns, so `a.x = b.y` and
/// `b.y = a.x` are the same join.
#[derive(Debug, Clone)]
pub struct Join {
    table: String,
    existing: QualifiedColumn,
    joined: QualifiedColumn,
}

impl Join {
    /// `existing` is already reachable in the query, `joined` is addressed through the alias `table` is
    /// joined in under
    pub fn new(table: impl Into<String>, existing: QualifiedColumn, joined: QualifiedColumn) -> Self {
        Self { table: table.into(), existing, joined }
    }

    pub fn table(&self) -> &str { &self.table }

    pub fn alias(&self) -> &str { &self.joined.table }

    pub fn existing(&self) -> &QualifiedColumn { &self.existing }

    pub fn joined(&self) -> &QualifiedColumn { &self.joined }

    fn normalized(&self) -> (&QualifiedColumn, &QualifiedColumn) {
        if self.existing <= self.joined {
            (&self.existing, &self.joined)
        } else {
            (&self.joined, &self.existing)
        }
    }
}

impl PartialEq for Join {
    fn eq(&self, other: &Self) -> bool { self.normalized() == other.normalized() }
}

impl Eq for Join {}

impl Hash for Join {
    fn hash<H: Hasher>(&self, state: &mut H) { self.normalized().hash(state) }
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.alias() == self.table {
            write!(f, "JOIN {} ON {} = {}", self.table, self.existing, self.joined)
        } else {
            write!(f, "JOIN {} AS {} ON {} = {}", self.table, self.alias(), self.existing, self.joined)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    In,
    Between,
    Like,
    IsNull,
    IsNotNull,
}

impl Operator {
    /// Number of operands the operator takes; `None` for variadic (`In`)
    pub fn arity(&self) -> Option<usize> {
        match self {
            Operator::IsNull | Operator::IsNotNull => Some(0),
            Operator::Between => Some(2),
            Operator::In => None,
            _ => Some(1),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Equal => "=",
            Operator::NotEqual => "<>",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqual => ">=",
            Operator::LessThan => "<",
            Operator::LessThanOrEqual => "<=",
            Operator::In => "IN",
            Operator::Between => "BETWEEN",
            Operator::Like => "LIKE",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
        };
        f.write_str(s)
    }
}

/// A WHERE condition on one qualified column.
///
/// `kind` is the value kind the column is compared as; a backend whose storage classes do not order
/// that kind directly (datetimes kept in mixed text formats, say) normalizes the column before comparing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Filter {
    pub column: QualifiedColumn,
    pub kind: ValueKind,
    pub operator: Operator,
    pub operands: Vec<Literal>,
}

impl Filter {
    pub fn new(column: QualifiedColumn, kind: ValueKind, operator: Operator, operands: Vec<Literal>) -> Self {
        Self { column, kind, operator, operands }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.column, self.operator)?;
        match self.operator {
            Operator::IsNull | Operator::IsNotNull => Ok(()),
            Operator::Between if self.operands.len() == 2 => write!(f, " {} AND {}", self.operands[0], self.operands[1]),
            Operator::In => write!(f, " ({})", self.operands.iter().map(|o| o.to_string()).collect::<Vec<_>>().join(", ")),
            _ => match self.operands.first() {
                Some(operand) => write!(f, " {}", operand),
                None => Ok(()),
            },
        }
    }
}

/// Everything the storage engine needs to run the single query of a question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    /// Root table the query selects from
    pub table: String,
    /// Ascending ordering columns; the root identity is always first
    pub order_by: IndexSet<QualifiedColumn>,
    /// Joins in discovery order
    pub joins: IndexSet<Join>,
    pub filters: IndexSet<Filter>,
    /// Projected columns; always contains the root identity
    pub selects: IndexSet<QualifiedColumn>,
}

impl fmt::Display for QuerySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let selects = self.selects.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(", ");
        write!(f, "SELECT {} FROM {}", selects, self.table)?;
        for join in &self.joins {
            write!(f, " {}", join)?;
        }
        if !self.filters.is_empty() {
            let filters = self.filters.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(" AND ");
            write!(f, " WHERE {}", filters)?;
        }
        let order = self.order_by.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(", ");
        write!(f, " ORDER BY {}", order)
    }
}
