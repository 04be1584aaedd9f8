pub mod context;
pub mod error;
pub mod predicate;
pub mod query;
pub mod question;
pub mod schema;
pub mod storage;
pub mod value;

pub use context::Context;
pub use error::{ErrorKind, ErrorReport, QuestionError, SchemaError, StorageError};
pub use query::{Filter, Join, Operator, QualifiedColumn, QuerySpec};
pub use question::{ask, Question};
pub use schema::{AttributeType, Cardinality, Model, Relationship, RelationshipKind, Schema};
pub use storage::{FileStore, StorageEngine, UrlFileStore};
pub use value::{Literal, Row, Value, ValueKind};
