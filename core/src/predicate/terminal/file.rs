use std::sync::Arc;

use serde_json::{json, Value as JsonValue};

use super::{operator, uncoercible, unknown_operator, Operation, ValuePredicate};
use crate::error::QuestionError;
use crate::predicate::Tokens;
use crate::query::{Operator, QualifiedColumn};
use crate::storage::FileStore;
use crate::value::{Value, ValueKind};

/// File attributes hold a storage key; the answer carries the key and its resolved location
pub struct FilePredicate {
    files: Arc<dyn FileStore>,
    column: QualifiedColumn,
    operation: Option<Operation>,
}

impl FilePredicate {
    pub fn new(files: Arc<dyn FileStore>, column: QualifiedColumn, tokens: Tokens<'_>) -> Result<Self, QuestionError> {
        let mut tokens = tokens;
        let Some(op) = operator(&mut tokens, ValueKind::File, &column)? else {
            return Ok(Self { files, column, operation: None });
        };
        let operation = match op {
            "present" => Operation::new(Operator::IsNotNull, Vec::new()),
            "absent" => Operation::new(Operator::IsNull, Vec::new()),
            other => return Err(unknown_operator(other, ValueKind::File)),
        };
        tokens.finish()?;
        Ok(Self { files, column, operation: Some(operation) })
    }
}

impl std::fmt::Debug for FilePredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilePredicate").field("column", &self.column).field("operation", &self.operation).finish_non_exhaustive()
    }
}

impl ValuePredicate for FilePredicate {
    const KIND: ValueKind = ValueKind::File;

    fn column(&self) -> &QualifiedColumn { &self.column }

    fn operation(&self) -> Option<&Operation> { self.operation.as_ref() }

    fn coerce(&self, cell: &Value) -> Result<JsonValue, QuestionError> {
        let key = match cell {
            Value::Text(key) => key.as_str(),
            Value::Blob(bytes) => std::str::from_utf8(bytes).map_err(|_| uncoercible(cell, Self::KIND, &self.column))?,
            _ => return Err(uncoercible(cell, Self::KIND, &self.column)),
        };
        let url = self.files.resolve(key)?;
        Ok(json!({ "key": key, "url": url }))
    }
}
