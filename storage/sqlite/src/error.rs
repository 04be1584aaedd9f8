//! Error types for the SQLite backend

use thiserror::Error;
use trail_core::error::{QuestionError, StorageError};

#[derive(Debug, Error)]
pub enum SqliteError {
    #[error("SQLite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("SQL generation error: {0}")]
    SqlGeneration(String),

    #[error("Task join error: {0}")]
    TaskJoin(String),
}

const NO_SUCH_TABLE: &str = "no such table: ";

impl SqliteError {
    /// Table named by a "no such table" failure, if that is what this is
    pub fn missing_table(&self) -> Option<&str> {
        match self {
            SqliteError::Rusqlite(rusqlite::Error::SqliteFailure(_, Some(message))) => message.strip_prefix(NO_SUCH_TABLE),
            _ => None,
        }
    }
}

impl From<SqliteError> for StorageError {
    fn from(err: SqliteError) -> Self {
        if let Some(table) = err.missing_table() {
            return StorageError::TableNotFound(table.to_string());
        }
        match err {
            SqliteError::Pool(message) => StorageError::ConnectionError(message),
            other => StorageError::BackendError(Box::new(other)),
        }
    }
}

impl From<SqliteError> for QuestionError {
    fn from(err: SqliteError) -> Self { QuestionError::Storage(err.into()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(message: &str) -> SqliteError {
        SqliteError::Rusqlite(rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(1), Some(message.to_string())))
    }

    #[test]
    fn test_storage_error_mapping() {
        assert!(matches!(StorageError::from(failure("no such table: hydra")), StorageError::TableNotFound(t) if t == "hydra"));
        assert!(matches!(StorageError::from(failure("no such column: labor.heads")), StorageError::BackendError(_)));
        assert!(matches!(StorageError::from(SqliteError::Pool("timed out".into())), StorageError::ConnectionError(_)));
    }
}
