//! Error types for question compilation and execution.
//!
//! Compile errors (`MissingArgument`, `InvalidArgument`, `TrailingArguments`) are raised while the
//! chain is being built, strictly before the storage engine is asked for anything. Storage errors are
//! reported as-is and never retried here.

use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuestionError {
    /// A token required by the current position is absent or `null`
    #[error("missing argument: {0}")]
    MissingArgument(String),

    /// A token is present but outside the accepted domain of the node consuming it
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Tokens remain after a terminal predicate resolved
    #[error("trailing arguments: {}", render_tokens(.0))]
    TrailingArguments(Vec<JsonValue>),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A stored cell could not be coerced to the semantic type of its attribute
    #[error("extraction error: {0}")]
    Extraction(String),
}

impl QuestionError {
    pub fn missing(what: impl Into<String>) -> Self { QuestionError::MissingArgument(what.into()) }

    pub fn invalid(what: impl Into<String>) -> Self { QuestionError::InvalidArgument(what.into()) }

    pub fn kind(&self) -> ErrorKind {
        match self {
            QuestionError::MissingArgument(_) => ErrorKind::MissingArgument,
            QuestionError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            QuestionError::TrailingArguments(_) => ErrorKind::TrailingArguments,
            QuestionError::Storage(_) => ErrorKind::Storage,
            QuestionError::Extraction(_) => ErrorKind::Extraction,
        }
    }

    /// True for the errors detected while building the chain
    pub fn is_compile_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::MissingArgument | ErrorKind::InvalidArgument | ErrorKind::TrailingArguments)
    }

    /// Structured form handed to the transport layer
    pub fn report(&self) -> ErrorReport { ErrorReport { kind: self.kind(), message: self.to_string() } }
}

fn render_tokens(tokens: &[JsonValue]) -> String { tokens.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(", ") }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingArgument,
    InvalidArgument,
    TrailingArguments,
    Storage,
    Extraction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

/// Errors surfaced by a [`StorageEngine`](crate::storage::StorageEngine) implementation
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("connection error: {0}")]
    ConnectionError(String),

    #[error("backend error: {0}")]
    BackendError(Box<dyn std::error::Error + Send + Sync + 'static>),
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid schema document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("model {model} declares relationship {relationship} to unknown model {target}")]
    UnknownTarget { model: String, relationship: String, target: String },

    #[error("model {model} uses {name} as both an attribute and a relationship")]
    AmbiguousName { model: String, name: String },

    #[error("model {0} has an empty table or identity column")]
    Incomplete(String),
}
