use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::context::Context;
use crate::error::QuestionError;
use crate::predicate::{ModelPredicate, NodeKind, Predicate, Tokens};
use crate::query::QuerySpec;
use crate::storage::StorageEngine;
use crate::value::{Row, ValueKind};

/// A compiled question: the predicate chain built from a token list and the single query it needs.
///
/// Building a `Question` never touches storage; every malformed token list is rejected here.
/// [`Question::answer`] then runs the query once and folds the rows back into the shape of the chain.
pub struct Question {
    root: ModelPredicate,
    query: QuerySpec,
    storage: Arc<dyn StorageEngine>,
}

impl Question {
    pub fn new(ctx: &Context, tokens: &[JsonValue]) -> Result<Self, QuestionError> {
        let root = ModelPredicate::root(ctx, Tokens::new(tokens))?;
        let query = compile(&root)?;
        debug!("compiled {} tokens into {}", tokens.len(), query);
        Ok(Self { root, query, storage: ctx.storage().clone() })
    }

    /// Parse the JSON array text a transport delivers
    pub fn from_json(ctx: &Context, json: &str) -> Result<Self, QuestionError> {
        let parsed: JsonValue = serde_json::from_str(json).map_err(|e| QuestionError::invalid(format!("malformed question: {}", e)))?;
        match parsed {
            JsonValue::Array(tokens) => Self::new(ctx, &tokens),
            other => Err(QuestionError::invalid(format!("expected a list of tokens, got {}", other))),
        }
    }

    /// Node kinds from the root model down to the terminal
    pub fn path(&self) -> Vec<NodeKind> {
        let mut path = Vec::new();
        let mut node: Option<&dyn Predicate> = Some(&self.root);
        while let Some(current) = node {
            path.push(current.kind());
            node = current.child();
        }
        path
    }

    pub fn reduced_type(&self) -> ValueKind { self.root.reduced_type() }

    pub fn query(&self) -> &QuerySpec { &self.query }

    pub fn root(&self) -> &ModelPredicate { &self.root }

    /// Execute the query and extract the nested answer
    pub async fn answer(&self) -> Result<JsonValue, QuestionError> {
        let rows: Vec<Row> = self.storage.fetch_rows(&self.query).await?;
        debug!("{} rows for {}", rows.len(), self.root.model());
        let rows: Vec<&Row> = rows.iter().collect();
        self.root.extract(&rows)
    }
}

impl std::fmt::Debug for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Question").field("root", &self.root).field("query", &self.query).finish_non_exhaustive()
    }
}

/// Compile and answer in one step
pub async fn ask(ctx: &Context, tokens: &[JsonValue]) -> Result<JsonValue, QuestionError> { Question::new(ctx, tokens)?.answer().await }

fn compile(root: &ModelPredicate) -> Result<QuerySpec, QuestionError> {
    let mut selects = root.select();
    selects.insert(root.identity().clone());

    Ok(QuerySpec { table: root.table().to_string(), order_by: root.order(), joins: root.join(), filters: root.filter(), selects })
}
