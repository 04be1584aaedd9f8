use async_trait::async_trait;

use crate::error::StorageError;
use crate::query::QuerySpec;
use crate::value::Row;

/// The tabular store a question is executed against.
///
/// An implementation runs the whole [`QuerySpec`] as one SELECT and reports every row keyed by
/// qualified column name (see [`QualifiedColumn::key`](crate::query::QualifiedColumn::key)), in the
/// order requested by `order_by`. Retries, if any, belong to the implementation.
#[async_trait]
pub trait StorageEngine: Send + Sync {
    async fn fetch_rows(&self, query: &QuerySpec) -> Result<Vec<Row>, StorageError>;
}

/// Resolves the storage key kept in a file attribute into something a client can fetch
pub trait FileStore: Send + Sync {
    fn resolve(&self, key: &str) -> Result<String, StorageError>;
}

/// Serves files from `base_url/key`
#[derive(Debug, Clone)]
pub struct UrlFileStore {
    base_url: String,
}

impl UrlFileStore {
    pub fn new(base_url: impl Into<String>) -> Self { Self { base_url: base_url.into().trim_end_matches('/').to_string() } }
}

impl FileStore for UrlFileStore {
    fn resolve(&self, key: &str) -> Result<String, StorageError> { Ok(format!("{}/{}", self.base_url, key.trim_start_matches('/'))) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_file_store_joins_once() {
        let store = UrlFileStore::new("https://cdn.example.com/files/");
        assert_eq!(store.resolve("/a/b.png").unwrap(), "https://cdn.example.com/files/a/b.png");
        assert_eq!(UrlFileStore::new("/files").resolve("c.txt").unwrap(), "/files/c.txt");
    }
}
