use std::sync::Arc;

use crate::schema::Schema;
use crate::storage::{FileStore, StorageEngine, UrlFileStore};

/// Collaborators a question is compiled and executed with.
///
/// Cheap to clone; every request builds its own chain against the same shared context.
#[derive(Clone)]
pub struct Context {
    schema: Arc<Schema>,
    storage: Arc<dyn StorageEngine>,
    files: Arc<dyn FileStore>,
}

pub const DEFAULT_FILE_BASE_URL: &str = "/files";

impl Context {
    pub fn new(schema: Arc<Schema>, storage: Arc<dyn StorageEngine>) -> Self {
        Self { schema, storage, files: Arc::new(UrlFileStore::new(DEFAULT_FILE_BASE_URL)) }
    }

    pub fn with_file_store(mut self, files: Arc<dyn FileStore>) -> Self {
        self.files = files;
        self
    }

    pub fn schema(&self) -> &Schema { &self.schema }

    pub fn storage(&self) -> &Arc<dyn StorageEngine> { &self.storage }

    pub fn files(&self) -> &Arc<dyn FileStore> { &self.files }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.debug_struct("Context").field("schema", &self.schema).finish_non_exhaustive() }
}
