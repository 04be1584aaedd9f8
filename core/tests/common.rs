use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::Level;
use trail_core::{QuerySpec, Row, Schema, StorageEngine, StorageError};

// Initialize tracing for tests
#[ctor::ctor]
fn init_tracing() { tracing_subscriber::fmt().with_max_level(Level::INFO).with_test_writer().init(); }

pub const SCHEMA: &str = r#"{
    "models": {
        "labor": {
            "table": "labor",
            "attributes": { "name": "string", "number": "integer" },
            "relationships": {
                "monster": { "target": "monster", "kind": "child", "foreign_key": "labor_id" },
                "hero": { "target": "hero", "kind": "link", "through": "labor_hero", "source_key": "labor_id", "target_key": "hero_id" }
            }
        },
        "monster": {
            "table": "monster",
            "identity": "monster_id",
            "attributes": { "name": "string", "heads": "integer" },
            "relationships": { "labor": { "target": "labor", "kind": "parent", "foreign_key": "labor_id" } }
        },
        "hero": { "table": "hero", "attributes": { "name": "string", "portrait": "file" } }
    }
}"#;

pub fn schema() -> Arc<Schema> { Arc::new(Schema::from_json(SCHEMA).unwrap()) }

/// Storage double that serves canned rows and keeps every query it was asked
#[derive(Default)]
pub struct RecordingStorage {
    rows: Vec<Row>,
    queries: Mutex<Vec<QuerySpec>>,
}

#[allow(unused)]
impl RecordingStorage {
    pub fn new(rows: Vec<Row>) -> Self { Self { rows, queries: Mutex::new(Vec::new()) } }

    pub fn queries(&self) -> Vec<QuerySpec> { self.queries.lock().unwrap().clone() }
}

#[async_trait]
impl StorageEngine for RecordingStorage {
    async fn fetch_rows(&self, query: &QuerySpec) -> Result<Vec<Row>, StorageError> {
        self.queries.lock().unwrap().push(query.clone());
        Ok(self.rows.clone())
    }
}
