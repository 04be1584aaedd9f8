use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::Level;
use trail_core::{Context, Schema};
use trail_storage_sqlite::SqliteStorageEngine;

// Initialize tracing for tests
#[ctor::ctor]
fn init_tracing() {
    // if LOG_LEVEL env var is set, use it
    if let Ok(level) = std::env::var("LOG_LEVEL") {
        tracing_subscriber::fmt().with_max_level(Level::from_str(&level).unwrap()).with_test_writer().init();
    } else {
        tracing_subscriber::fmt().with_max_level(Level::INFO).with_test_writer().init();
    }
}

pub const SCHEMA: &str = r#"{
    "models": {
        "labor": {
            "table": "labor",
            "attributes": {
                "name": "string",
                "number": "integer",
                "started": "datetime",
                "dangerous": "boolean",
                "scroll": "file"
            },
            "relationships": {
                "monster": { "target": "monster", "kind": "child", "foreign_key": "labor_id" },
                "hero": { "target": "hero", "kind": "link", "through": "labor_hero", "source_key": "labor_id", "target_key": "hero_id" }
            }
        },
        "monster": {
            "table": "monster",
            "attributes": { "name": "string", "heads": "integer" },
            "relationships": { "labor": { "target": "labor", "kind": "parent", "foreign_key": "labor_id" } }
        },
        "hero": {
            "table": "hero",
            "attributes": { "name": "string", "mortal": "boolean" },
            "relationships": {
                "labor": { "target": "labor", "kind": "link", "through": "labor_hero", "source_key": "hero_id", "target_key": "labor_id" }
            }
        },
        "dragon": {
            "table": "dragon",
            "attributes": { "name": "string" }
        }
    }
}"#;

// Labors are inserted out of identity order so ordering is observable. Start times are stored in
// mixed formats: RFC 3339, with an offset, and naive.
const SEED: &str = r#"
    CREATE TABLE labor (id INTEGER PRIMARY KEY, name TEXT NOT NULL, number INTEGER, started TEXT, dangerous INTEGER, scroll TEXT);
    CREATE TABLE monster (id INTEGER PRIMARY KEY, labor_id INTEGER REFERENCES labor(id), name TEXT, heads INTEGER);
    CREATE TABLE hero (id INTEGER PRIMARY KEY, name TEXT, mortal INTEGER);
    CREATE TABLE labor_hero (labor_id INTEGER REFERENCES labor(id), hero_id INTEGER REFERENCES hero(id));

    INSERT INTO labor VALUES (3, 'Ceryneian Hind', 3, NULL, 0, NULL);
    INSERT INTO labor VALUES (1, 'Nemean Lion', 1, '2024-01-05T09:00:00Z', 1, 'scrolls/lion.pdf');
    INSERT INTO labor VALUES (4, 'Augean Stables', 5, '2024-04-01 00:00:00', 0, NULL);
    INSERT INTO labor VALUES (2, 'Lernaean Hydra', 2, '2024-02-10T14:30:00+02:00', 1, NULL);

    INSERT INTO monster VALUES (3, 2, 'Karkinos', 1);
    INSERT INTO monster VALUES (1, 1, 'Nemean Lion', 1);
    INSERT INTO monster VALUES (2, 2, 'Hydra', 9);
    INSERT INTO monster VALUES (4, 3, 'Hind', 1);

    INSERT INTO hero VALUES (1, 'Heracles', 1);
    INSERT INTO hero VALUES (2, 'Iolaus', 1);
    INSERT INTO hero VALUES (3, 'Athena', 0);

    INSERT INTO labor_hero VALUES (1, 1);
    INSERT INTO labor_hero VALUES (2, 2);
    INSERT INTO labor_hero VALUES (2, 1);
    INSERT INTO labor_hero VALUES (3, 1);
"#;

/// In-memory engine seeded with the labors fixture
pub async fn fixture() -> anyhow::Result<SqliteStorageEngine> {
    let storage = SqliteStorageEngine::open_in_memory().await?;
    {
        let conn = storage.pool().get().await?;
        conn.with_connection(|c| Ok(c.execute_batch(SEED)?)).await?;
    }
    Ok(storage)
}

pub async fn context() -> anyhow::Result<Context> {
    let storage = fixture().await?;
    Ok(Context::new(Arc::new(Schema::from_json(SCHEMA)?), Arc::new(storage)))
}

/// Token list from its JSON text
pub fn tokens(json: &str) -> Vec<JsonValue> { serde_json::from_str(json).unwrap() }
