//! SQLite storage engine implementation

use std::path::Path;

use async_trait::async_trait;
use rusqlite::params_from_iter;
use tracing::debug;
use trail_core::error::StorageError;
use trail_core::query::QuerySpec;
use trail_core::storage::StorageEngine;
use trail_core::value::Row;

use crate::connection::{PooledConnection, SqliteConfig, SqliteConnectionManager};
use crate::error::SqliteError;
use crate::sql_builder::SqlBuilder;
use crate::value::cell_from_sql;

/// Default connection pool size
pub const DEFAULT_POOL_SIZE: u32 = 10;

pub struct SqliteStorageEngine {
    pool: bb8::Pool<SqliteConnectionManager>,
}

impl SqliteStorageEngine {
    /// Create a new storage engine with an existing pool
    pub fn new(pool: bb8::Pool<SqliteConnectionManager>) -> Self { Self { pool } }

    pub async fn open_config(config: SqliteConfig) -> anyhow::Result<Self> {
        // an in-memory database lives only as long as its one connection
        let size = match config {
            SqliteConfig::File(_) => DEFAULT_POOL_SIZE,
            SqliteConfig::Memory => 1,
        };
        let pool = bb8::Pool::builder().max_size(size).build(SqliteConnectionManager::new(config)).await?;
        Ok(Self::new(pool))
    }

    /// Open a file-based SQLite database
    pub async fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> { Self::open_config(SqliteConfig::File(path.as_ref().to_path_buf())).await }

    /// Open an in-memory SQLite database (for testing)
    pub async fn open_in_memory() -> anyhow::Result<Self> { Self::open_config(SqliteConfig::Memory).await }

    /// Get a reference to the connection pool (for fixtures and diagnostics)
    pub fn pool(&self) -> &bb8::Pool<SqliteConnectionManager> { &self.pool }

    async fn connection(&self) -> Result<bb8::PooledConnection<'_, SqliteConnectionManager>, SqliteError> {
        self.pool.get().await.map_err(|e| SqliteError::Pool(e.to_string()))
    }

    async fn run(&self, query: &QuerySpec) -> Result<Vec<Row>, SqliteError> {
        let (sql, params) = SqlBuilder::new().query(query)?;
        debug!("fetch_rows SQL: {} with {} params", sql, params.len());

        // rows are keyed by qualified column, in select order
        let keys: Vec<String> = query.selects.iter().map(|c| c.key()).collect();

        let conn = self.connection().await?;
        let rows = fetch(&conn, sql, params, keys).await?;
        debug!("fetch_rows returned {} rows from {}", rows.len(), query.table);
        Ok(rows)
    }
}

async fn fetch(conn: &PooledConnection, sql: String, params: Vec<rusqlite::types::Value>, keys: Vec<String>) -> Result<Vec<Row>, SqliteError> {
    conn.with_connection(move |c| {
        let mut stmt = c.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), |sql_row| {
            let mut row = Row::new();
            for (i, key) in keys.iter().enumerate() {
                let cell: rusqlite::types::Value = sql_row.get(i)?;
                row.insert(key.clone(), cell_from_sql(cell));
            }
            Ok(row)
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    })
    .await
}

#[async_trait]
impl StorageEngine for SqliteStorageEngine {
    async fn fetch_rows(&self, query: &QuerySpec) -> Result<Vec<Row>, StorageError> { Ok(self.run(query).await?) }
}
