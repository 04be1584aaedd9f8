//! bb8 connection manager for rusqlite
//!
//! The engine only reads: each question runs one SELECT on a pooled connection. Writes happen outside
//! this crate (or through [`PooledConnection::with_connection`] in test fixtures).

use std::path::PathBuf;
use std::sync::Arc;

use rusqlite::Connection;
use tokio::sync::Mutex;

use crate::error::SqliteError;

/// Which database the pool opens
#[derive(Clone, Debug)]
pub enum SqliteConfig {
    /// Database file shared by every pooled connection
    File(PathBuf),
    /// Private to a single connection; the pool must be sized 1 to keep it alive
    Memory,
}

/// Opens connections for the bb8 pool.
///
/// Every connection is opened in WAL mode with foreign keys enforced.
pub struct SqliteConnectionManager {
    config: SqliteConfig,
}

impl SqliteConnectionManager {
    pub fn new(config: SqliteConfig) -> Self { Self { config } }

    fn open(config: &SqliteConfig) -> Result<Connection, SqliteError> {
        let conn = match config {
            SqliteConfig::File(path) => Connection::open(path)?,
            SqliteConfig::Memory => Connection::open_in_memory()?,
        };
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA foreign_keys=ON;
             PRAGMA temp_store=MEMORY;",
        )?;
        Ok(conn)
    }
}

/// A connection checked out of the pool.
///
/// rusqlite connections are not `Sync`; every use goes through the mutex on a blocking thread.
pub struct PooledConnection {
    inner: Arc<Mutex<Connection>>,
}

impl PooledConnection {
    fn new(conn: Connection) -> Self { Self { inner: Arc::new(Mutex::new(conn)) } }

    /// Run `f` against the connection on tokio's blocking pool.
    ///
    /// The engine passes the prepared SELECT and collects rows inside `f`; the statement and its rows
    /// never leave the blocking thread.
    pub async fn with_connection<F, T>(&self, f: F) -> Result<T, SqliteError>
    where
        F: FnOnce(&Connection) -> Result<T, SqliteError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.blocking_lock();
            f(&guard)
        })
        .await
        .map_err(|e| SqliteError::TaskJoin(e.to_string()))?
    }
}

impl bb8::ManageConnection for SqliteConnectionManager {
    type Connection = PooledConnection;
    type Error = SqliteError;

    fn connect(&self) -> impl std::future::Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let config = self.config.clone();
        async move {
            tokio::task::spawn_blocking(move || Self::open(&config).map(PooledConnection::new))
                .await
                .map_err(|e| SqliteError::TaskJoin(e.to_string()))?
        }
    }

    fn is_valid(&self, conn: &mut Self::Connection) -> impl std::future::Future<Output = Result<(), Self::Error>> + Send {
        let inner = conn.inner.clone();
        async move {
            tokio::task::spawn_blocking(move || inner.blocking_lock().execute_batch("SELECT 1").map_err(SqliteError::from))
                .await
                .map_err(|e| SqliteError::TaskJoin(e.to_string()))?
        }
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool { false }
}
