//! SQLite backend for trail
//!
//! Executes the single SELECT a compiled question needs against an embedded SQLite database.
//! Connections are pooled with bb8 and every rusqlite call runs on tokio's blocking pool.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use trail_core::{ask, Context, Schema};
//! use trail_storage_sqlite::SqliteStorageEngine;
//!
//! let storage = SqliteStorageEngine::open("labors.db").await?;
//! let ctx = Context::new(Arc::new(Schema::from_json(SCHEMA)?), Arc::new(storage));
//! let names = ask(&ctx, &serde_json::from_str::<Vec<_>>(r#"["labor", "monster", "name"]"#)?).await?;
//! ```

mod connection;
mod engine;
mod error;
pub mod sql_builder;
mod value;

pub use connection::{PooledConnection, SqliteConfig, SqliteConnectionManager};
pub use engine::{SqliteStorageEngine, DEFAULT_POOL_SIZE};
pub use error::SqliteError;
