//! Storage module for persisting the job catalog
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Company lookup-or-insert by name
//! - Job insertion with duplicate detection by link
//! - The run-scoped transaction boundary
//! - Catalog statistics queries

mod schema;
mod sqlite;
mod traits;

pub use schema::SCHEMA_VERSION;
pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(StorageError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}
