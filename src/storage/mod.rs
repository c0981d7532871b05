//! Storage module for persisting extracted records
//!
//! This module handles all database operations for the pipeline:
//! - SQLite schema management and truncate-and-rebuild resets
//! - Atomic insert-or-ignore keyed on the profile URL
//! - Full-table reads for export and statistics

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{RecordStore, StorageError, StorageResult};

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// A record store shared between concurrent crawl tasks
///
/// Every write goes through the mutex, so at most one insert statement is in
/// flight per store handle.
pub type SharedStore = Arc<Mutex<dyn RecordStore + Send>>;

/// Opens the SQLite store at `path` and wraps it for sharing
pub fn open_shared(path: &Path) -> StorageResult<SharedStore> {
    let storage = SqliteStorage::new(path)?;
    Ok(Arc::new(Mutex::new(storage)))
}

/// Locks a shared store, mapping poisoning to a storage error
pub fn lock(store: &SharedStore) -> StorageResult<MutexGuard<'_, dyn RecordStore + Send + 'static>> {
    store
        .lock()
        .map_err(|e| StorageError::Lock(e.to_string()))
}
