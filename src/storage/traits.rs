//! Storage traits and error types
//!
//! This module defines the trait interface for record store backends and
//! associated error types.

use crate::record::{Category, FacultyRecord};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
///
/// Every variant is fatal to a crawl run; an expected duplicate insert is
/// not an error and never produces one of these.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Record store lock poisoned: {0}")]
    Lock(String),

    #[error("Corrupt row {id}: {message}")]
    Corrupt { id: i64, message: String },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for record store implementations
///
/// Uniqueness of `profile_url` must be enforced by the backend itself and
/// `insert_if_absent` must be a single atomic compare-and-insert.
pub trait RecordStore {
    /// Destroys all records and recreates the empty store
    fn reset(&mut self) -> StorageResult<()>;

    /// Inserts a record unless one with the same profile URL exists
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The record was inserted
    /// * `Ok(false)` - A record with this profile URL was already stored; nothing changed
    fn insert_if_absent(&mut self, record: &FacultyRecord) -> StorageResult<bool>;

    /// Reads every record in insertion order
    fn read_all(&self) -> StorageResult<Vec<FacultyRecord>>;

    /// Looks up a single record by its profile URL
    fn get_by_url(&self, profile_url: &str) -> StorageResult<Option<FacultyRecord>>;

    /// Gets the total record count
    fn count_records(&self) -> StorageResult<u64>;

    /// Gets record counts per category
    fn count_by_category(&self) -> StorageResult<HashMap<Category, u64>>;
}
