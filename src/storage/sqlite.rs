//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the RecordStore trait.

use crate::record::{Category, FacultyRecord};
use crate::storage::schema::{initialize_schema, recreate_schema};
use crate::storage::traits::{RecordStore, StorageError, StorageResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

const SELECT_COLUMNS: &str = "SELECT id, profile_url, name, category, designation, email,
     biography, specialization, publications, teaching, research FROM faculty";

/// SQLite record store
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the record store at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;
        // Other processes may hold the write lock briefly
        conn.busy_timeout(Duration::from_secs(5))?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory store (for testing)
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn query_records(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> StorageResult<Vec<FacultyRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, read_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(into_record).collect()
    }
}

/// Columns as stored; the category label is checked afterwards
struct RawRow {
    id: i64,
    category: String,
    record: FacultyRecord,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        id: row.get(0)?,
        category: row.get(3)?,
        record: FacultyRecord {
            profile_url: row.get(1)?,
            name: row.get(2)?,
            category: Category::default(),
            designation: row.get(4)?,
            email: row.get(5)?,
            biography: row.get(6)?,
            specialization: row.get(7)?,
            publications: row.get(8)?,
            teaching: row.get(9)?,
            research: row.get(10)?,
        },
    })
}

fn into_record(raw: RawRow) -> StorageResult<FacultyRecord> {
    let category = Category::from_label(&raw.category).ok_or_else(|| StorageError::Corrupt {
        id: raw.id,
        message: format!("unknown category '{}'", raw.category),
    })?;

    Ok(FacultyRecord {
        category,
        ..raw.record
    })
}

impl RecordStore for SqliteStorage {
    fn reset(&mut self) -> StorageResult<()> {
        recreate_schema(&mut self.conn)?;
        Ok(())
    }

    fn insert_if_absent(&mut self, record: &FacultyRecord) -> StorageResult<bool> {
        // Only the uniqueness conflict is ignored; other constraint failures surface
        let changed = self.conn.execute(
            "INSERT INTO faculty
             (profile_url, name, category, designation, email,
              biography, specialization, publications, teaching, research)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(profile_url) DO NOTHING",
            params![
                record.profile_url,
                record.name,
                record.category.label(),
                record.designation,
                record.email,
                record.biography,
                record.specialization,
                record.publications,
                record.teaching,
                record.research,
            ],
        )?;

        Ok(changed == 1)
    }

    fn read_all(&self) -> StorageResult<Vec<FacultyRecord>> {
        self.query_records(&format!("{} ORDER BY id ASC", SELECT_COLUMNS), [])
    }

    fn get_by_url(&self, profile_url: &str) -> StorageResult<Option<FacultyRecord>> {
        let raw = self
            .conn
            .query_row(
                &format!("{} WHERE profile_url = ?1", SELECT_COLUMNS),
                params![profile_url],
                read_row,
            )
            .optional()?;

        raw.map(into_record).transpose()
    }

    fn count_records(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM faculty", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_by_category(&self) -> StorageResult<HashMap<Category, u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT category, COUNT(*) FROM faculty GROUP BY category")?;

        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut counts = HashMap::new();
        for (label, count) in rows {
            match Category::from_label(&label) {
                Some(category) => {
                    counts.insert(category, count as u64);
                }
                None => tracing::warn!("Ignoring rows with unknown category '{}'", label),
            }
        }

        Ok(counts)
    }
}
