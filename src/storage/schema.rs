//! Database schema definitions
//!
//! This module contains the SQL schema for the record store.

/// SQL schema for the record store
///
/// `profile_url` carries the uniqueness constraint so insert-or-ignore is
/// enforced by SQLite itself. The CHECK keeps empty names out of the store.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS faculty (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    profile_url TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    category TEXT NOT NULL DEFAULT 'Regular',
    designation TEXT NOT NULL DEFAULT 'Unknown',
    email TEXT NOT NULL DEFAULT 'Unknown',
    biography TEXT,
    specialization TEXT,
    publications TEXT,
    teaching TEXT,
    research TEXT
);

CREATE INDEX IF NOT EXISTS idx_faculty_category ON faculty(category);
"#;

/// Drops every table so the schema can be rebuilt from scratch
pub const DROP_SQL: &str = r#"
DROP INDEX IF EXISTS idx_faculty_category;
DROP TABLE IF EXISTS faculty;
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

/// Destroys and recreates the schema inside one transaction
pub fn recreate_schema(conn: &mut rusqlite::Connection) -> Result<(), rusqlite::Error> {
    let tx = conn.transaction()?;
    tx.execute_batch(DROP_SQL)?;
    tx.execute_batch(SCHEMA_SQL)?;
    tx.commit()
}
