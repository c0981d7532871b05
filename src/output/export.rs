//! CSV and JSON snapshot export
//!
//! Exports are full snapshots of the record store in insertion order. Each
//! file is rendered in memory, written to a temporary file beside the target
//! and renamed over it, so a reader never observes a half-written export.

use crate::config::OutputConfig;
use crate::record::{Category, FacultyRecord};
use crate::storage::{RecordStore, StorageError};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Errors that can occur while exporting
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to read records: {0}")]
    Storage(#[from] StorageError),

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Describes one written export file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedFile {
    pub format: ExportFormat,
    pub path: PathBuf,
    pub records: usize,

    /// Hex SHA-256 of the file content
    pub sha256: String,
}

/// One exported row; field order is the column order
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    name: &'a str,
    category: Category,
    designation: &'a str,
    email: &'a str,
    biography: Option<&'a str>,
    specialization: Option<&'a str>,
    publications: Option<&'a str>,
    teaching: Option<&'a str>,
    research: Option<&'a str>,
    profile_url: &'a str,
    search_text: String,
}

impl<'a> From<&'a FacultyRecord> for ExportRow<'a> {
    fn from(record: &'a FacultyRecord) -> Self {
        Self {
            name: &record.name,
            category: record.category,
            designation: &record.designation,
            email: &record.email,
            biography: record.biography.as_deref(),
            specialization: record.specialization.as_deref(),
            publications: record.publications.as_deref(),
            teaching: record.teaching.as_deref(),
            research: record.research.as_deref(),
            profile_url: &record.profile_url,
            search_text: record.search_text(),
        }
    }
}

/// Writes store snapshots to a fixed set of destinations
#[derive(Debug, Clone)]
pub struct Exporter {
    targets: Vec<(ExportFormat, PathBuf)>,
}

impl Exporter {
    pub fn new(targets: Vec<(ExportFormat, PathBuf)>) -> Self {
        Self { targets }
    }

    /// CSV and JSON destinations from the output configuration
    pub fn from_config(output: &OutputConfig) -> Self {
        Self::new(vec![
            (ExportFormat::Csv, PathBuf::from(&output.csv_path)),
            (ExportFormat::Json, PathBuf::from(&output.json_path)),
        ])
    }

    /// Exports to every configured destination
    pub fn export(&self, store: &dyn RecordStore) -> ExportResult<Vec<ExportedFile>> {
        let formats: Vec<ExportFormat> = self.targets.iter().map(|(format, _)| *format).collect();
        self.export_formats(store, &formats)
    }

    /// Exports only the requested formats
    ///
    /// The store is read once; every file holds the same snapshot.
    pub fn export_formats(
        &self,
        store: &dyn RecordStore,
        formats: &[ExportFormat],
    ) -> ExportResult<Vec<ExportedFile>> {
        let records = store.read_all()?;
        let rows: Vec<ExportRow<'_>> = records.iter().map(ExportRow::from).collect();

        let mut written = Vec::new();
        for (format, path) in self.targets.iter().filter(|(f, _)| formats.contains(f)) {
            let content = match format {
                ExportFormat::Csv => render_csv(&rows)?,
                ExportFormat::Json => render_json(&rows)?,
            };

            write_atomic(path, &content)?;
            tracing::info!(
                "Exported {} records to {} ({})",
                rows.len(),
                path.display(),
                format
            );

            written.push(ExportedFile {
                format: *format,
                path: path.clone(),
                records: rows.len(),
                sha256: hex::encode(Sha256::digest(&content)),
            });
        }

        Ok(written)
    }
}

fn render_csv(rows: &[ExportRow<'_>]) -> ExportResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }

    // With zero rows serde never sees a struct, so the header is written by hand
    if rows.is_empty() {
        writer.write_record(CSV_HEADER)?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.into_error().into()))
}

const CSV_HEADER: [&str; 11] = [
    "name",
    "category",
    "designation",
    "email",
    "biography",
    "specialization",
    "publications",
    "teaching",
    "research",
    "profile_url",
    "search_text",
];

fn render_json(rows: &[ExportRow<'_>]) -> ExportResult<Vec<u8>> {
    let mut content = serde_json::to_vec_pretty(rows)?;
    content.push(b'\n');
    Ok(content)
}

/// Replaces `path` with `content` via a temporary file in the same directory
pub fn write_atomic(path: &Path, content: &[u8]) -> ExportResult<()> {
    let write_error = |source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_error)?;

    let mut file = NamedTempFile::new_in(dir).map_err(write_error)?;
    file.write_all(content).map_err(write_error)?;
    file.as_file().sync_all().map_err(write_error)?;
    file.persist(path).map_err(|e| write_error(e.error))?;

    Ok(())
}
