//! Output module for exports and run reports
//!
//! This module handles:
//! - Exporting store snapshots as CSV and JSON
//! - Atomic replacement of export files
//! - Record statistics for the `--stats` command
//! - Printing run summaries

mod export;
pub mod stats;

pub use export::{write_atomic, ExportError, ExportFormat, ExportResult, ExportedFile, Exporter};
pub use stats::{load_statistics, print_statistics, IngestStatistics};

use crate::crawler::RunSummary;

/// Prints a run summary to stdout
pub fn print_run_summary(summary: &RunSummary) {
    println!("=== Ingestion Summary ===\n");

    if summary.cancelled {
        println!("Run was cancelled; the export holds a partial crawl.\n");
    }

    println!("Records written: {}", summary.records_written);
    println!("Duplicates skipped: {}", summary.duplicates_skipped);
    println!("Errors: {}", summary.errors.len());
    if let Some(hash) = &summary.config_hash {
        println!("Config hash: {}", hash);
    }
    println!(
        "Duration: {:.1}s",
        (summary.finished_at - summary.started_at).num_milliseconds() as f64 / 1000.0
    );
    println!();

    println!("Categories:");
    for report in &summary.categories {
        let status = if report.listing_failed {
            "listing failed"
        } else {
            "ok"
        };
        println!(
            "  {:<22} {:>4} entries, {:>4} written, {:>3} duplicates, {:>3} errors ({})",
            report.category.label(),
            report.entries_seen,
            report.records_written,
            report.duplicates,
            report.errors,
            status
        );
    }

    if !summary.errors.is_empty() {
        println!();
        println!("Errors:");
        for error in &summary.errors {
            println!("  {}", error);
        }
    }

    if !summary.exports.is_empty() {
        println!();
        println!("Exports:");
        for file in &summary.exports {
            println!(
                "  {} ({} records, sha256 {})",
                file.path.display(),
                file.records,
                file.sha256
            );
        }
    }
}
