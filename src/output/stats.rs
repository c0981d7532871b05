//! Statistics generation from the record store
//!
//! This module provides functionality for extracting and displaying
//! per-category record statistics from the storage layer.

use crate::record::Category;
use crate::storage::{RecordStore, StorageResult};
use std::collections::BTreeMap;

/// Record statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStatistics {
    /// Total number of stored records
    pub total_records: u64,

    /// Count of records by category, in category order
    pub records_by_category: BTreeMap<Category, u64>,

    /// Records whose email could not be extracted
    pub unknown_emails: u64,

    /// Records carrying at least one profile section
    pub with_sections: u64,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `store` - The record store to query
pub fn load_statistics(store: &dyn RecordStore) -> StorageResult<IngestStatistics> {
    let total_records = store.count_records()?;
    let records_by_category = store.count_by_category()?.into_iter().collect();

    let mut unknown_emails = 0;
    let mut with_sections = 0;
    for record in store.read_all()? {
        if record.email == crate::record::UNKNOWN {
            unknown_emails += 1;
        }

        let has_section = [
            &record.biography,
            &record.specialization,
            &record.publications,
            &record.teaching,
            &record.research,
        ]
        .iter()
        .any(|section| section.is_some());
        if has_section {
            with_sections += 1;
        }
    }

    Ok(IngestStatistics {
        total_records,
        records_by_category,
        unknown_emails,
        with_sections,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &IngestStatistics) {
    println!("=== Record Statistics ===\n");

    println!("Overview:");
    println!("  Total records: {}", stats.total_records);
    println!("  With profile sections: {}", stats.with_sections);
    println!("  Unknown email: {}", stats.unknown_emails);
    println!();

    println!("Records by Category:");
    for category in Category::all() {
        let count = stats.records_by_category.get(&category).copied().unwrap_or(0);
        let percentage = if stats.total_records > 0 {
            (count as f64 / stats.total_records as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", category, count, percentage);
    }
}
