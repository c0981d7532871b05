//! Record types produced by the crawler
//!
//! A `FacultyRecord` is built from one listing entry plus, for deep-fetched
//! categories, the sections of that person's profile page.

mod category;

pub use category::Category;

use serde::{Deserialize, Serialize};

/// Sentinel stored when no email or designation could be extracted
pub const UNKNOWN: &str = "Unknown";

/// One person in the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacultyRecord {
    /// Absolute profile URL; unique across the store
    pub profile_url: String,

    /// Display name, never empty
    pub name: String,

    pub category: Category,

    /// Designation or education line from the listing, or `"Unknown"`
    pub designation: String,

    /// Best-effort email, or `"Unknown"`
    pub email: String,

    pub biography: Option<String>,
    pub specialization: Option<String>,
    pub publications: Option<String>,
    pub teaching: Option<String>,
    pub research: Option<String>,
}

impl FacultyRecord {
    /// Creates a record with listing-level fields only
    pub fn new(profile_url: impl Into<String>, name: impl Into<String>, category: Category) -> Self {
        Self {
            profile_url: profile_url.into(),
            name: name.into(),
            category,
            designation: UNKNOWN.to_string(),
            email: UNKNOWN.to_string(),
            biography: None,
            specialization: None,
            publications: None,
            teaching: None,
            research: None,
        }
    }

    /// Derived full-text field consumed by downstream search
    ///
    /// Joins name, category, specialization and biography with `" | "`.
    /// Absent sections contribute an empty string, never the word "null".
    pub fn search_text(&self) -> String {
        [
            self.name.as_str(),
            self.category.label(),
            self.specialization.as_deref().unwrap_or(""),
            self.biography.as_deref().unwrap_or(""),
        ]
        .join(" | ")
    }
}
