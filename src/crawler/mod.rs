//! Crawler module for directory fetching and extraction
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - Listing page parsing and profile section extraction
//! - Deep-fetch scheduling and rate limiting
//! - Overall crawl coordination

mod category;
mod coordinator;
mod fetcher;
mod listing;
mod scheduler;
mod sections;

pub use category::{CategoryCrawler, EntryError, EntryOutcome, Listing, SkippedEntry};
pub use coordinator::{run_crawl, CategoryReport, Coordinator, RunError, RunSummary};
pub use fetcher::{build_http_client, Fetcher, RawPage, RetryPolicy};
pub use listing::{
    deobfuscate_email, find_email, EntryStrategy, ListingEntry, ListingParser, ParsedListing,
    RejectedEntry, SelectorStrategy,
};
pub use scheduler::{FetchPermit, Scheduler};
pub use sections::{
    extract_sections, profile_text_lines, HeaderPolicy, ProfileSections, Section,
    SectionExtractor,
};
