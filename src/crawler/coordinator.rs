//! Crawl coordinator - main ingestion orchestration logic
//!
//! This module drives one ingestion run:
//! - Resetting the record store
//! - Fetching every category listing concurrently
//! - Resolving categories one after another in configuration order, so a
//!   profile listed under several categories is always stored under the
//!   first one
//! - Writing each record through to the store as it is produced
//! - Collecting per-entry and per-category errors without aborting
//! - Exporting the final snapshot, even after a cancellation

use crate::config::{CategorySource, Config};
use crate::crawler::category::{CategoryCrawler, EntryOutcome, Listing, SkippedEntry};
use crate::output::{ExportedFile, Exporter};
use crate::record::{Category, FacultyRecord};
use crate::storage::{self, SharedStore, StorageResult};
use crate::{FetchError, IngestError};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use futures::StreamExt;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// One error recorded during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunError {
    pub category: Category,
    pub url: Option<String>,
    pub name: Option<String>,
    pub message: String,
}

impl RunError {
    fn from_skipped(category: Category, skipped: SkippedEntry) -> Self {
        Self {
            category,
            url: skipped.profile_url,
            name: skipped.name,
            message: skipped.error.to_string(),
        }
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.category)?;
        if let Some(name) = &self.name {
            write!(f, " {}", name)?;
        }
        if let Some(url) = &self.url {
            write!(f, " <{}>", url)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Per-category counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryReport {
    pub category: Category,
    pub listing_url: String,

    /// Entries found on the listing, including rejected ones
    pub entries_seen: usize,
    pub records_written: usize,
    pub duplicates: usize,
    pub errors: usize,

    /// Entries left unresolved because the run was cancelled
    pub cancelled: usize,

    /// The listing page itself could not be fetched
    pub listing_failed: bool,
}

impl CategoryReport {
    fn new(source: &CategorySource) -> Self {
        Self {
            category: source.category,
            listing_url: source.url.clone(),
            entries_seen: 0,
            records_written: 0,
            duplicates: 0,
            errors: 0,
            cancelled: 0,
            listing_failed: false,
        }
    }
}

/// Outcome of one ingestion run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub records_written: usize,
    pub duplicates_skipped: usize,
    pub errors: Vec<RunError>,

    /// One report per configured source, in configuration order
    pub categories: Vec<CategoryReport>,

    /// True if cancellation was requested before the crawl finished
    pub cancelled: bool,

    pub exports: Vec<ExportedFile>,
    pub config_hash: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn report(&self, category: Category) -> Option<&CategoryReport> {
        self.categories.iter().find(|r| r.category == category)
    }
}

/// Main ingestion coordinator
pub struct Coordinator {
    config: Arc<Config>,
    store: SharedStore,
    crawler: CategoryCrawler,
    exporter: Exporter,
    config_hash: Option<String>,
}

impl Coordinator {
    /// Creates a coordinator backed by the configured SQLite database
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(IngestError)` - The database or HTTP client could not be set up
    pub fn new(config: Config) -> Result<Self, IngestError> {
        let store = storage::open_shared(Path::new(&config.output.database_path))?;
        Self::with_store(config, store)
    }

    /// Creates a coordinator over an already opened store
    pub fn with_store(config: Config, store: SharedStore) -> Result<Self, IngestError> {
        let crawler = CategoryCrawler::from_config(&config)?;
        let exporter = Exporter::from_config(&config.output);

        Ok(Self {
            config: Arc::new(config),
            store,
            crawler,
            exporter,
            config_hash: None,
        })
    }

    /// Records the hash of the configuration file in run summaries
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Runs a full ingestion: reset, crawl all categories, export
    ///
    /// Category and entry failures are collected into the summary. Storage
    /// and export failures abort the run.
    ///
    /// After `cancel` fires no new fetch is started, entries already parsed
    /// from listings are still persisted when they need no fetch, and the
    /// export runs over whatever the store holds.
    pub async fn run(&self, cancel: CancellationToken) -> Result<RunSummary, IngestError> {
        let started_at = Utc::now();

        storage::lock(&self.store)?.reset()?;
        tracing::info!(
            "Starting ingestion of {} categories ({} deep-fetched)",
            self.config.sources.len(),
            self.config
                .sources
                .iter()
                .filter(|s| self.crawler.deep_fetches(s.category))
                .count()
        );

        let listings = join_all(
            self.config
                .sources
                .iter()
                .map(|source| self.fetch_listing(source, &cancel)),
        )
        .await;

        let mut results = Vec::with_capacity(listings.len());
        for (source, listing) in self.config.sources.iter().zip(listings) {
            results.push(self.crawl_source(source, listing, &cancel).await?);
        }

        let mut summary = RunSummary {
            records_written: 0,
            duplicates_skipped: 0,
            errors: Vec::new(),
            categories: Vec::with_capacity(results.len()),
            cancelled: cancel.is_cancelled(),
            exports: Vec::new(),
            config_hash: self.config_hash.clone(),
            started_at,
            finished_at: started_at,
        };

        for (report, errors) in results {
            summary.records_written += report.records_written;
            summary.duplicates_skipped += report.duplicates;
            summary.errors.extend(errors);
            summary.categories.push(report);
        }

        if summary.cancelled {
            tracing::warn!("Run cancelled, exporting partial results");
        }

        summary.exports = self.export()?;
        summary.finished_at = Utc::now();

        tracing::info!(
            "Ingestion completed: {} records, {} duplicates, {} errors in {}s",
            summary.records_written,
            summary.duplicates_skipped,
            summary.errors.len(),
            (summary.finished_at - started_at).num_seconds()
        );

        Ok(summary)
    }

    /// Exports the store's current contents without crawling
    pub fn export(&self) -> Result<Vec<ExportedFile>, IngestError> {
        let store = storage::lock(&self.store)?;
        Ok(self.exporter.export(&*store)?)
    }

    /// Fetches one listing unless the run is already cancelled
    async fn fetch_listing(
        &self,
        source: &CategorySource,
        cancel: &CancellationToken,
    ) -> Option<Result<Listing, FetchError>> {
        if cancel.is_cancelled() {
            return None;
        }
        Some(self.crawler.fetch_listing(source).await)
    }

    /// Resolves one category's entries and writes its records through to the
    /// store
    async fn crawl_source(
        &self,
        source: &CategorySource,
        listing: Option<Result<Listing, FetchError>>,
        cancel: &CancellationToken,
    ) -> StorageResult<(CategoryReport, Vec<RunError>)> {
        let category = source.category;
        let mut report = CategoryReport::new(source);
        let mut errors = Vec::new();

        let listing = match listing {
            Some(Ok(listing)) => listing,
            None => {
                tracing::info!("{}: run cancelled before listing fetch", category);
                return Ok((report, errors));
            }
            Some(Err(e)) => {
                tracing::error!("{}: listing failed: {}", category, e);
                report.listing_failed = true;
                report.errors += 1;
                errors.push(RunError {
                    category,
                    url: Some(e.url().to_string()),
                    name: None,
                    message: e.to_string(),
                });
                return Ok((report, errors));
            }
        };

        let mut outcomes = std::pin::pin!(self.crawler.resolve_entries(listing, cancel));
        while let Some(outcome) = outcomes.next().await {
            report.entries_seen += 1;

            match outcome {
                EntryOutcome::Extracted(record) => {
                    if self.persist(&record)? {
                        report.records_written += 1;
                        tracing::debug!("Saved {} ({})", record.name, record.profile_url);
                    } else {
                        report.duplicates += 1;
                        tracing::debug!("Duplicate profile {} skipped", record.profile_url);
                    }
                }
                EntryOutcome::Skipped(skipped) => {
                    report.errors += 1;
                    errors.push(RunError::from_skipped(category, skipped));
                }
                EntryOutcome::Cancelled { .. } => report.cancelled += 1,
            }
        }

        tracing::info!(
            "{}: {} written, {} duplicates, {} errors",
            category,
            report.records_written,
            report.duplicates,
            report.errors
        );

        Ok((report, errors))
    }

    fn persist(&self, record: &FacultyRecord) -> StorageResult<bool> {
        storage::lock(&self.store)?.insert_if_absent(record)
    }
}

/// Runs a complete ingestion with the given configuration
///
/// # Example
///
/// ```no_run
/// use faculty_ingest::config::load_config;
/// use faculty_ingest::crawler::run_crawl;
/// use std::path::Path;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let summary = run_crawl(config, CancellationToken::new()).await?;
/// println!("{} records", summary.records_written);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, cancel: CancellationToken) -> Result<RunSummary, IngestError> {
    Coordinator::new(config)?.run(cancel).await
}
