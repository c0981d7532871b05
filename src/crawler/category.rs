//! Per-category crawling
//!
//! Fetches one category's listing page and turns its entries into records,
//! fetching profile pages for categories on the deep-fetch list. Entries are
//! yielded lazily as a stream so the caller can persist each record as soon
//! as it is resolved.

use crate::config::{CategorySource, Config};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::listing::{ListingEntry, ListingParser, ParsedListing, RejectedEntry};
use crate::crawler::scheduler::Scheduler;
use crate::crawler::sections::SectionExtractor;
use crate::record::{Category, FacultyRecord};
use crate::{ExtractionError, FetchError};
use futures::stream::{self, BoxStream, Stream, StreamExt};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Why one listing entry produced no record
#[derive(Debug, Error)]
pub enum EntryError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// An entry that was skipped, with whatever identified it
#[derive(Debug)]
pub struct SkippedEntry {
    pub name: Option<String>,
    pub profile_url: Option<String>,
    pub error: EntryError,
}

impl From<RejectedEntry> for SkippedEntry {
    fn from(rejected: RejectedEntry) -> Self {
        Self {
            name: rejected.name,
            profile_url: None,
            error: rejected.error.into(),
        }
    }
}

/// What became of one listing entry
#[derive(Debug)]
pub enum EntryOutcome {
    /// A record ready to persist
    Extracted(FacultyRecord),

    /// The entry was dropped; the crawl continues
    Skipped(SkippedEntry),

    /// The entry needed a profile fetch and the run was cancelled first
    Cancelled { name: String },
}

/// A fetched and parsed listing page
#[derive(Debug)]
pub struct Listing {
    pub category: Category,

    /// Final listing URL after redirects
    pub url: Url,

    pub parsed: ParsedListing,
}

/// Crawls category listings and resolves their entries
pub struct CategoryCrawler {
    fetcher: Fetcher,
    parser: ListingParser,
    extractor: SectionExtractor,
    scheduler: Scheduler,
    deep_fetch: Vec<Category>,
}

impl CategoryCrawler {
    pub fn new(
        fetcher: Fetcher,
        parser: ListingParser,
        extractor: SectionExtractor,
        scheduler: Scheduler,
        deep_fetch: Vec<Category>,
    ) -> Self {
        Self {
            fetcher,
            parser,
            extractor,
            scheduler,
            deep_fetch,
        }
    }

    /// Builds a crawler with default parsing rules for the configured sources
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let fetcher = Fetcher::from_config(&config.user_agent, &config.crawler)?;
        let scheduler = Scheduler::new(
            &config.crawler,
            config.sources.iter().map(|source| source.category),
        );

        Ok(Self::new(
            fetcher,
            ListingParser::default(),
            SectionExtractor::default(),
            scheduler,
            config.crawler.deep_fetch_categories.clone(),
        ))
    }

    pub fn deep_fetches(&self, category: Category) -> bool {
        self.deep_fetch.contains(&category)
    }

    /// Fetches and parses a category's listing page
    ///
    /// A listing that cannot be fetched fails the whole category.
    pub async fn fetch_listing(&self, source: &CategorySource) -> Result<Listing, FetchError> {
        let url = Url::parse(&source.url).map_err(|e| FetchError::InvalidUrl {
            url: source.url.clone(),
            reason: e.to_string(),
        })?;

        let page = self.fetcher.fetch(&url).await?;
        let parsed = self.parser.parse(&page.body, &page.url);

        match &parsed.strategy {
            Some(strategy) => tracing::info!(
                "{}: {} entries on listing ({} via {})",
                source.category,
                parsed.entries.len(),
                page.url,
                strategy
            ),
            None => tracing::warn!(
                "{}: no entries recognized on listing {}",
                source.category,
                page.url
            ),
        }

        Ok(Listing {
            category: source.category,
            url: page.url,
            parsed,
        })
    }

    /// Resolves a listing's entries, in listing order
    ///
    /// Up to the scheduler's pool size of entries are resolved concurrently.
    /// Once `cancel` fires no new profile fetch starts; entries that need no
    /// fetch are still yielded.
    pub fn resolve_entries<'a>(
        &'a self,
        listing: Listing,
        cancel: &'a CancellationToken,
    ) -> impl Stream<Item = EntryOutcome> + 'a {
        let category = listing.category;
        let deep = self.deep_fetches(category);

        stream::iter(listing.parsed.entries)
            .map(move |entry| async move {
                match entry {
                    Ok(entry) => self.resolve_entry(category, entry, deep, cancel).await,
                    Err(rejected) => {
                        tracing::warn!(
                            "{}: skipping entry #{} ({})",
                            category,
                            rejected.position + 1,
                            rejected.error
                        );
                        EntryOutcome::Skipped(rejected.into())
                    }
                }
            })
            .buffered(self.scheduler.pool_size())
    }

    /// Fetches the listing and yields one outcome per entry
    pub async fn crawl<'a>(
        &'a self,
        source: &CategorySource,
        cancel: &'a CancellationToken,
    ) -> Result<BoxStream<'a, EntryOutcome>, FetchError> {
        let listing = self.fetch_listing(source).await?;
        Ok(self.resolve_entries(listing, cancel).boxed())
    }

    async fn resolve_entry(
        &self,
        category: Category,
        entry: ListingEntry,
        deep: bool,
        cancel: &CancellationToken,
    ) -> EntryOutcome {
        if !deep {
            return EntryOutcome::Extracted(entry.into_record(category));
        }

        let name = entry.name.clone();
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            permit = self.scheduler.acquire(category) => permit,
        };

        let Some(_permit) = permit.filter(|_| !cancel.is_cancelled()) else {
            tracing::debug!("{}: not fetching profile of {}, run cancelled", category, name);
            return EntryOutcome::Cancelled { name };
        };

        let profile_url = entry.profile_url.clone();
        match self.fetcher.fetch(&profile_url).await {
            Ok(page) => {
                let sections = self.extractor.extract_html(&page.body);
                if sections.is_empty() {
                    tracing::debug!("No sections found on {}", profile_url);
                }

                let mut record = entry.into_record(category);
                record.biography = sections.biography;
                // A listing-level specialization wins over the profile's
                record.specialization = record.specialization.or(sections.specialization);
                record.publications = sections.publications;
                record.teaching = sections.teaching;
                record.research = sections.research;

                EntryOutcome::Extracted(record)
            }
            Err(e) => {
                tracing::warn!("{}: skipping {}: {}", category, name, e);
                EntryOutcome::Skipped(SkippedEntry {
                    name: Some(name),
                    profile_url: Some(profile_url.to_string()),
                    error: e.into(),
                })
            }
        }
    }
}
