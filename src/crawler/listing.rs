//! Listing page parser
//!
//! A listing page enumerates the people of one category, one repeated block
//! per person. Categories use different markup for these blocks, so blocks
//! are located by an ordered chain of strategies: the first strategy that
//! finds at least one block wins. Each block is then mined for:
//! - The primary link (`h3 a[href]`), giving the name and profile URL
//! - An email address from the contact sub-block, de-obfuscated
//! - The designation line
//! - A listing-level specialization, when the category shows one

use crate::record::{Category, FacultyRecord, UNKNOWN};
use crate::ExtractionError;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use url::Url;

/// Block selectors tried in order
const DEFAULT_ENTRY_SELECTORS: [&str; 3] =
    ["div.personalDetail", "div.personalDetails", "div.views-row"];

const LINK_SELECTOR: &str = "h3 a[href]";
const CONTACT_SELECTORS: [&str; 2] = ["span.facultyemail", "div.contactDetails"];
const DESIGNATION_SELECTOR: &str = "div.facultyEducation";
const SPECIALIZATION_SELECTOR: &str = "div.areaSpecialization";

/// One way of locating entry blocks in a listing document
pub trait EntryStrategy: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Returns every entry block this strategy recognizes
    fn locate<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>>;
}

/// Locates entry blocks with a CSS selector
pub struct SelectorStrategy {
    css: String,
    selector: Selector,
}

impl SelectorStrategy {
    /// Returns None if `css` is not a valid selector
    pub fn new(css: &str) -> Option<Self> {
        let selector = Selector::parse(css).ok()?;
        Some(Self {
            css: css.to_string(),
            selector,
        })
    }
}

impl EntryStrategy for SelectorStrategy {
    fn name(&self) -> &str {
        &self.css
    }

    fn locate<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        document.select(&self.selector).collect()
    }
}

/// Fields mined from one listing block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub profile_url: Url,
    pub email: String,
    pub designation: String,
    /// Specialization shown on the listing itself, if any
    pub specialization: Option<String>,
}

impl ListingEntry {
    /// Builds a record carrying only listing-level fields
    pub fn into_record(self, category: Category) -> FacultyRecord {
        let mut record = FacultyRecord::new(self.profile_url.as_str(), self.name, category);
        record.email = self.email;
        record.designation = self.designation;
        record.specialization = self.specialization;
        record
    }
}

/// A listing block that could not be turned into an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedEntry {
    /// Position of the block in the listing (0-based)
    pub position: usize,

    /// Name, if it was resolved before the failure
    pub name: Option<String>,

    pub error: ExtractionError,
}

/// Everything parsed out of one listing page
#[derive(Debug, Clone, Default)]
pub struct ParsedListing {
    /// Strategy that located the blocks, None if none matched
    pub strategy: Option<String>,

    /// One result per located block, in document order
    pub entries: Vec<Result<ListingEntry, RejectedEntry>>,
}

impl ParsedListing {
    pub fn accepted(&self) -> usize {
        self.entries.iter().filter(|e| e.is_ok()).count()
    }

    pub fn rejected(&self) -> usize {
        self.entries.len() - self.accepted()
    }
}

/// Parses listing pages with an ordered chain of entry strategies
pub struct ListingParser {
    strategies: Vec<Box<dyn EntryStrategy>>,
}

impl Default for ListingParser {
    fn default() -> Self {
        let strategies = DEFAULT_ENTRY_SELECTORS
            .iter()
            .filter_map(|css| SelectorStrategy::new(css))
            .map(|s| Box::new(s) as Box<dyn EntryStrategy>)
            .collect();
        Self { strategies }
    }
}

impl ListingParser {
    pub fn new(strategies: Vec<Box<dyn EntryStrategy>>) -> Self {
        Self { strategies }
    }

    /// Appends a strategy tried after all existing ones
    pub fn with_strategy(mut self, strategy: Box<dyn EntryStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Parses a listing page
    ///
    /// # Arguments
    ///
    /// * `html` - The listing page content
    /// * `base_url` - The listing's resolved URL, for relative profile links
    pub fn parse(&self, html: &str, base_url: &Url) -> ParsedListing {
        let document = Html::parse_document(html);

        for strategy in &self.strategies {
            let blocks = strategy.locate(&document);
            if blocks.is_empty() {
                tracing::trace!("Strategy {} found no entries", strategy.name());
                continue;
            }

            tracing::debug!(
                "Strategy {} found {} entries on {}",
                strategy.name(),
                blocks.len(),
                base_url
            );

            let entries = blocks
                .into_iter()
                .enumerate()
                .map(|(position, block)| parse_entry(block, base_url, position))
                .collect();

            return ParsedListing {
                strategy: Some(strategy.name().to_string()),
                entries,
            };
        }

        ParsedListing::default()
    }
}

/// Mines one listing block
fn parse_entry(
    block: ElementRef<'_>,
    base_url: &Url,
    position: usize,
) -> Result<ListingEntry, RejectedEntry> {
    let reject = |name: Option<String>, error| RejectedEntry {
        position,
        name,
        error,
    };

    let link = select_first(block, LINK_SELECTOR).ok_or_else(|| reject(None, ExtractionError::MissingLink))?;

    let name = element_text(link);
    if name.is_empty() {
        return Err(reject(None, ExtractionError::MissingName));
    }

    let href = link.value().attr("href").unwrap_or_default();
    let profile_url = resolve_link(href, base_url)
        .map_err(|error| reject(Some(name.clone()), error))?;

    let email = CONTACT_SELECTORS
        .iter()
        .find_map(|css| select_first(block, css))
        .and_then(|contact| find_email(&element_text(contact)))
        .unwrap_or_else(|| UNKNOWN.to_string());

    let designation = select_first(block, DESIGNATION_SELECTOR)
        .map(element_text)
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string());

    Ok(ListingEntry {
        name,
        profile_url,
        email,
        designation,
        specialization: listing_specialization(block),
    })
}

/// Looks for the specialization inside the block, then in its enclosing `li`
fn listing_specialization(block: ElementRef<'_>) -> Option<String> {
    let in_block = select_first(block, SPECIALIZATION_SELECTOR);

    let in_list_item = || {
        block
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "li")
            .and_then(|li| select_first(li, SPECIALIZATION_SELECTOR))
    };

    in_block
        .or_else(in_list_item)
        .map(element_text)
        .filter(|text| !text.is_empty())
}

/// Resolves a profile link against the listing URL
///
/// Rejects empty, fragment-only and non-HTTP(S) links.
fn resolve_link(href: &str, base_url: &Url) -> Result<Url, ExtractionError> {
    let href = href.trim();
    let unresolvable = |reason: &str| ExtractionError::UnresolvableLink {
        href: href.to_string(),
        reason: reason.to_string(),
    };

    if href.is_empty() {
        return Err(ExtractionError::MissingLink);
    }

    if href.starts_with('#') {
        return Err(unresolvable("fragment-only link"));
    }

    let absolute = base_url
        .join(href)
        .map_err(|e| unresolvable(&e.to_string()))?;

    match absolute.scheme() {
        "http" | "https" => Ok(absolute),
        other => Err(unresolvable(&format!("unsupported scheme '{}'", other))),
    }
}

fn select_first<'a>(element: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    element.select(&selector).next()
}

/// Concatenated text of an element with whitespace collapsed
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("Invalid email regex")
    })
}

fn at_token() -> &'static Regex {
    static AT: OnceLock<Regex> = OnceLock::new();
    AT.get_or_init(|| Regex::new(r"(?i)\s*\[\s*at\s*\]\s*").expect("Invalid [at] regex"))
}

fn dot_token() -> &'static Regex {
    static DOT: OnceLock<Regex> = OnceLock::new();
    DOT.get_or_init(|| Regex::new(r"(?i)\s*\[\s*dot\s*\]\s*").expect("Invalid [dot] regex"))
}

/// Replaces `[at]` and `[dot]` tokens with `@` and `.`
pub fn deobfuscate_email(text: &str) -> String {
    let text = at_token().replace_all(text, "@");
    dot_token().replace_all(&text, ".").into_owned()
}

/// Finds the first email-shaped token after de-obfuscation
pub fn find_email(text: &str) -> Option<String> {
    let cleaned = deobfuscate_email(text);
    email_pattern()
        .find(&cleaned)
        .map(|m| m.as_str().to_string())
}
