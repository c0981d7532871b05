use crate::record::Category;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Faculty-Ingest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    /// Category listing pages, crawled in this order
    #[serde(default = "default_sources", rename = "source")]
    pub sources: Vec<CategorySource>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Total attempts per request, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Growth factor applied to the delay after each retry
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Total latency ceiling for one request (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Connection establishment ceiling (seconds)
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Maximum number of profile pages fetched at once, across all categories
    #[serde(default = "default_worker_pool_size")]
    pub worker_pool_size: u32,

    /// Minimum spacing between profile fetches of one category (milliseconds)
    #[serde(default = "default_inter_request_delay_ms")]
    pub inter_request_delay_ms: u64,

    /// Categories whose profile pages are fetched and parsed into sections
    #[serde(default = "default_deep_fetch_categories")]
    pub deep_fetch_categories: Vec<Category>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            worker_pool_size: default_worker_pool_size(),
            inter_request_delay_ms: default_inter_request_delay_ms(),
            deep_fetch_categories: default_deep_fetch_categories(),
        }
    }
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn inter_request_delay(&self) -> Duration {
        Duration::from_millis(self.inter_request_delay_ms)
    }

    /// Returns true if profile pages of this category should be deep-fetched
    pub fn deep_fetches(&self, category: Category) -> bool {
        self.deep_fetch_categories.contains(&category)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite record store
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path of the flat tabular snapshot
    #[serde(rename = "csv-path")]
    pub csv_path: String,

    /// Path of the array-of-objects snapshot
    #[serde(rename = "json-path")]
    pub json_path: String,
}

/// One category listing page
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategorySource {
    pub category: Category,
    pub url: String,
}

impl CategorySource {
    pub fn new(category: Category, url: impl Into<String>) -> Self {
        Self {
            category,
            url: url.into(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_backoff_multiplier() -> f64 {
    1.0
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_worker_pool_size() -> u32 {
    4
}

fn default_inter_request_delay_ms() -> u64 {
    500
}

fn default_deep_fetch_categories() -> Vec<Category> {
    vec![Category::Regular]
}

/// The directory's published listing pages
pub fn default_sources() -> Vec<CategorySource> {
    vec![
        CategorySource::new(Category::Regular, "https://www.daiict.ac.in/faculty"),
        CategorySource::new(
            Category::Adjunct,
            "https://www.daiict.ac.in/adjunct-faculty",
        ),
        CategorySource::new(
            Category::InternationalAdjunct,
            "https://www.daiict.ac.in/adjunct-faculty-international",
        ),
        CategorySource::new(
            Category::ProfessorOfPractice,
            "https://www.daiict.ac.in/professor-practice",
        ),
        CategorySource::new(
            Category::Distinguished,
            "https://www.daiict.ac.in/distinguished-professor",
        ),
    ]
}
