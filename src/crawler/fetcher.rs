//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client with a proper user agent string
//! - GET requests for listing and profile pages
//! - Bounded retry with backoff for transient failures
//! - Error classification

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::FetchError;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Status codes that are worth retrying
const RETRYABLE_STATUSES: [StatusCode; 4] = [
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// Longest wait between two attempts, whatever the policy computes
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// A fetched page, owned by whoever fetched it and dropped after parsing
#[derive(Debug, Clone)]
pub struct RawPage {
    /// Final URL after redirects; relative links resolve against this
    pub url: Url,

    /// Decoded page body
    pub body: String,
}

/// How many times to try a request and how long to wait in between
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,

    /// Delay before the first retry
    pub base_delay: Duration,

    /// Factor applied to the delay after every retry (1.0 keeps it constant)
    pub multiplier: f64,
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.retry_backoff_ms),
            multiplier: config.backoff_multiplier,
        }
    }

    /// Delay to wait after the given failed attempt (1-based), capped at
    /// [`MAX_RETRY_DELAY`]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);

        Duration::try_from_secs_f64(secs)
            .map(|delay| delay.min(MAX_RETRY_DELAY))
            .unwrap_or(MAX_RETRY_DELAY)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            multiplier: 1.0,
        }
    }
}

/// Outcome of a single attempt
enum Attempt {
    Done(RawPage),
    Retry(String),
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use faculty_ingest::config::{CrawlerConfig, UserAgentConfig};
/// use faculty_ingest::crawler::build_http_client;
///
/// let user_agent = UserAgentConfig {
///     crawler_name: "FacultyIngest".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&user_agent, &CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(crawler.request_timeout())
        .connect_timeout(crawler.connect_timeout())
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Resilient GET client shared by every crawl task
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | 2xx | Return the page |
/// | HTTP 500, 502, 503, 504 | Retry until the attempt budget is spent |
/// | Timeout, connect or request failure | Retry until the attempt budget is spent |
/// | Any other status (4xx included) | Fail immediately |
/// | Unreadable body | Fail immediately |
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    policy: RetryPolicy,
}

impl Fetcher {
    pub fn new(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Builds the client and retry policy from configuration
    pub fn from_config(
        user_agent: &UserAgentConfig,
        crawler: &CrawlerConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = build_http_client(user_agent, crawler)?;
        Ok(Self::new(client, RetryPolicy::from_config(crawler)))
    }

    /// Fetches a page, retrying transient failures
    pub async fn fetch(&self, url: &Url) -> Result<RawPage, FetchError> {
        let mut attempt = 1;

        loop {
            match self.try_once(url).await? {
                Attempt::Done(page) => return Ok(page),
                Attempt::Retry(reason) if attempt >= self.policy.max_attempts => {
                    tracing::warn!("Giving up on {} after {} attempts", url, attempt);
                    return Err(FetchError::Exhausted {
                        url: url.to_string(),
                        attempts: attempt,
                        last: reason,
                    });
                }
                Attempt::Retry(reason) => {
                    let delay = self.policy.delay_after(attempt);
                    tracing::debug!(
                        "Attempt {} for {} failed ({}), retrying in {:?}",
                        attempt,
                        url,
                        reason,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn try_once(&self, url: &Url) -> Result<Attempt, FetchError> {
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) if is_transient(&e) => return Ok(Attempt::Retry(e.to_string())),
            Err(e) => {
                return Err(FetchError::Network {
                    url: url.to_string(),
                    source: e,
                })
            }
        };

        let status = response.status();
        if RETRYABLE_STATUSES.contains(&status) {
            return Ok(Attempt::Retry(format!("HTTP {}", status.as_u16())));
        }

        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        match response.text().await {
            Ok(body) => Ok(Attempt::Done(RawPage {
                url: final_url,
                body,
            })),
            // A body cut off by the timeout counts against the same budget
            Err(e) if e.is_timeout() => Ok(Attempt::Retry(e.to_string())),
            Err(e) => Err(FetchError::Body {
                url: url.to_string(),
                source: e,
            }),
        }
    }
}

/// Classifies transport errors that a later attempt may not hit
fn is_transient(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}
