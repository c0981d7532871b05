//! Shared fixtures for integration tests

#![allow(dead_code)]

use faculty_ingest::config::{CategorySource, Config, CrawlerConfig, OutputConfig, UserAgentConfig};
use faculty_ingest::Category;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// One person on a mocked listing page
pub struct Person<'a> {
    pub name: &'a str,
    /// None renders an entry without a profile link
    pub href: Option<&'a str>,
}

pub fn person<'a>(name: &'a str, href: &'a str) -> Person<'a> {
    Person {
        name,
        href: Some(href),
    }
}

/// Renders a listing page in the `div.personalDetails` layout
pub fn listing_html(people: &[Person<'_>]) -> String {
    let entries: String = people
        .iter()
        .map(|p| {
            let heading = match p.href {
                Some(href) => format!(r#"<h3><a href="{}">{}</a></h3>"#, href, p.name),
                None => format!("<h3>{}</h3>", p.name),
            };
            format!(
                r#"<div class="personalDetails">{}
                     <div class="facultyEducation">PhD</div>
                     <div class="contactDetails">{}[at]example[dot]edu</div>
                   </div>"#,
                heading,
                p.name.to_lowercase().replace(' ', ".")
            )
        })
        .collect();

    format!("<html><body><div class=\"view-content\">{}</div></body></html>", entries)
}

/// Renders a profile page with the given header/prose pairs
pub fn profile_html(sections: &[(&str, &str)]) -> String {
    let body: String = sections
        .iter()
        .map(|(header, prose)| format!("<h3>{}</h3>\n<p>{}</p>\n", header, prose))
        .collect();

    format!(
        "<html><body><nav>Research Home</nav><div class=\"region-content\">{}</div></body></html>",
        body
    )
}

pub async fn mount_page(server: &MockServer, p: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(p))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

pub async fn mount_slow_page(server: &MockServer, p: &str, body: &str, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(p))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// Number of requests the server received for one path
pub async fn hits(server: &MockServer, p: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == p)
        .count()
}

/// Creates a test configuration whose outputs live in `dir`
///
/// `sources` pairs each category with a path on the mock server.
pub fn create_test_config(
    server: &MockServer,
    dir: &TempDir,
    sources: &[(Category, &str)],
    deep: &[Category],
) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_attempts: 3,
            retry_backoff_ms: 1,
            backoff_multiplier: 1.0,
            request_timeout_secs: 5,
            connect_timeout_secs: 5,
            worker_pool_size: 4,
            inter_request_delay_ms: 0,
            deep_fetch_categories: deep.to_vec(),
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            database_path: path_in(dir, "faculty.db"),
            csv_path: path_in(dir, "faculty.csv"),
            json_path: path_in(dir, "faculty.json"),
        },
        sources: sources
            .iter()
            .map(|(category, p)| CategorySource::new(*category, format!("{}{}", server.uri(), p)))
            .collect(),
    }
}

fn path_in(dir: &TempDir, name: &str) -> String {
    dir.path().join(name).display().to_string()
}

pub fn csv_path(config: &Config) -> PathBuf {
    PathBuf::from(&config.output.csv_path)
}

pub fn json_path(config: &Config) -> PathBuf {
    PathBuf::from(&config.output.json_path)
}

/// Parses the JSON export into its rows
pub fn read_json_export(config: &Config) -> Vec<serde_json::Value> {
    let text = std::fs::read_to_string(json_path(config)).unwrap();
    match serde_json::from_str::<serde_json::Value>(&text).unwrap() {
        serde_json::Value::Array(rows) => rows,
        other => panic!("expected a JSON array, got {}", other),
    }
}

/// Parses the CSV export into rows keyed by header
pub fn read_csv_export(config: &Config) -> Vec<std::collections::HashMap<String, String>> {
    let mut reader = csv::Reader::from_path(csv_path(config)).unwrap();
    reader
        .deserialize()
        .map(|row| row.unwrap())
        .collect()
}
