//! Failure isolation, retries and cancellation

use crate::common::*;
use faculty_ingest::crawler::Coordinator;
use faculty_ingest::storage;
use faculty_ingest::Category;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_listing_retries_are_exhausted() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/faculty"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;
    mount_page(&server, "/adjunct", 200, &listing_html(&[person("Ada", "/p/ada")])).await;

    let config = create_test_config(
        &server,
        &dir,
        &[(Category::Regular, "/faculty"), (Category::Adjunct, "/adjunct")],
        &[],
    );
    let summary = Coordinator::new(config)
        .unwrap()
        .run(CancellationToken::new())
        .await
        .unwrap();

    let regular = summary.report(Category::Regular).unwrap();
    assert!(regular.listing_failed);
    assert_eq!(regular.entries_seen, 0);
    assert_eq!(summary.records_written, 1);
    assert_eq!(summary.errors.len(), 1);
    assert!(summary.errors[0].message.contains("3 attempts"));
    // Dropping the server verifies exactly three listing requests
}

#[tokio::test]
async fn test_listing_404_is_not_retried() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/faculty"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server, &dir, &[(Category::Regular, "/faculty")], &[]);
    let summary = Coordinator::new(config)
        .unwrap()
        .run(CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.records_written, 0);
    assert!(summary.errors[0].message.contains("404"));
}

#[tokio::test]
async fn test_partial_crawl_export_is_valid() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/faculty",
        200,
        &listing_html(&[person("Ada", "/p/ada"), person("Alan", "/p/alan")]),
    )
    .await;
    mount_page(&server, "/adjunct", 500, "").await;

    let config = create_test_config(
        &server,
        &dir,
        &[(Category::Regular, "/faculty"), (Category::Adjunct, "/adjunct")],
        &[],
    );
    let summary = Coordinator::new(config.clone())
        .unwrap()
        .run(CancellationToken::new())
        .await
        .unwrap();

    assert!(summary.report(Category::Adjunct).unwrap().listing_failed);
    assert_eq!(summary.exports.len(), 2);

    let json_rows = read_json_export(&config);
    assert_eq!(json_rows.len(), 2);
    assert!(json_rows.iter().all(|r| r["category"] == "Regular"));

    let csv_rows = read_csv_export(&config);
    assert_eq!(csv_rows.len(), 2);
    assert!(csv_rows.iter().all(|r| r["category"] == "Regular"));
    assert_eq!(csv_rows[0]["biography"], "");
}

#[tokio::test]
async fn test_failed_profile_skips_only_that_entry() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/faculty",
        200,
        &listing_html(&[person("Ada", "/p/ada"), person("Gone", "/p/gone")]),
    )
    .await;
    mount_page(&server, "/p/ada", 200, &profile_html(&[("Biography", "Present.")])).await;
    mount_page(&server, "/p/gone", 404, "").await;

    let config = create_test_config(
        &server,
        &dir,
        &[(Category::Regular, "/faculty")],
        &[Category::Regular],
    );
    let summary = Coordinator::new(config)
        .unwrap()
        .run(CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.records_written, 1);
    assert_eq!(summary.errors.len(), 1);
    let error = &summary.errors[0];
    assert_eq!(error.name.as_deref(), Some("Gone"));
    assert_eq!(error.url.as_deref(), Some(format!("{}/p/gone", server.uri()).as_str()));
}

#[tokio::test]
async fn test_cancellation_persists_what_needs_no_fetch() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/faculty",
        200,
        &listing_html(&[person("One", "/p/1"), person("Two", "/p/2"), person("Three", "/p/3")]),
    )
    .await;
    mount_page(
        &server,
        "/adjunct",
        200,
        &listing_html(&[person("Four", "/p/4"), person("Five", "/p/5")]),
    )
    .await;
    let profile = profile_html(&[("Biography", "Slow page.")]);
    for p in ["/p/1", "/p/2", "/p/3"] {
        mount_slow_page(&server, p, &profile, Duration::from_millis(400)).await;
    }

    let mut config = create_test_config(
        &server,
        &dir,
        &[(Category::Regular, "/faculty"), (Category::Adjunct, "/adjunct")],
        &[Category::Regular],
    );
    config.crawler.worker_pool_size = 1;

    let coordinator = Coordinator::new(config.clone()).unwrap();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        trigger.cancel();
    });

    let summary = coordinator.run(cancel).await.unwrap();

    assert!(summary.cancelled);
    // The in-flight profile fetch completes; the other two never start
    let regular = summary.report(Category::Regular).unwrap();
    assert_eq!(regular.records_written, 1);
    assert_eq!(regular.cancelled, 2);
    assert_eq!(summary.report(Category::Adjunct).unwrap().records_written, 2);

    let profile_hits = hits(&server, "/p/1").await + hits(&server, "/p/2").await + hits(&server, "/p/3").await;
    assert_eq!(profile_hits, 1);

    // The export reflects the partial store
    assert_eq!(read_json_export(&config).len(), 3);
    assert_eq!(
        storage::lock(coordinator.store()).unwrap().count_records().unwrap(),
        3
    );
}

#[tokio::test]
async fn test_profile_fetches_are_spaced_per_category() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/faculty",
        200,
        &listing_html(&[person("One", "/p/1"), person("Two", "/p/2"), person("Three", "/p/3")]),
    )
    .await;
    for p in ["/p/1", "/p/2", "/p/3"] {
        mount_page(&server, p, 200, &profile_html(&[("Teaching", "Course.")])).await;
    }

    let mut config = create_test_config(
        &server,
        &dir,
        &[(Category::Regular, "/faculty")],
        &[Category::Regular],
    );
    config.crawler.inter_request_delay_ms = 100;

    let start = Instant::now();
    let summary = Coordinator::new(config)
        .unwrap()
        .run(CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.records_written, 3);
    // Three starts need at least two full gaps
    assert!(start.elapsed() >= Duration::from_millis(190));
}
