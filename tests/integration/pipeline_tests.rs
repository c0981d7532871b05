//! End-to-end crawl, store and export behavior

use crate::common::*;
use faculty_ingest::crawler::Coordinator;
use faculty_ingest::storage::{self, RecordStore, SqliteStorage};
use faculty_ingest::{Category, FacultyRecord};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::MockServer;

fn sorted(mut records: Vec<FacultyRecord>) -> Vec<FacultyRecord> {
    records.sort_by(|a, b| a.profile_url.cmp(&b.profile_url));
    records
}

#[tokio::test]
async fn test_full_ingest_with_deep_fetch() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/faculty",
        200,
        &listing_html(&[person("Ada Lovelace", "/people/ada"), person("Alan Turing", "/people/alan")]),
    )
    .await;
    mount_page(
        &server,
        "/adjunct",
        200,
        &listing_html(&[person("Grace Hopper", "/people/grace")]),
    )
    .await;
    mount_page(
        &server,
        "/people/ada",
        200,
        &profile_html(&[
            ("Biography", "Wrote the first published algorithm."),
            ("Specialization", "Analytical engines"),
            ("Publications", "Notes on the engine."),
        ]),
    )
    .await;
    mount_page(
        &server,
        "/people/alan",
        200,
        &profile_html(&[("Research Interests", "Computability and morphogenesis.")]),
    )
    .await;

    let config = create_test_config(
        &server,
        &dir,
        &[(Category::Regular, "/faculty"), (Category::Adjunct, "/adjunct")],
        &[Category::Regular],
    );
    let coordinator = Coordinator::new(config.clone()).unwrap();
    let summary = coordinator.run(CancellationToken::new()).await.unwrap();

    assert_eq!(summary.records_written, 3);
    assert!(summary.errors.is_empty());
    assert_eq!(hits(&server, "/people/grace").await, 0);

    let store = storage::lock(coordinator.store()).unwrap();
    let ada = store
        .get_by_url(&format!("{}/people/ada", server.uri()))
        .unwrap()
        .unwrap();
    assert_eq!(ada.name, "Ada Lovelace");
    assert_eq!(ada.email, "ada.lovelace@example.edu");
    assert_eq!(ada.designation, "PhD");
    assert_eq!(ada.biography.as_deref(), Some("Wrote the first published algorithm."));
    assert_eq!(ada.specialization.as_deref(), Some("Analytical engines"));
    assert_eq!(ada.publications.as_deref(), Some("Notes on the engine."));
    assert!(ada.teaching.is_none());

    let grace = store
        .get_by_url(&format!("{}/people/grace", server.uri()))
        .unwrap()
        .unwrap();
    assert_eq!(grace.category, Category::Adjunct);
    assert!(grace.biography.is_none());

    let rows = read_json_export(&config);
    assert_eq!(rows.len(), 3);
    let ada_row = rows
        .iter()
        .find(|r| r["name"] == "Ada Lovelace")
        .unwrap();
    assert_eq!(
        ada_row["search_text"],
        "Ada Lovelace | Regular | Analytical engines | Wrote the first published algorithm."
    );
}

#[tokio::test]
async fn test_rerun_yields_identical_store() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/faculty",
        200,
        &listing_html(&[person("One", "/p/1"), person("Two", "/p/2"), person("Three", "/p/3")]),
    )
    .await;
    mount_page(&server, "/adjunct", 200, &listing_html(&[person("Four", "/p/4")])).await;
    for p in ["/p/1", "/p/2", "/p/3"] {
        mount_page(&server, p, 200, &profile_html(&[("Teaching", "Algorithms and data.")])).await;
    }

    let config = create_test_config(
        &server,
        &dir,
        &[(Category::Regular, "/faculty"), (Category::Adjunct, "/adjunct")],
        &[Category::Regular],
    );

    let first = Coordinator::new(config.clone())
        .unwrap()
        .run(CancellationToken::new())
        .await
        .unwrap();
    let after_first = sorted(
        SqliteStorage::new(Path::new(&config.output.database_path))
            .unwrap()
            .read_all()
            .unwrap(),
    );

    let second = Coordinator::new(config.clone())
        .unwrap()
        .run(CancellationToken::new())
        .await
        .unwrap();
    let after_second = sorted(
        SqliteStorage::new(Path::new(&config.output.database_path))
            .unwrap()
            .read_all()
            .unwrap(),
    );

    assert_eq!(first.records_written, 4);
    assert_eq!(second.records_written, 4);
    assert_eq!(second.duplicates_skipped, 0);
    assert_eq!(after_first, after_second);
}

#[tokio::test]
async fn test_single_category_rerun_exports_same_bytes() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/faculty",
        200,
        &listing_html(&[person("One", "/p/1"), person("Two", "/p/2")]),
    )
    .await;

    let config = create_test_config(&server, &dir, &[(Category::Regular, "/faculty")], &[]);

    let first = Coordinator::new(config.clone())
        .unwrap()
        .run(CancellationToken::new())
        .await
        .unwrap();
    let second = Coordinator::new(config.clone())
        .unwrap()
        .run(CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(first.exports, second.exports);
}

#[tokio::test]
async fn test_shared_profile_is_stored_once() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    // The same person appears in three listings and twice in one of them
    let shared = listing_html(&[person("Shared", "/p/shared"), person("Shared", "/p/shared")]);
    mount_page(&server, "/faculty", 200, &shared).await;
    mount_page(&server, "/adjunct", 200, &shared).await;
    mount_page(&server, "/distinguished", 200, &shared).await;
    mount_page(&server, "/p/shared", 200, &profile_html(&[("Biography", "Shared person.")])).await;

    let config = create_test_config(
        &server,
        &dir,
        &[
            (Category::Regular, "/faculty"),
            (Category::Adjunct, "/adjunct"),
            (Category::Distinguished, "/distinguished"),
        ],
        &[Category::Regular, Category::Adjunct, Category::Distinguished],
    );
    let coordinator = Coordinator::new(config.clone()).unwrap();
    let summary = coordinator.run(CancellationToken::new()).await.unwrap();

    assert_eq!(summary.records_written, 1);
    assert_eq!(summary.duplicates_skipped, 5);
    assert_eq!(
        storage::lock(coordinator.store()).unwrap().count_records().unwrap(),
        1
    );
    assert_eq!(read_csv_export(&config).len(), 1);

    let stored = storage::lock(coordinator.store()).unwrap().read_all().unwrap();
    assert_eq!(stored[0].category, Category::Regular);
}

#[tokio::test]
async fn test_first_configured_category_owns_shared_profile() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let shared = listing_html(&[person("Shared", "/p/shared")]);
    mount_page(&server, "/faculty", 200, &shared).await;
    mount_page(&server, "/adjunct", 200, &shared).await;
    mount_slow_page(
        &server,
        "/p/shared",
        &profile_html(&[("Biography", "Full profile.")]),
        Duration::from_millis(100),
    )
    .await;

    // Only Regular is deep-fetched, so its record is the slower one to build
    let config = create_test_config(
        &server,
        &dir,
        &[(Category::Regular, "/faculty"), (Category::Adjunct, "/adjunct")],
        &[Category::Regular],
    );
    let url = format!("{}/p/shared", server.uri());

    for _ in 0..2 {
        let coordinator = Coordinator::new(config.clone()).unwrap();
        let summary = coordinator.run(CancellationToken::new()).await.unwrap();
        assert_eq!(summary.records_written, 1);
        assert_eq!(summary.report(Category::Adjunct).unwrap().duplicates, 1);

        let stored = storage::lock(coordinator.store())
            .unwrap()
            .get_by_url(&url)
            .unwrap()
            .unwrap();
        assert_eq!(stored.category, Category::Regular);
        assert_eq!(stored.biography.as_deref(), Some("Full profile."));
    }
}

#[tokio::test]
async fn test_profile_extraction_is_deterministic() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/faculty", 200, &listing_html(&[person("Ada", "/p/ada")])).await;
    mount_page(
        &server,
        "/p/ada",
        200,
        &profile_html(&[
            ("Biography and Research", "Some text here."),
            ("Teaching", "x"),
            ("Teaching", "Compilers."),
        ]),
    )
    .await;

    let config = create_test_config(
        &server,
        &dir,
        &[(Category::Regular, "/faculty")],
        &[Category::Regular],
    );

    let mut records = Vec::new();
    for _ in 0..2 {
        let coordinator = Coordinator::new(config.clone()).unwrap();
        coordinator.run(CancellationToken::new()).await.unwrap();
        records.push(storage::lock(coordinator.store()).unwrap().read_all().unwrap());
    }

    assert_eq!(records[0], records[1]);
    let ada = &records[0][0];
    // Biography outranks research when one header names both
    assert_eq!(ada.biography.as_deref(), Some("Some text here."));
    assert!(ada.research.is_none());
    // The one-character line is noise
    assert_eq!(ada.teaching.as_deref(), Some("Compilers."));
}

#[tokio::test]
async fn test_entry_without_link_is_isolated() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let people = [
        person("One", "/p/1"),
        person("Two", "/p/2"),
        crate::common::Person {
            name: "Three",
            href: None,
        },
        person("Four", "/p/4"),
        person("Five", "/p/5"),
    ];
    mount_page(&server, "/faculty", 200, &listing_html(&people)).await;

    let config = create_test_config(&server, &dir, &[(Category::Regular, "/faculty")], &[]);
    let summary = Coordinator::new(config.clone())
        .unwrap()
        .run(CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.records_written, 4);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].category, Category::Regular);

    let report = summary.report(Category::Regular).unwrap();
    assert_eq!(report.entries_seen, 5);
    assert_eq!(report.errors, 1);

    let names: Vec<String> = read_json_export(&config)
        .iter()
        .map(|r| r["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["One", "Two", "Four", "Five"]);
}

#[tokio::test]
async fn test_listing_specialization_wins() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let listing = r#"<html><body><ul><li>
        <div class="personalDetail"><h3><a href="/p/ada">Ada</a></h3></div>
        <div class="areaSpecialization">Listing Topic</div>
    </li></ul></body></html>"#;
    mount_page(&server, "/faculty", 200, listing).await;
    mount_page(
        &server,
        "/p/ada",
        200,
        &profile_html(&[("Specialization", "Profile Topic"), ("Biography", "Bio text.")]),
    )
    .await;

    let config = create_test_config(
        &server,
        &dir,
        &[(Category::Regular, "/faculty")],
        &[Category::Regular],
    );
    let coordinator = Coordinator::new(config).unwrap();
    coordinator.run(CancellationToken::new()).await.unwrap();

    let records = storage::lock(coordinator.store()).unwrap().read_all().unwrap();
    assert_eq!(records[0].specialization.as_deref(), Some("Listing Topic"));
    assert_eq!(records[0].biography.as_deref(), Some("Bio text."));
}

#[tokio::test]
async fn test_export_only_rewrites_from_existing_store() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_page(&server, "/faculty", 200, &listing_html(&[person("Ada", "/p/ada")])).await;

    let config = create_test_config(&server, &dir, &[(Category::Regular, "/faculty")], &[]);
    Coordinator::new(config.clone())
        .unwrap()
        .run(CancellationToken::new())
        .await
        .unwrap();

    std::fs::remove_file(csv_path(&config)).unwrap();
    std::fs::remove_file(json_path(&config)).unwrap();

    let files = Coordinator::new(config.clone()).unwrap().export().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(read_csv_export(&config).len(), 1);
    assert_eq!(read_json_export(&config).len(), 1);
    // Export alone makes no requests
    assert_eq!(hits(&server, "/faculty").await, 1);
}
