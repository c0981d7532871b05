//! Integration tests for the ingestion pipeline
//!
//! These tests use wiremock to serve listing and profile pages and run the
//! full crawl, store and export cycle end-to-end.

mod common;
mod pipeline_tests;
mod resilience_tests;
