//! Configuration module for Faculty-Ingest
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. Every resource limit the crawler honors (retry budget, timeouts,
//! worker pool size, politeness delay, deep-fetch allowlist) lives here and
//! is passed explicitly into the coordinator.
//!
//! # Example
//!
//! ```no_run
//! use faculty_ingest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("ingest.toml")).unwrap();
//! println!("Worker pool size: {}", config.crawler.worker_pool_size);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    default_sources, CategorySource, Config, CrawlerConfig, OutputConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
