//! Faculty-Ingest main entry point
//!
//! This is the command-line interface for the faculty directory ingestion
//! pipeline.

use anyhow::Context;
use clap::Parser;
use faculty_ingest::config::{load_config_with_hash, Config};
use faculty_ingest::crawler::Coordinator;
use faculty_ingest::output::{load_statistics, print_run_summary, print_statistics, Exporter};
use faculty_ingest::storage::SqliteStorage;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Faculty-Ingest: a faculty directory to dataset pipeline
///
/// Crawls the category listings of a faculty directory, extracts one record
/// per person, stores them in SQLite and exports CSV and JSON snapshots.
#[derive(Parser, Debug)]
#[command(name = "faculty-ingest")]
#[command(version = "1.0.0")]
#[command(about = "Faculty directory ingestion pipeline", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with_all = ["stats", "export_only"])]
    dry_run: bool,

    /// Show record statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_only"])]
    stats: bool,

    /// Re-export the existing database without crawling
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    export_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.export_only {
        handle_export_only(&config)?;
    } else {
        handle_crawl(config, config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("faculty_ingest=info,warn"),
            1 => EnvFilter::new("faculty_ingest=debug,info"),
            2 => EnvFilter::new("faculty_ingest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Faculty-Ingest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max attempts: {}", config.crawler.max_attempts);
    println!(
        "  Retry backoff: {}ms (x{})",
        config.crawler.retry_backoff_ms, config.crawler.backoff_multiplier
    );
    println!(
        "  Timeouts: {}s request, {}s connect",
        config.crawler.request_timeout_secs, config.crawler.connect_timeout_secs
    );
    println!("  Worker pool: {}", config.crawler.worker_pool_size);
    println!(
        "  Inter-request delay: {}ms",
        config.crawler.inter_request_delay_ms
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  CSV: {}", config.output.csv_path);
    println!("  JSON: {}", config.output.json_path);

    println!("\nSources ({}):", config.sources.len());
    for source in &config.sources {
        let mode = if config.crawler.deep_fetches(source.category) {
            "listing + profiles"
        } else {
            "listing only"
        };
        println!("  - {}: {} ({})", source.category, source.url, mode);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_existing(&config.output.database_path)?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --export-only mode: rewrites the export files from the database
fn handle_export_only(config: &Config) -> anyhow::Result<()> {
    println!("=== Exporting Records ===\n");

    let storage = open_existing(&config.output.database_path)?;
    let files = Exporter::from_config(&config.output).export(&storage)?;

    for file in files {
        println!(
            "✓ {} records exported to: {} (sha256 {})",
            file.records,
            file.path.display(),
            file.sha256
        );
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: String) -> anyhow::Result<()> {
    tracing::info!(
        "Sources: {}, deep-fetched: {:?}",
        config.sources.len(),
        config.crawler.deep_fetch_categories
    );

    let coordinator = Coordinator::new(config)?.with_config_hash(config_hash);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight fetches");
            on_interrupt.cancel();
        }
    });

    match coordinator.run(cancel).await {
        Ok(summary) => {
            tracing::info!("Ingestion completed successfully");
            print_run_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Ingestion failed: {}", e);
            Err(e.into())
        }
    }
}

/// Opens a database that must already exist
fn open_existing(path: &str) -> anyhow::Result<SqliteStorage> {
    let path = Path::new(path);
    if !path.exists() {
        anyhow::bail!("Database {} does not exist; run a crawl first", path.display());
    }

    SqliteStorage::new(path).with_context(|| format!("Failed to open {}", path.display()))
}
