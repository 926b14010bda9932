//! Saramin crawler main entry point
//!
//! This is the command-line interface for filling the job catalog from
//! Saramin search results.

use anyhow::Context;
use clap::Parser;
use saramin_crawler::config::{apply_overrides, load_config_with_hash, Config};
use saramin_crawler::crawler::{run_crawl, Fetcher};
use saramin_crawler::output::{generate_markdown_summary, load_statistics, print_statistics};
use saramin_crawler::storage::{open_storage, SqliteStorage};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Saramin crawler: fills a job catalog from search results
///
/// Fetches result pages for a keyword one at a time, stores each new posting
/// with its company, and skips postings already in the catalog.
#[derive(Parser, Debug)]
#[command(name = "saramin-crawler")]
#[command(version = "1.0.0")]
#[command(about = "Fills a job catalog from Saramin search results", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Search keyword (overrides the config file)
    #[arg(short, long)]
    keyword: Option<String>,

    /// Number of new jobs to collect (overrides the config file)
    #[arg(short, long, value_name = "COUNT")]
    target: Option<u32>,

    /// Maximum number of result pages to fetch (overrides the config file)
    #[arg(long, value_name = "PAGES")]
    pages: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "export_summary"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_summary"])]
    stats: bool,

    /// Generate markdown summary from existing data and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    export_summary: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    // Command-line values win over the file
    let config = apply_overrides(config, cli.keyword, cli.target, cli.pages)
        .context("invalid command-line override")?;

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else if cli.export_summary {
        handle_export_summary(&config)
    } else {
        handle_crawl(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        // -v raises our crate first, -vvv everything
        match verbose {
            0 => EnvFilter::new("saramin_crawler=info,warn"),
            1 => EnvFilter::new("saramin_crawler=debug,info"),
            2 => EnvFilter::new("saramin_crawler=trace,debug"),
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
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Saramin Crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Keyword: {}", config.crawler.keyword);
    println!("  Target new jobs: {}", config.crawler.target_count);
    match config.crawler.max_pages {
        Some(pages) => println!("  Page limit: {}", pages),
        None => println!("  Page limit: none"),
    }
    println!(
        "  Delay between pages: {}-{}ms",
        config.crawler.min_delay_ms, config.crawler.max_delay_ms
    );
    println!("  Commit policy: {}", config.crawler.commit_policy.as_str());

    println!("\nFetcher:");
    println!("  User agent: {}", config.fetcher.user_agent);
    println!(
        "  Timeouts: {}s request, {}s connect",
        config.fetcher.timeout_secs, config.fetcher.connect_timeout_secs
    );
    println!(
        "  Retries: {} (backoff step {}ms)",
        config.fetcher.max_retries, config.fetcher.backoff_step_ms
    );

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Summary: {}", config.output.summary_path);

    // Build the first request exactly as a real run would
    let fetcher = Fetcher::new(&config.fetcher).context("failed to build fetcher")?;
    let first_page = fetcher.page_url(&config.crawler.keyword, 1)?;

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling at {}", first_page);

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_database(config)?;
    println!("Schema version: {}\n", storage.schema_version()?);

    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    storage.close()?;
    Ok(())
}

/// Handles the --export-summary mode: generates markdown summary
fn handle_export_summary(config: &Config) -> anyhow::Result<()> {
    println!("=== Exporting Catalog Summary ===\n");
    println!("Database: {}", config.output.database_path);
    println!("Output: {}", config.output.summary_path);
    println!();

    let storage = open_database(config)?;

    tracing::info!("Generating markdown summary...");
    generate_markdown_summary(&storage, Path::new(&config.output.summary_path))
        .context("failed to export summary")?;
    storage.close()?;

    println!("✓ Summary exported to: {}", config.output.summary_path);

    Ok(())
}

fn open_database(config: &Config) -> anyhow::Result<SqliteStorage> {
    open_storage(Path::new(&config.output.database_path)).with_context(|| {
        format!(
            "failed to open catalog database {}",
            config.output.database_path
        )
    })
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    match run_crawl(config).await {
        Ok(report) => {
            tracing::info!(
                "Crawl completed: {} new jobs saved ({})",
                report.jobs_saved,
                report.stop_reason
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
