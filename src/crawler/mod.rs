//! Crawler module for fetching and processing search-result pages
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - Listing extraction from result pages
//! - Randomized pacing between pages
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod pacer;
mod parser;
mod retry;

pub use coordinator::{Coordinator, CrawlReport, StopReason};
pub use fetcher::{build_http_client, FetchError, FetchedPage, Fetcher};
pub use pacer::Pacer;
pub use parser::{ListingParser, ParsedListing};
pub use retry::RetryPolicy;

use crate::config::Config;
use crate::storage::{open_storage, StorageError};
use crate::CrawlError;
use std::path::Path;
use thiserror::Error;

/// Why a single listing was skipped
///
/// These never abort a run on their own; the coordinator logs them and moves
/// on to the next block, except for storage errors classified as fatal.
#[derive(Debug, Error)]
pub enum ListingError {
    #[error("listing '{title}' is missing its {field}")]
    MissingField { field: &'static str, title: String },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the catalog database
/// 2. Fetch result pages until a stop condition holds
/// 3. Commit or roll back according to the commit policy
/// 4. Close the database on every exit path
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed successfully
/// * `Err(CrawlError)` - Crawl failed; nothing was kept under the whole-run policy
pub async fn run_crawl(config: Config) -> Result<CrawlReport, CrawlError> {
    let database_path = Path::new(&config.output.database_path);
    tracing::info!("Opening catalog database at {}", database_path.display());
    let storage = open_storage(database_path)?;

    let mut coordinator = match Coordinator::new(&config, storage) {
        Ok(coordinator) => coordinator,
        Err(e) => {
            tracing::error!("Failed to set up crawler: {}", e);
            return Err(e);
        }
    };

    // Close on every path; a close error only surfaces if the run succeeded
    let result = coordinator.run().await;
    let closed = coordinator.into_storage().close();

    match (result, closed) {
        (Ok(report), Ok(())) => {
            tracing::info!("Catalog database closed");
            Ok(report)
        }
        (Ok(_), Err(close_err)) => Err(CrawlError::Storage(close_err)),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            tracing::error!("Failed to close catalog database: {}", close_err);
            Err(e)
        }
    }
}
