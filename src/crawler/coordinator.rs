//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that drives one run:
//! - Fetching result pages one at a time
//! - Parsing listing blocks and resolving companies
//! - Skipping postings whose link is already stored
//! - Pausing between pages
//! - Committing or rolling back the run according to the commit policy

use crate::config::{CommitPolicy, Config, CrawlerConfig};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::pacer::Pacer;
use crate::crawler::parser::{ListingParser, ParsedListing};
use crate::crawler::ListingError;
use crate::model::InsertOutcome;
use crate::storage::Storage;
use crate::CrawlError;
use std::fmt;
use std::time::Instant;

/// Why a run stopped successfully
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The requested number of new jobs was saved
    TargetReached,

    /// A result page contained no listing blocks
    NoMoreListings,

    /// The configured page limit was fetched
    PageLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::TargetReached => "target reached",
            Self::NoMoreListings => "no more listings",
            Self::PageLimit => "page limit reached",
        };
        write!(f, "{}", text)
    }
}

/// Outcome of a successful crawl run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    pub pages_fetched: u32,
    pub jobs_saved: u32,
    pub duplicates: u32,
    pub companies_created: u32,
    pub failed_listings: u32,
    pub stop_reason: StopReason,
}

/// Counters accumulated while the run is in progress
#[derive(Debug, Default)]
struct Progress {
    pages_fetched: u32,
    jobs_saved: u32,
    duplicates: u32,
    companies_created: u32,
    failed_listings: u32,
}

impl Progress {
    fn finish(self, stop_reason: StopReason) -> CrawlReport {
        CrawlReport {
            pages_fetched: self.pages_fetched,
            jobs_saved: self.jobs_saved,
            duplicates: self.duplicates,
            companies_created: self.companies_created,
            failed_listings: self.failed_listings,
            stop_reason,
        }
    }
}

/// What happened to one listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListingOutcome {
    Saved,
    Duplicate,
}

/// Main crawler coordinator structure
///
/// The coordinator owns its store for the duration of the run; nothing else
/// in the process writes to it, so no locking is involved.
pub struct Coordinator<S: Storage> {
    config: CrawlerConfig,
    storage: S,
    fetcher: Fetcher,
    parser: ListingParser,
    pacer: Pacer,
}

impl<S: Storage> Coordinator<S> {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawl configuration
    /// * `storage` - An open catalog store
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(CrawlError)` - Failed to build the HTTP client or selectors
    pub fn new(config: &Config, storage: S) -> Result<Self, CrawlError> {
        Ok(Self {
            config: config.crawler.clone(),
            storage,
            fetcher: Fetcher::new(&config.fetcher)?,
            parser: ListingParser::new()?,
            pacer: Pacer::from_config(&config.crawler),
        })
    }

    /// Read access to the store, e.g. for reporting after a run
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Hands the store back so the caller can close it
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Runs the crawl under the configured commit policy
    ///
    /// With `CommitPolicy::WholeRun` every write of the run is committed
    /// together on success and discarded if the run fails. With
    /// `CommitPolicy::PerListing` each write is durable as soon as it is made.
    pub async fn run(&mut self) -> Result<CrawlReport, CrawlError> {
        tracing::info!(
            "Starting crawl for '{}' (target: {}, page limit: {}, commit policy: {})",
            self.config.keyword,
            self.config.target_count,
            self.config
                .max_pages
                .map(|pages| pages.to_string())
                .unwrap_or_else(|| "none".to_string()),
            self.config.commit_policy.as_str()
        );

        match self.config.commit_policy {
            CommitPolicy::PerListing => self.crawl_pages().await,
            CommitPolicy::WholeRun => {
                self.storage.begin_run()?;
                match self.crawl_pages().await {
                    Ok(report) => {
                        self.storage.commit_run()?;
                        tracing::debug!("Run transaction committed");
                        Ok(report)
                    }
                    Err(e) => {
                        tracing::error!("Crawl failed, rolling back every write of this run");
                        if let Err(rollback_err) = self.storage.rollback_run() {
                            tracing::error!("Rollback failed: {}", rollback_err);
                        }
                        Err(e)
                    }
                }
            }
        }
    }

    /// The page loop: fetch, parse, store, pause, repeat
    async fn crawl_pages(&mut self) -> Result<CrawlReport, CrawlError> {
        let start_time = Instant::now();
        let target = self.config.target_count;
        let mut progress = Progress::default();
        let mut page = 1;

        let stop_reason = loop {
            // Fetch the page; retries are handled inside the fetcher
            let fetched = self
                .fetcher
                .fetch_page(&self.config.keyword, page)
                .await
                .map_err(|source| CrawlError::Fetch { page, source })?;
            tracing::info!("Crawled page {}: {}", page, fetched.url);
            progress.pages_fetched += 1;

            // A page without listing blocks means the results are exhausted
            let listings = self.parser.parse_page(&fetched.body, &fetched.url);
            if listings.is_empty() {
                tracing::info!("Page {} has no listings, nothing more to crawl", page);
                break StopReason::NoMoreListings;
            }

            // Store listings in document order, stopping mid-page at the target
            for listing in listings {
                if progress.jobs_saved >= target {
                    break;
                }
                self.handle_listing(listing, &mut progress)?;
            }

            tracing::info!(
                "Page {} done, {} new jobs collected so far",
                page,
                progress.jobs_saved
            );

            // Check stop conditions before pausing
            if progress.jobs_saved >= target {
                break StopReason::TargetReached;
            }
            if self.config.max_pages.is_some_and(|max| page >= max) {
                break StopReason::PageLimit;
            }

            // Pause, then move on to the next page
            page += 1;
            self.pacer.pause().await;
        };

        let report = progress.finish(stop_reason);
        tracing::info!(
            "Crawl finished ({}): {} new jobs saved, {} duplicates, {} new companies, {} listings skipped, {} pages in {:?}",
            report.stop_reason,
            report.jobs_saved,
            report.duplicates,
            report.companies_created,
            report.failed_listings,
            report.pages_fetched,
            start_time.elapsed()
        );

        Ok(report)
    }

    /// Handles one parsed block; only fatal storage errors escape
    fn handle_listing(
        &mut self,
        listing: Result<ParsedListing, ListingError>,
        progress: &mut Progress,
    ) -> Result<(), CrawlError> {
        let listing = match listing {
            Ok(listing) => listing,
            Err(e) => {
                tracing::warn!("Skipping listing: {}", e);
                progress.failed_listings += 1;
                return Ok(());
            }
        };

        match self.store_listing(&listing, progress) {
            Ok(ListingOutcome::Saved) => {
                progress.jobs_saved += 1;
                tracing::info!("Saved new job: {}", listing.title);
            }
            Ok(ListingOutcome::Duplicate) => {
                progress.duplicates += 1;
                tracing::info!("Job already stored: {}", listing.title);
            }
            Err(ListingError::Storage(e)) if e.is_fatal() => {
                tracing::error!("Storage failed while saving '{}': {}", listing.title, e);
                return Err(CrawlError::Storage(e));
            }
            // Anything else is confined to this listing
            Err(e) => {
                tracing::warn!("Failed to save listing '{}': {}", listing.title, e);
                progress.failed_listings += 1;
            }
        }

        Ok(())
    }

    /// Resolves the company, then inserts the job unless its link is known
    ///
    /// A newly created company is counted as soon as it is written, even if
    /// the job insert that follows fails.
    fn store_listing(
        &mut self,
        listing: &ParsedListing,
        progress: &mut Progress,
    ) -> Result<ListingOutcome, ListingError> {
        let company = self.storage.insert_or_get_company(&listing.company)?;
        if company.is_created() {
            progress.companies_created += 1;
            tracing::info!("Saved new company: {}", listing.company);
        }

        // Fast path only; the unique index on link decides
        if self.storage.find_job_by_link(&listing.link)?.is_some() {
            return Ok(ListingOutcome::Duplicate);
        }

        match self.storage.insert_job(&listing.to_new_job(company.id()))? {
            InsertOutcome::Inserted(_) => Ok(ListingOutcome::Saved),
            InsertOutcome::Duplicate => Ok(ListingOutcome::Duplicate),
        }
    }
}
