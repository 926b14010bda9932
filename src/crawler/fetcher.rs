//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with a browser-like user agent
//! - Building search-result page URLs from a keyword and page number
//! - Classifying failures as retryable or permanent
//! - Wrapping each page request in the retry policy

use crate::config::FetcherConfig;
use crate::crawler::retry::RetryPolicy;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors that can occur while fetching a result page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("Network error for {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: Box<FetchError> },
}

impl FetchError {
    /// Returns true for failures worth another attempt
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Connection error / timeout / body read | Retry |
    /// | HTTP 429 | Retry |
    /// | HTTP 5xx | Retry |
    /// | Other HTTP status | Fail immediately |
    /// | Malformed URL / request | Fail immediately |
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { source, .. } => !source.is_builder(),
            Self::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || (500..=599).contains(status)
            }
            Self::InvalidUrl(_) | Self::Exhausted { .. } => false,
        }
    }
}

/// A successfully fetched result page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects; relative links resolve against it
    pub url: Url,

    /// Page body content
    pub body: String,
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The fetcher configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches search-result pages for a keyword
pub struct Fetcher {
    client: Client,
    search_url: Url,
    retry: RetryPolicy,
}

impl Fetcher {
    /// Creates a fetcher from configuration
    pub fn new(config: &FetcherConfig) -> Result<Self, crate::CrawlError> {
        let client = build_http_client(config)?;
        let search_url = Url::parse(&config.search_url)?;

        Ok(Self {
            client,
            search_url,
            retry: RetryPolicy::from_config(config),
        })
    }

    /// Builds the URL of a result page
    ///
    /// # Example
    ///
    /// ```no_run
    /// use saramin_crawler::config::FetcherConfig;
    /// use saramin_crawler::crawler::Fetcher;
    ///
    /// let fetcher = Fetcher::new(&FetcherConfig::default()).unwrap();
    /// let url = fetcher.page_url("backend", 2).unwrap();
    /// assert!(url.as_str().ends_with("searchType=search&searchword=backend&recruitPage=2"));
    /// ```
    pub fn page_url(&self, keyword: &str, page: u32) -> Result<Url, FetchError> {
        if page == 0 {
            return Err(FetchError::InvalidUrl(
                "page numbers start at 1".to_string(),
            ));
        }

        let mut url = self.search_url.clone();
        url.query_pairs_mut()
            .append_pair("searchType", "search")
            .append_pair("searchword", keyword)
            .append_pair("recruitPage", &page.to_string());
        Ok(url)
    }

    /// Fetches one result page, retrying transient failures
    ///
    /// # Arguments
    ///
    /// * `keyword` - The search keyword
    /// * `page` - The 1-based result page number
    pub async fn fetch_page(&self, keyword: &str, page: u32) -> Result<FetchedPage, FetchError> {
        let url = self.page_url(keyword, page)?;
        self.fetch_url(&url).await
    }

    /// Fetches an arbitrary URL under the retry policy
    pub async fn fetch_url(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let client = &self.client;
        self.retry
            .run(move |attempt| fetch_once(client, url, attempt))
            .await
    }
}

/// Performs a single GET and classifies the outcome
async fn fetch_once(client: &Client, url: &Url, attempt: u32) -> Result<FetchedPage, FetchError> {
    tracing::debug!("GET {} (attempt {})", url, attempt);

    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|source| FetchError::Network {
            url: url.to_string(),
            source,
        })?;

    // Non-2xx statuses are classified by the retry policy
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    // Keep the post-redirect URL for resolving relative links
    let final_url = response.url().clone();
    let body = response
        .text()
        .await
        .map_err(|source| FetchError::Network {
            url: url.to_string(),
            source,
        })?;

    Ok(FetchedPage {
        url: final_url,
        body,
    })
}
