use serde::Deserialize;

/// Default search-results endpoint
pub const DEFAULT_SEARCH_URL: &str = "https://www.saramin.co.kr/zf_user/search/recruit";

/// Desktop browser identification sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Main configuration structure for a crawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    pub output: OutputConfig,
}

/// Crawl loop configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Free-text search keyword
    pub keyword: String,

    /// Stop once this many new jobs have been saved
    #[serde(rename = "target-count", default = "default_target_count")]
    pub target_count: u32,

    /// Optional hard cap on the number of result pages fetched
    #[serde(rename = "max-pages", default)]
    pub max_pages: Option<u32>,

    /// Lower bound of the pause between page fetches (milliseconds)
    #[serde(rename = "min-delay-ms", default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Upper bound of the pause between page fetches (milliseconds)
    #[serde(rename = "max-delay-ms", default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// How writes are grouped into transactions
    #[serde(rename = "commit-policy", default)]
    pub commit_policy: CommitPolicy,
}

/// Transaction scope of a crawl run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommitPolicy {
    /// One transaction spans the whole run; a fatal error discards every write
    #[default]
    WholeRun,

    /// Every write commits on its own; a fatal error keeps earlier writes
    PerListing,
}

impl CommitPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WholeRun => "whole-run",
            Self::PerListing => "per-listing",
        }
    }
}

/// HTTP fetcher configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Search-results URL; keyword and page are appended as query parameters
    #[serde(rename = "search-url", default = "default_search_url")]
    pub search_url: String,

    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Retries after the first attempt for transient failures
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff before retry n is n times this step (milliseconds)
    #[serde(rename = "backoff-step-ms", default = "default_backoff_step_ms")]
    pub backoff_step_ms: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            search_url: default_search_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_step_ms: default_backoff_step_ms(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the markdown catalog summary
    #[serde(rename = "summary-path", default = "default_summary_path")]
    pub summary_path: String,
}

fn default_target_count() -> u32 {
    100
}

fn default_min_delay_ms() -> u64 {
    2000
}

fn default_max_delay_ms() -> u64 {
    5000
}

fn default_search_url() -> String {
    DEFAULT_SEARCH_URL.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_step_ms() -> u64 {
    1000
}

fn default_summary_path() -> String {
    "./catalog.md".to_string()
}
