use crate::config::types::{Config, CrawlerConfig, FetcherConfig, OutputConfig};
use crate::ConfigError;
use url::Url;

/// Shortest pause allowed between page fetches
const MIN_DELAY_FLOOR_MS: u64 = 1_000;

/// Longest pause allowed between page fetches
const MAX_DELAY_CEILING_MS: u64 = 60_000;

/// Upper bound on retries per page
const MAX_RETRIES_CEILING: u32 = 10;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawl loop configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.keyword.trim().is_empty() {
        return Err(ConfigError::Validation(
            "keyword cannot be empty".to_string(),
        ));
    }

    if config.target_count < 1 {
        return Err(ConfigError::Validation(format!(
            "target_count must be >= 1, got {}",
            config.target_count
        )));
    }

    if let Some(max_pages) = config.max_pages {
        if max_pages < 1 {
            return Err(ConfigError::Validation(format!(
                "max_pages must be >= 1 when set, got {}",
                max_pages
            )));
        }
    }

    // The pause between pages is always on and always randomized
    if config.min_delay_ms < MIN_DELAY_FLOOR_MS {
        return Err(ConfigError::Validation(format!(
            "min_delay_ms must be >= {}ms, got {}ms",
            MIN_DELAY_FLOOR_MS, config.min_delay_ms
        )));
    }

    if config.min_delay_ms >= config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min_delay_ms ({}) must be less than max_delay_ms ({})",
            config.min_delay_ms, config.max_delay_ms
        )));
    }

    if config.max_delay_ms > MAX_DELAY_CEILING_MS {
        return Err(ConfigError::Validation(format!(
            "max_delay_ms must be <= {}ms, got {}ms",
            MAX_DELAY_CEILING_MS, config.max_delay_ms
        )));
    }

    Ok(())
}

/// Validates HTTP fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.search_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid search_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "search_url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 || config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeouts must be >= 1s, got timeout={}s connect={}s",
            config.timeout_secs, config.connect_timeout_secs
        )));
    }

    if config.max_retries > MAX_RETRIES_CEILING {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= {}, got {}",
            MAX_RETRIES_CEILING, config.max_retries
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.summary_path.is_empty() {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
