//! Configuration module
//!
//! This module handles loading, parsing, and validating the TOML file that
//! describes a crawl run: keyword and stop conditions, fetcher behavior, and
//! output locations.
//!
//! # Example
//!
//! ```no_run
//! use saramin_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawler.toml")).unwrap();
//! println!("Crawling for: {}", config.crawler.keyword);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    CommitPolicy, Config, CrawlerConfig, FetcherConfig, OutputConfig, DEFAULT_SEARCH_URL,
    DEFAULT_USER_AGENT,
};

pub use parser::{
    apply_overrides, compute_config_hash, load_config, load_config_with_hash, parse_config,
};
