//! Politeness delay between result-page fetches
//!
//! Pages are fetched strictly one after another; the pause between them is
//! drawn uniformly from a configured range so requests do not arrive on a
//! fixed beat.

use crate::config::CrawlerConfig;
use rand::Rng;
use std::time::Duration;

/// Uniform random delay source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pacer {
    min_delay_ms: u64,
    max_delay_ms: u64,
}

impl Pacer {
    /// Creates a pacer; an inverted range is normalized
    pub fn new(min_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            min_delay_ms: min_delay_ms.min(max_delay_ms),
            max_delay_ms: min_delay_ms.max(max_delay_ms),
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(config.min_delay_ms, config.max_delay_ms)
    }

    /// Draws the next delay from `[min, max]`
    pub fn next_delay(&self) -> Duration {
        if self.min_delay_ms == self.max_delay_ms {
            return Duration::from_millis(self.min_delay_ms);
        }
        let millis = rand::rng().random_range(self.min_delay_ms..=self.max_delay_ms);
        Duration::from_millis(millis)
    }

    /// Sleeps for the next delay
    pub async fn pause(&self) {
        let delay = self.next_delay();
        tracing::debug!("Waiting {:?} before the next page", delay);
        tokio::time::sleep(delay).await;
    }
}
