//! Crawl configuration

use super::CrawlError;
use crate::fetcher::archive::DEFAULT_BASE_URL;
use crate::MonthUnit;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Earliest month backward fill will ever fetch (January 1990)
pub const DEFAULT_HISTORICAL_FLOOR: MonthUnit = MonthUnit::const_new(1990, 1);

/// Minimum spacing between archive requests, in seconds.
/// The archive API allows roughly five requests per minute per key.
pub const DEFAULT_RATE_LIMIT_SECS: u64 = 12;

/// Default checkpoint directory
pub const DEFAULT_CHECKPOINT_DIRECTORY: &str = "out/nyt";

/// Settings for one crawl run
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    api_key: String,
    historical_floor: MonthUnit,
    rate_limit: Duration,
    checkpoint_directory: PathBuf,
    base_url: String,
    fill_gaps: bool,
}

impl CrawlConfig {
    /// Config with default floor, rate limit and base URL
    pub fn new(api_key: impl Into<String>, checkpoint_directory: impl Into<PathBuf>) -> Self {
        Self {
            api_key: api_key.into(),
            historical_floor: DEFAULT_HISTORICAL_FLOOR,
            rate_limit: Duration::from_secs(DEFAULT_RATE_LIMIT_SECS),
            checkpoint_directory: checkpoint_directory.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            fill_gaps: true,
        }
    }

    /// Set the historical floor
    pub fn with_historical_floor(mut self, floor: MonthUnit) -> Self {
        self.historical_floor = floor;
        self
    }

    /// Set the minimum interval between requests
    pub fn with_rate_limit(mut self, interval: Duration) -> Self {
        self.rate_limit = interval;
        self
    }

    /// Point the client at another archive host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Enable or disable gap filling between forward and backward fill
    pub fn with_fill_gaps(mut self, fill_gaps: bool) -> Self {
        self.fill_gaps = fill_gaps;
        self
    }

    /// API key sent with every request
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Earliest month backward fill may fetch
    pub fn historical_floor(&self) -> MonthUnit {
        self.historical_floor
    }

    /// Minimum interval between requests
    pub fn rate_limit(&self) -> Duration {
        self.rate_limit
    }

    /// Store directory
    pub fn checkpoint_directory(&self) -> &Path {
        &self.checkpoint_directory
    }

    /// Archive base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether gap filling runs
    pub fn fill_gaps(&self) -> bool {
        self.fill_gaps
    }

    /// Reject settings a crawl cannot run with
    pub fn validate(&self) -> Result<(), CrawlError> {
        if self.api_key.trim().is_empty() {
            return Err(CrawlError::Config("API key must not be empty".to_string()));
        }

        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(CrawlError::Config(format!(
                "base URL must be http(s): {}",
                self.base_url
            )));
        }

        if self.checkpoint_directory.as_os_str().is_empty() {
            return Err(CrawlError::Config(
                "checkpoint directory must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
