//! Monthly archive API client
//!
//! One `GET {base}/svc/archive/v1/{year}/{month}.json?api-key=...` per month.
//! The whole month arrives as a single JSON document; non-2xx statuses are
//! hard failures and nothing is retried here.

use crate::crawler::CrawlConfig;
use crate::metrics::ArchiveRequestMetrics;
use crate::MonthUnit;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use super::{ArchiveResponse, ArchiveSource, FetcherError, FetcherResult};

/// Default archive API host
pub const DEFAULT_BASE_URL: &str = "https://api.nytimes.com";

const ARCHIVE_PATH: &str = "/svc/archive/v1";

/// Monthly documents can be tens of megabytes
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// HTTP client for the monthly archive endpoint
#[derive(Clone)]
pub struct ArchiveClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ArchiveClient {
    /// Create a client against [`DEFAULT_BASE_URL`]
    pub fn new(api_key: impl Into<String>) -> FetcherResult<Self> {
        Self::new_with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create with custom base URL (for testing and mirrors)
    pub fn new_with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> FetcherResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FetcherError::ClientError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Build from crawl configuration
    pub fn from_config(config: &CrawlConfig) -> FetcherResult<Self> {
        Self::new_with_base_url(config.api_key(), config.base_url())
    }

    /// Archive URL for a month; the month is not zero-padded
    pub fn archive_url(&self, unit: MonthUnit) -> String {
        format!(
            "{}{}/{}/{}.json",
            self.base_url,
            ARCHIVE_PATH,
            unit.year(),
            unit.month()
        )
    }
}

#[async_trait]
impl ArchiveSource for ArchiveClient {
    async fn fetch(&self, unit: MonthUnit) -> FetcherResult<ArchiveResponse> {
        let url = self.archive_url(unit);
        info!(unit = %unit, "Requesting archive month");
        debug!(url = %url, "Archive request");

        let metrics = ArchiveRequestMetrics::start(unit);

        let response = self
            .client
            .get(&url)
            .query(&[("api-key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                metrics.record_network_error();
                // Strip the URL so the API key never reaches the logs
                FetcherError::NetworkError(e.without_url().to_string())
            })?;

        let status = response.status();
        metrics.record_complete(status.as_u16());

        if !status.is_success() {
            return Err(FetcherError::HttpStatus {
                unit,
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetcherError::NetworkError(e.without_url().to_string()))?;

        let body = serde_json::from_slice(&bytes)
            .map_err(|e| FetcherError::ParseError(format!("{unit}: {e}")))?;

        debug!(unit = %unit, bytes = bytes.len(), "Archive document received");
        Ok(ArchiveResponse::new(unit, body))
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
