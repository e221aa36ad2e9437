//! # News Archive Harvester Library
//!
//! Incrementally harvests monthly news archives from a remote archive API and
//! persists every month as an immutable CSV checkpoint. Repeated runs resume
//! forward (toward the current month) and backward (toward a fixed historical
//! floor) without re-fetching completed months.
//!
//! ## Features
//!
//! - **Checkpoint-driven resume**: progress is derived from the files on disk, never carried in memory
//! - **Bidirectional crawl**: forward fill to the present, backward fill to the historical floor
//! - **Gap filling**: months missing between the first and last checkpoint are fetched
//! - **Rate limiting**: a fixed minimum interval between consecutive archive requests
//! - **Atomic writes**: a month is written completely or not at all
//!
//! ## Quick Start
//!
//! ```no_run
//! use news_archive_harvester::crawler::{CrawlConfig, CrawlScheduler};
//! use news_archive_harvester::fetcher::archive::ArchiveClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CrawlConfig::new("my-api-key", "out/nyt");
//! let client = ArchiveClient::from_config(&config)?;
//! let scheduler = CrawlScheduler::new(config, Box::new(client))?;
//!
//! let report = scheduler.run_current().await?;
//! println!("wrote {} months", report.total_units());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`unit`] - Month unit parsing and arithmetic
//! - [`fetcher`] - Archive API client and record normalization
//! - [`output`] - Checkpoint CSV writers, file naming, combining
//! - [`store`] - Checkpoint store over a directory, frontier detection, locking
//! - [`crawler`] - Crawl scheduler, configuration, rate limiting
//! - [`shutdown`] - Ctrl+C coordination
//! - [`metrics`] - Prometheus metrics

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};

/// CLI command implementations
pub mod cli;

/// Crawl scheduling, configuration and rate limiting
pub mod crawler;

/// Archive fetchers
pub mod fetcher;

/// Observability metrics
pub mod metrics;

/// Checkpoint file writers
pub mod output;

/// Graceful shutdown coordination shared across modules
pub mod shutdown;

/// Checkpoint store
pub mod store;

/// Month unit type
pub mod unit;

// Re-export commonly used types
pub use unit::MonthUnit;

/// Column order of every checkpoint file
pub const RECORD_HEADER: [&str; 3] = ["date", "headline", "lead_paragraph"];

/// One extracted article
///
/// Field order matches [`RECORD_HEADER`]; records are written and read
/// back through serde in that order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    /// Publication timestamp as returned by the archive (e.g. `2020-01-01T05:00:00+0000`)
    pub date: String,
    /// Article abstract, used as the headline
    pub headline: String,
    /// Lead paragraph
    pub lead_paragraph: String,
}

impl Record {
    /// Create a record
    pub fn new(
        date: impl Into<String>,
        headline: impl Into<String>,
        lead_paragraph: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            headline: headline.into(),
            lead_paragraph: lead_paragraph.into(),
        }
    }

    /// Month this record belongs to, derived from its date
    pub fn unit(&self) -> Result<MonthUnit, unit::UnitError> {
        MonthUnit::from_timestamp_str(&self.date)
    }
}
