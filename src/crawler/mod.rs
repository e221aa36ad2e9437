//! Resumable month-by-month crawl
//!
//! The crawler keeps a [`CheckpointStore`](crate::store::CheckpointStore) in
//! step with the remote archive. Every invocation re-derives its position from
//! the files on disk, so an interrupted or failed run resumes from the last
//! month that was fully written.
//!
//! # Run order
//!
//! 1. **Forward fill**: from the newest known month up to and including the
//!    current one. Skipped when the store has no newest month yet.
//! 2. **Gap fill**: months missing between the first and last checkpoint file.
//! 3. **Backward fill**: from the oldest known month (or the current one for an
//!    empty store) back to the historical floor.
//!
//! Requests are spaced by [`rate_limit::RateLimiter`]. Any fetch error aborts
//! the run, leaving later directions for the next invocation.
//!
//! # Quick Start
//!
//! ```no_run
//! use news_archive_harvester::crawler::{CrawlConfig, CrawlScheduler};
//! use news_archive_harvester::fetcher::archive::ArchiveClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CrawlConfig::new("my-api-key", "out/nyt");
//! let client = ArchiveClient::from_config(&config)?;
//! let scheduler = CrawlScheduler::new(config, Box::new(client))?;
//! let report = scheduler.run("2024-03".parse()?).await?;
//! println!("{} months written", report.total_units());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod rate_limit;
pub mod scheduler;

pub use config::CrawlConfig;
pub use rate_limit::RateLimiter;
pub use scheduler::{CrawlReport, CrawlScheduler, Direction, DirectionReport};

use crate::fetcher::FetcherError;
use crate::store::StoreError;

/// Crawl errors
#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    /// Archive request or normalization failed
    #[error("fetch error: {0}")]
    Fetch(#[from] FetcherError),

    /// Checkpoint store failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Shutdown requested before the run finished
    #[error("crawl interrupted")]
    Interrupted,
}
