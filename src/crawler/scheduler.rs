//! Crawl scheduler
//!
//! Drives an [`ArchiveSource`] and a [`CheckpointStore`] month by month. All
//! state comes from the store at the start of each direction; nothing is
//! carried between runs except the checkpoint files themselves.

use super::{CrawlConfig, CrawlError, RateLimiter};
use crate::fetcher::{normalize, ArchiveSource, FetcherResult};
use crate::shutdown::{self, SharedShutdown};
use crate::store::{CheckpointStore, StoreError};
use crate::{MonthUnit, Record};
use std::fmt;
use tracing::{debug, info, warn};

/// Which fill produced a checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Toward the current month
    Forward,
    /// Holes between the oldest and newest checkpoint
    Gap,
    /// Toward the historical floor
    Backward,
}

impl Direction {
    /// Label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Gap => "gap",
            Direction::Backward => "backward",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Months written by one direction, in fetch order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectionReport {
    /// Units written
    pub units: Vec<MonthUnit>,
    /// Records written across those units
    pub records: u64,
}

impl DirectionReport {
    fn push(&mut self, unit: MonthUnit, records: u64) {
        self.units.push(unit);
        self.records += records;
    }
}

/// Outcome of a complete run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Forward fill
    pub forward: DirectionReport,
    /// Gap fill
    pub gaps: DirectionReport,
    /// Backward fill
    pub backward: DirectionReport,
}

impl CrawlReport {
    /// Number of months written
    pub fn total_units(&self) -> usize {
        self.forward.units.len() + self.gaps.units.len() + self.backward.units.len()
    }

    /// Number of records written
    pub fn total_records(&self) -> u64 {
        self.forward.records + self.gaps.records + self.backward.records
    }

    /// Every unit written, in fetch order
    pub fn units(&self) -> impl Iterator<Item = MonthUnit> + '_ {
        self.forward
            .units
            .iter()
            .chain(&self.gaps.units)
            .chain(&self.backward.units)
            .copied()
    }
}

/// Resumable bidirectional crawl over one checkpoint store
pub struct CrawlScheduler {
    config: CrawlConfig,
    source: Box<dyn ArchiveSource>,
    store: CheckpointStore,
    limiter: RateLimiter,
    shutdown: Option<SharedShutdown>,
}

impl CrawlScheduler {
    /// Create a scheduler, opening (and creating) the configured store
    pub fn new(config: CrawlConfig, source: Box<dyn ArchiveSource>) -> Result<Self, CrawlError> {
        config.validate()?;

        let store = CheckpointStore::open(config.checkpoint_directory())?;
        let limiter = RateLimiter::fixed_interval(config.rate_limit());

        debug!(
            store = %store.dir().display(),
            source = source.base_url(),
            floor = %config.historical_floor(),
            interval_secs = config.rate_limit().as_secs_f64(),
            "Crawl scheduler created"
        );

        Ok(Self {
            config,
            source,
            store,
            limiter,
            shutdown: shutdown::get_global_shutdown(),
        })
    }

    /// Attach a shared shutdown handle for graceful cancellation.
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Store this scheduler writes to
    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }

    /// Configuration in use
    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Run every direction with the current month as `now`
    pub async fn run_current(&self) -> Result<CrawlReport, CrawlError> {
        self.run(MonthUnit::current()).await
    }

    /// Forward fill, then gap fill (when enabled), then backward fill
    ///
    /// The first error stops the run; directions after it are not attempted.
    pub async fn run(&self, now: MonthUnit) -> Result<CrawlReport, CrawlError> {
        let frontier = self.store.frontier();
        crate::metrics::record_frontier(frontier.newest, frontier.oldest);
        info!(
            now = %now,
            floor = %self.config.historical_floor(),
            newest = ?frontier.newest.map(|u| u.to_string()),
            oldest = ?frontier.oldest.map(|u| u.to_string()),
            "Starting crawl"
        );

        let mut report = CrawlReport {
            forward: self.forward_fill(now).await?,
            ..CrawlReport::default()
        };

        if self.config.fill_gaps() {
            report.gaps = self.fill_gaps().await?;
        }

        report.backward = self.backward_fill(now).await?;

        let frontier = self.store.frontier();
        crate::metrics::record_frontier(frontier.newest, frontier.oldest);
        info!(
            units = report.total_units(),
            records = report.total_records(),
            "Crawl complete"
        );
        Ok(report)
    }

    /// Fetch from the newest known month through `now`, inclusive
    ///
    /// The newest month is fetched again since it may have been written while
    /// still in progress. Does nothing for an empty store.
    pub async fn forward_fill(&self, now: MonthUnit) -> Result<DirectionReport, CrawlError> {
        let mut report = DirectionReport::default();

        let Some(start) = self.newest_cursor()? else {
            info!("No newest checkpoint, skipping forward fill");
            return Ok(report);
        };

        if start > now {
            debug!(start = %start, now = %now, "Newest checkpoint is ahead of now");
        }

        let mut cursor = start;
        while cursor <= now {
            let records = self.fetch_and_write(cursor, Direction::Forward).await?;
            report.push(cursor, records);
            cursor = cursor.next();
        }

        Ok(report)
    }

    /// Fetch every month missing between the first and last checkpoint file
    ///
    /// Months before the historical floor are never fetched.
    pub async fn fill_gaps(&self) -> Result<DirectionReport, CrawlError> {
        let mut report = DirectionReport::default();
        let floor = self.config.historical_floor();

        let missing: Vec<MonthUnit> = self
            .store
            .missing_units()?
            .into_iter()
            .filter(|unit| *unit >= floor)
            .collect();

        if missing.is_empty() {
            debug!("No gaps between checkpoints");
            return Ok(report);
        }

        info!(count = missing.len(), "Filling gaps between checkpoints");
        for unit in missing {
            let records = self.fetch_and_write(unit, Direction::Gap).await?;
            report.push(unit, records);
        }

        Ok(report)
    }

    /// Fetch from the oldest known month (or `now` for an empty store) back to the floor
    ///
    /// The floor is checked before every month and the floor month itself is
    /// fetched. Starting at or before the floor does nothing.
    pub async fn backward_fill(&self, now: MonthUnit) -> Result<DirectionReport, CrawlError> {
        let mut report = DirectionReport::default();
        let floor = self.config.historical_floor();

        let start = self.oldest_cursor()?.unwrap_or(now);
        if start <= floor {
            info!(oldest = %start, floor = %floor, "History complete, skipping backward fill");
            return Ok(report);
        }

        let mut cursor = start;
        while cursor >= floor {
            let records = self.fetch_and_write(cursor, Direction::Backward).await?;
            report.push(cursor, records);
            cursor = cursor.previous();
        }

        Ok(report)
    }

    /// One month: wait for the limiter, fetch, normalize fully, then write
    async fn fetch_and_write(&self, unit: MonthUnit, direction: Direction) -> Result<u64, CrawlError> {
        self.wait_turn().await?;

        debug!(unit = %unit, direction = %direction, "Fetching month");
        let response = self.source.fetch(unit).await?;

        // Nothing reaches the store until every article normalized cleanly
        let records = normalize(&response).collect::<FetcherResult<Vec<Record>>>()?;

        let written = self.store.write(unit, &records)?;
        crate::metrics::record_checkpoint_written(direction.as_str(), records.len());

        info!(
            unit = %unit,
            direction = %direction,
            records = written,
            "Month checkpointed"
        );
        Ok(written)
    }

    async fn wait_turn(&self) -> Result<(), CrawlError> {
        let Some(shutdown) = &self.shutdown else {
            self.limiter.acquire().await;
            return Ok(());
        };

        if shutdown.is_shutdown_requested() {
            return Err(self.interrupted());
        }

        tokio::select! {
            _ = self.limiter.acquire() => Ok(()),
            _ = shutdown.wait_for_shutdown() => Err(self.interrupted()),
        }
    }

    fn interrupted(&self) -> CrawlError {
        info!("Shutdown requested, stopping before the next month");
        CrawlError::Interrupted
    }

    /// Newest unit from the last record, or the last file name when that record is unavailable
    fn newest_cursor(&self) -> Result<Option<MonthUnit>, CrawlError> {
        let units = self.store.list_units()?;
        let Some(&last_file) = units.last() else {
            return Ok(None);
        };
        Ok(Some(self.resolve(self.store.try_newest_unit(), last_file, "newest")))
    }

    /// Oldest unit from the first record, or the first file name when that record is unavailable
    fn oldest_cursor(&self) -> Result<Option<MonthUnit>, CrawlError> {
        let units = self.store.list_units()?;
        let Some(&first_file) = units.first() else {
            return Ok(None);
        };
        Ok(Some(self.resolve(self.store.try_oldest_unit(), first_file, "oldest")))
    }

    fn resolve(
        &self,
        from_record: Result<MonthUnit, StoreError>,
        from_name: MonthUnit,
        cursor: &str,
    ) -> MonthUnit {
        match from_record {
            Ok(unit) => unit,
            Err(e) => {
                warn!(
                    error = %e,
                    cursor,
                    fallback = %from_name,
                    "Boundary record unavailable, using checkpoint file name"
                );
                from_name
            }
        }
    }
}
