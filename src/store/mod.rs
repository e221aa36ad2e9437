//! Checkpoint store
//!
//! A directory holding one `YYYY-MM.csv` file per completed month. The set of
//! file names is the ledger of completed units: files are only ever created by
//! an atomic rename, so existence implies a complete month.
//!
//! The crawl frontier is read from file contents: the newest unit is the month
//! of the last record in the lexicographically greatest file, the oldest unit
//! the month of the first record in the smallest one.

use crate::output::csv::TEMP_FILE_PREFIX;
use crate::output::path::{checkpoint_path, parse_checkpoint_file_name};
use crate::output::{CsvRecordsReader, CsvRecordsWriter, OutputError, OutputWriter, RecordsWriter};
use crate::{MonthUnit, Record};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub mod lock;

pub use lock::StoreLock;

/// Errors related to the checkpoint store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Directory or checkpoint could not be read
    #[error("store read error: {0}")]
    ReadError(String),

    /// No checkpoint files exist
    #[error("store is empty")]
    Empty,

    /// Checkpoint file holds no records, so it has no boundary record
    #[error("checkpoint {0} has no records")]
    EmptyCheckpoint(MonthUnit),

    /// Boundary record's date could not be turned into a month
    #[error("checkpoint {unit} has unparseable boundary date '{date}'")]
    InvalidBoundaryDate {
        /// Checkpoint month
        unit: MonthUnit,
        /// Raw date field
        date: String,
    },

    /// Writing a checkpoint failed
    #[error("store write error: {0}")]
    WriteError(#[from] OutputError),

    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Lock error
    #[error("lock error: {0}")]
    LockError(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Newest and oldest known units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Frontier {
    /// Newest known unit, `None` when unknown
    pub newest: Option<MonthUnit>,
    /// Oldest known unit, `None` when unknown
    pub oldest: Option<MonthUnit>,
}

#[derive(Debug, Clone, Copy)]
enum Boundary {
    First,
    Last,
}

/// Directory-backed store of monthly checkpoints
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    /// Open a store, creating the directory if needed
    pub fn open<P: AsRef<Path>>(dir: P) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| {
            StoreError::IoError(format!("Failed to create store {}: {e}", dir.display()))
        })?;
        Ok(Self { dir })
    }

    /// Store directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a unit's checkpoint file, whether or not it exists
    pub fn path_for(&self, unit: MonthUnit) -> PathBuf {
        checkpoint_path(&self.dir, unit)
    }

    /// Every checkpointed unit in chronological order
    ///
    /// Directory entries that are not `YYYY-MM.csv` files are ignored.
    pub fn list_units(&self) -> StoreResult<Vec<MonthUnit>> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| {
            StoreError::ReadError(format!("Failed to read {}: {e}", self.dir.display()))
        })?;

        let mut units = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|e| StoreError::ReadError(format!("Failed to read directory entry: {e}")))?;

            let Some(unit) = entry.file_name().to_str().and_then(parse_checkpoint_file_name)
            else {
                continue;
            };

            if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                units.push(unit);
            } else {
                debug!(unit = %unit, "Skipping non-file checkpoint entry");
            }
        }

        units.sort_unstable();
        Ok(units)
    }

    /// Delete temporary files left by writes that never reached their rename
    ///
    /// Only safe while holding the [`StoreLock`]; an in-flight write from
    /// another process would lose its file.
    pub fn remove_stale_temp_files(&self) -> StoreResult<usize> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| {
            StoreError::ReadError(format!("Failed to read {}: {e}", self.dir.display()))
        })?;

        let mut removed = 0;
        for entry in entries {
            let entry = entry
                .map_err(|e| StoreError::ReadError(format!("Failed to read directory entry: {e}")))?;

            let is_temp = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(TEMP_FILE_PREFIX));
            if !is_temp || !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }

            let path = entry.path();
            std::fs::remove_file(&path).map_err(|e| {
                StoreError::IoError(format!("Failed to remove {}: {e}", path.display()))
            })?;
            warn!(path = %path.display(), "Removed interrupted checkpoint write");
            removed += 1;
        }

        Ok(removed)
    }

    /// Checkpoint file paths in chronological order
    pub fn checkpoint_paths(&self) -> StoreResult<Vec<PathBuf>> {
        Ok(self
            .list_units()?
            .into_iter()
            .map(|unit| self.path_for(unit))
            .collect())
    }

    /// Whether a checkpoint exists for `unit`
    pub fn has(&self, unit: MonthUnit) -> bool {
        self.path_for(unit).is_file()
    }

    /// Newest known unit, from the last record of the greatest file
    pub fn try_newest_unit(&self) -> StoreResult<MonthUnit> {
        let units = self.list_units()?;
        let unit = units.last().copied().ok_or(StoreError::Empty)?;
        self.boundary_unit(unit, Boundary::Last)
    }

    /// Oldest known unit, from the first record of the smallest file
    pub fn try_oldest_unit(&self) -> StoreResult<MonthUnit> {
        let units = self.list_units()?;
        let unit = units.first().copied().ok_or(StoreError::Empty)?;
        self.boundary_unit(unit, Boundary::First)
    }

    /// Newest known unit; any failure is reported as unknown
    pub fn newest_unit(&self) -> Option<MonthUnit> {
        Self::known(self.try_newest_unit(), "newest")
    }

    /// Oldest known unit; any failure is reported as unknown
    pub fn oldest_unit(&self) -> Option<MonthUnit> {
        Self::known(self.try_oldest_unit(), "oldest")
    }

    /// Both frontier cursors
    pub fn frontier(&self) -> Frontier {
        Frontier {
            newest: self.newest_unit(),
            oldest: self.oldest_unit(),
        }
    }

    /// Units without a checkpoint between the first and last checkpoint files
    pub fn missing_units(&self) -> StoreResult<Vec<MonthUnit>> {
        let units = self.list_units()?;
        let (Some(&first), Some(&last)) = (units.first(), units.last()) else {
            return Ok(Vec::new());
        };

        Ok(MonthUnit::range_inclusive(first, last)
            .filter(|unit| units.binary_search(unit).is_err())
            .collect())
    }

    /// Create or replace the checkpoint for `unit`
    ///
    /// The file becomes visible only once fully written. Returns the number
    /// of records written.
    pub fn write(&self, unit: MonthUnit, records: &[Record]) -> StoreResult<u64> {
        let path = self.path_for(unit);
        let mut writer = CsvRecordsWriter::new(&path)?;
        writer.write_records(records)?;
        let written = writer.records_written();
        writer.close()?;

        info!(unit = %unit, records = written, "Checkpoint stored");
        Ok(written)
    }

    /// Read a unit's records in file order
    pub fn read_records(&self, unit: MonthUnit) -> StoreResult<Vec<Record>> {
        CsvRecordsReader::read_all(self.path_for(unit))
            .map_err(|e| StoreError::ReadError(format!("{unit}: {e}")))
    }

    fn boundary_unit(&self, unit: MonthUnit, boundary: Boundary) -> StoreResult<MonthUnit> {
        let path = self.path_for(unit);
        let record = match boundary {
            Boundary::First => CsvRecordsReader::read_first(&path),
            Boundary::Last => CsvRecordsReader::read_last(&path),
        }
        .map_err(|e| StoreError::ReadError(format!("{unit}: {e}")))?
        .ok_or(StoreError::EmptyCheckpoint(unit))?;

        let derived = record.unit().map_err(|_| StoreError::InvalidBoundaryDate {
            unit,
            date: record.date.clone(),
        })?;

        debug!(file = %unit, boundary = ?boundary, derived = %derived, "Read boundary record");
        Ok(derived)
    }

    fn known(result: StoreResult<MonthUnit>, which: &str) -> Option<MonthUnit> {
        match result {
            Ok(unit) => Some(unit),
            Err(StoreError::Empty) => None,
            Err(e) => {
                warn!(error = %e, cursor = which, "Treating frontier as unknown");
                None
            }
        }
    }
}
