//! Checkpoint file writers

use crate::Record;

pub mod combine;
pub mod csv;
pub mod path;

pub use self::csv::{CsvRecordsReader, CsvRecordsWriter};
pub use combine::combine_files;
pub use path::{checkpoint_file_name, parse_checkpoint_file_name};

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// CSV read or write error
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Buffer flush error
    #[error("flush error: {0}")]
    FlushError(String),

    /// Temporary file could not be moved into place
    #[error("persist error: {0}")]
    PersistError(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Generic output writer trait
pub trait OutputWriter {
    /// Flush any buffered data
    fn flush(&mut self) -> OutputResult<()>;

    /// Close the writer and finalize output
    fn close(self) -> OutputResult<()>;
}

/// Trait for writing article records
pub trait RecordsWriter: OutputWriter {
    /// Write a single record
    fn write_record(&mut self, record: &Record) -> OutputResult<()>;

    /// Write multiple records at once
    fn write_records(&mut self, records: &[Record]) -> OutputResult<()> {
        for record in records {
            self.write_record(record)?;
        }
        Ok(())
    }
}
