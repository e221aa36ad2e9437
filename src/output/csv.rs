//! CSV checkpoint writer and reader
//!
//! Rows go to a temporary file next to the destination; [`OutputWriter::close`]
//! syncs it and renames it into place. A writer dropped before `close` leaves
//! nothing behind, so readers only ever see complete files.

use crate::{Record, RECORD_HEADER};
use csv::{Reader, Writer, WriterBuilder};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};
use tracing::{debug, info};

use super::{OutputError, OutputResult, OutputWriter, RecordsWriter};

const DEFAULT_BUFFER_SIZE: usize = 8192; // 8KB buffer

/// Name prefix of in-flight checkpoint files
pub const TEMP_FILE_PREFIX: &str = ".tmp";

/// Atomic CSV writer for one checkpoint file
pub struct CsvRecordsWriter {
    writer: Writer<BufWriter<NamedTempFile>>,
    destination: PathBuf,
    records_written: u64,
}

impl CsvRecordsWriter {
    /// Create a writer whose output will land at `destination` on close
    ///
    /// The header row is written immediately, so even a month without
    /// articles produces a well-formed file.
    pub fn new<P: AsRef<Path>>(destination: P) -> OutputResult<Self> {
        Self::new_with_buffer_size(destination, DEFAULT_BUFFER_SIZE)
    }

    /// Create a writer with custom buffer size
    pub fn new_with_buffer_size<P: AsRef<Path>>(
        destination: P,
        buffer_size: usize,
    ) -> OutputResult<Self> {
        let destination = destination.as_ref().to_path_buf();
        let parent = destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        std::fs::create_dir_all(parent)
            .map_err(|e| OutputError::IoError(format!("Failed to create directory: {e}")))?;

        // Same directory as the destination so the final rename stays on one filesystem
        let temp_file = Builder::new()
            .prefix(TEMP_FILE_PREFIX)
            .tempfile_in(parent)
            .map_err(|e| OutputError::IoError(format!("Failed to create temp file: {e}")))?;

        let buf_writer = BufWriter::with_capacity(buffer_size, temp_file);
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(buf_writer);

        writer
            .write_record(RECORD_HEADER)
            .map_err(|e| OutputError::CsvError(format!("Failed to write header: {e}")))?;

        debug!(destination = %destination.display(), "CSV checkpoint writer created");

        Ok(Self {
            writer,
            destination,
            records_written: 0,
        })
    }

    /// Get number of records written so far
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Final location of the file
    pub fn destination(&self) -> &Path {
        &self.destination
    }
}

impl RecordsWriter for CsvRecordsWriter {
    fn write_record(&mut self, record: &Record) -> OutputResult<()> {
        self.writer
            .serialize(record)
            .map_err(|e| OutputError::CsvError(format!("Failed to write record: {e}")))?;

        self.records_written += 1;
        Ok(())
    }
}

impl OutputWriter for CsvRecordsWriter {
    fn flush(&mut self) -> OutputResult<()> {
        self.writer
            .flush()
            .map_err(|e| OutputError::FlushError(format!("Failed to flush: {e}")))
    }

    /// Sync the temporary file and atomically move it to the destination
    fn close(mut self) -> OutputResult<()> {
        self.flush()?;

        let buf_writer = self
            .writer
            .into_inner()
            .map_err(|e| OutputError::IoError(format!("Failed to get inner writer: {e}")))?;

        let mut temp_file = buf_writer
            .into_inner()
            .map_err(|e| OutputError::IoError(format!("Failed to get file handle: {e}")))?;

        temp_file
            .flush()
            .map_err(|e| OutputError::FlushError(format!("Failed to flush temp file: {e}")))?;
        temp_file
            .as_file()
            .sync_all()
            .map_err(|e| OutputError::IoError(format!("Failed to sync temp file: {e}")))?;

        temp_file
            .persist(&self.destination)
            .map_err(|e| OutputError::PersistError(e.error.to_string()))?;

        // Fsync parent directory so the rename itself is durable
        if let Some(parent) = self.destination.parent() {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        info!(
            path = %self.destination.display(),
            records = self.records_written,
            "Checkpoint file written"
        );
        Ok(())
    }
}

/// Reader for checkpoint files
pub struct CsvRecordsReader;

impl CsvRecordsReader {
    /// Read every record in file order
    pub fn read_all<P: AsRef<Path>>(path: P) -> OutputResult<Vec<Record>> {
        let mut reader = Self::open(path.as_ref())?;
        reader
            .deserialize::<Record>()
            .map(|row| row.map_err(|e| OutputError::CsvError(e.to_string())))
            .collect()
    }

    /// First record of the file, `None` for a header-only file
    pub fn read_first<P: AsRef<Path>>(path: P) -> OutputResult<Option<Record>> {
        let mut reader = Self::open(path.as_ref())?;
        reader
            .deserialize::<Record>()
            .next()
            .transpose()
            .map_err(|e| OutputError::CsvError(e.to_string()))
    }

    /// Last record of the file, `None` for a header-only file
    pub fn read_last<P: AsRef<Path>>(path: P) -> OutputResult<Option<Record>> {
        let mut reader = Self::open(path.as_ref())?;
        let mut last = None;
        for row in reader.deserialize::<Record>() {
            last = Some(row.map_err(|e| OutputError::CsvError(e.to_string()))?);
        }
        Ok(last)
    }

    fn open(path: &Path) -> OutputResult<Reader<File>> {
        let file = File::open(path).map_err(|e| {
            OutputError::IoError(format!("Failed to open {}: {e}", path.display()))
        })?;
        Ok(Reader::from_reader(file))
    }
}
