//! Concatenate checkpoint files into one CSV

use crate::Record;
use csv::Reader;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{CsvRecordsWriter, OutputError, OutputResult, OutputWriter, RecordsWriter};

/// Write every record of `inputs`, in the given order, to `output`
///
/// The output gets a single header row. It is written atomically, so an
/// unreadable input leaves any previous `output` untouched.
///
/// Returns the number of records written.
pub fn combine_files(inputs: &[PathBuf], output: &Path) -> OutputResult<u64> {
    let mut writer = CsvRecordsWriter::new(output)?;

    for input in inputs {
        debug!(input = %input.display(), "Combining checkpoint");

        let mut reader = Reader::from_path(input).map_err(|e| {
            OutputError::CsvError(format!("Failed to open {}: {e}", input.display()))
        })?;

        for row in reader.deserialize::<Record>() {
            let record = row.map_err(|e| {
                OutputError::CsvError(format!("Failed to read {}: {e}", input.display()))
            })?;
            writer.write_record(&record)?;
        }
    }

    let total = writer.records_written();
    writer.close()?;

    info!(
        files = inputs.len(),
        records = total,
        output = %output.display(),
        "Combined checkpoints"
    );
    Ok(total)
}
