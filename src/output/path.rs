//! Checkpoint file naming
//!
//! Each month lives in `{dir}/YYYY-MM.csv`. Zero-padding keeps lexicographic
//! order equal to chronological order for four-digit years.

use crate::MonthUnit;
use std::path::{Path, PathBuf};

/// Checkpoint file extension
pub const CHECKPOINT_EXTENSION: &str = "csv";

/// File name for a month's checkpoint (e.g. `2020-01.csv`)
pub fn checkpoint_file_name(unit: MonthUnit) -> String {
    format!("{unit}.{CHECKPOINT_EXTENSION}")
}

/// Full checkpoint path inside `dir`
pub fn checkpoint_path(dir: &Path, unit: MonthUnit) -> PathBuf {
    dir.join(checkpoint_file_name(unit))
}

/// Parse a directory entry name back into a month
///
/// Only exact `YYYY-MM.csv` names match; lock files, temporary files and
/// anything else in the directory return `None`.
pub fn parse_checkpoint_file_name(name: &str) -> Option<MonthUnit> {
    let stem = name.strip_suffix(CHECKPOINT_EXTENSION)?.strip_suffix('.')?;
    let unit: MonthUnit = stem.parse().ok()?;

    // Reject unpadded spellings such as 2020-1.csv
    (unit.to_string() == stem).then_some(unit)
}
