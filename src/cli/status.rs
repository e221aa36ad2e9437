//! Store status command

use crate::store::CheckpointStore;
use crate::MonthUnit;
use clap::Args;
use std::path::Path;

use super::{Cli, CliError, OutputFormat};

/// Status command arguments
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Also list every checkpointed month
    #[arg(long, default_value_t = false)]
    pub all: bool,
}

/// Snapshot of a checkpoint store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSummary {
    /// Checkpointed months, chronological
    pub units: Vec<MonthUnit>,
    /// Newest month per the boundary record
    pub newest: Option<MonthUnit>,
    /// Oldest month per the boundary record
    pub oldest: Option<MonthUnit>,
    /// Months missing between the first and last checkpoint
    pub missing: Vec<MonthUnit>,
}

impl StoreSummary {
    /// Summarize the store at `dir`; a missing directory is an empty store
    pub fn collect(dir: &Path) -> Result<Self, CliError> {
        if !dir.exists() {
            return Ok(Self::default());
        }

        let store = CheckpointStore::open(dir)?;
        let frontier = store.frontier();
        Ok(Self {
            units: store.list_units()?,
            newest: frontier.newest,
            oldest: frontier.oldest,
            missing: store.missing_units()?,
        })
    }

    /// First checkpoint file's month
    pub fn first(&self) -> Option<MonthUnit> {
        self.units.first().copied()
    }

    /// Last checkpoint file's month
    pub fn last(&self) -> Option<MonthUnit> {
        self.units.last().copied()
    }
}

fn show(unit: Option<MonthUnit>) -> String {
    unit.map_or_else(|| "unknown".to_string(), |u| u.to_string())
}

fn to_strings(units: &[MonthUnit]) -> Vec<String> {
    units.iter().map(ToString::to_string).collect()
}

impl StatusArgs {
    /// Execute the status command
    pub fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let summary = StoreSummary::collect(&cli.store_dir)?;

        match cli.output_format {
            OutputFormat::Json => {
                let mut output = serde_json::json!({
                    "store": cli.store_dir.display().to_string(),
                    "count": summary.units.len(),
                    "first": summary.first().map(|u| u.to_string()),
                    "last": summary.last().map(|u| u.to_string()),
                    "newest": summary.newest.map(|u| u.to_string()),
                    "oldest": summary.oldest.map(|u| u.to_string()),
                    "missing": to_strings(&summary.missing),
                });
                if self.all {
                    output["units"] = serde_json::json!(to_strings(&summary.units));
                }
                println!("{output}");
            }
            OutputFormat::Human => {
                println!("Store: {}", cli.store_dir.display());
                println!("Checkpoints: {}", summary.units.len());
                println!("First file: {}", show(summary.first()));
                println!("Last file: {}", show(summary.last()));
                println!("Newest month: {}", show(summary.newest));
                println!("Oldest month: {}", show(summary.oldest));
                if summary.missing.is_empty() {
                    println!("Missing: none");
                } else {
                    println!("Missing: {}", to_strings(&summary.missing).join(", "));
                }
                if self.all {
                    for unit in &summary.units {
                        println!("  {unit}");
                    }
                }
            }
        }

        Ok(())
    }
}
