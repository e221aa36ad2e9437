//! Combine command

use crate::output::combine_files;
use crate::store::CheckpointStore;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use super::{Cli, CliError, OutputFormat};

/// Default combined output file
pub const DEFAULT_COMBINED_OUTPUT: &str = "out/nyt_combined.csv";

/// Combine command arguments
#[derive(Args, Debug)]
pub struct CombineArgs {
    /// Combined CSV destination
    #[arg(long, default_value = DEFAULT_COMBINED_OUTPUT)]
    pub output: PathBuf,
}

impl CombineArgs {
    /// Execute the combine command
    ///
    /// Checkpoints are concatenated in file-name order under a single header.
    pub fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        if !cli.store_dir.is_dir() {
            return Err(CliError::InvalidArgument(format!(
                "store directory {} does not exist",
                cli.store_dir.display()
            )));
        }

        let store = CheckpointStore::open(&cli.store_dir)?;
        let inputs = store.checkpoint_paths()?;
        info!(files = inputs.len(), output = %self.output.display(), "Combining checkpoints");

        let records = combine_files(&inputs, &self.output)?;

        match cli.output_format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "success": true,
                    "files": inputs.len(),
                    "records": records,
                    "output_path": self.output.display().to_string(),
                });
                println!("{output}");
            }
            OutputFormat::Human => {
                println!("Combined {} checkpoints ({records} records)", inputs.len());
                println!("Output: {}", self.output.display());
            }
        }

        Ok(())
    }
}
