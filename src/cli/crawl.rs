//! Crawl command and top-level CLI definition

use crate::crawler::config::{DEFAULT_CHECKPOINT_DIRECTORY, DEFAULT_RATE_LIMIT_SECS};
use crate::crawler::{CrawlConfig, CrawlReport, CrawlScheduler, DirectionReport};
use crate::fetcher::archive::{ArchiveClient, DEFAULT_BASE_URL};
use crate::shutdown::SharedShutdown;
use crate::store::{CheckpointStore, StoreLock};
use crate::MonthUnit;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

use super::{CliError, CombineArgs, StatusArgs};

/// News Archive Harvester CLI
#[derive(Parser, Debug)]
#[command(name = "news-archive-harvester")]
#[command(about = "Resumable month-by-month news archive crawler", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Checkpoint store directory
    #[arg(long, global = true, env = "ARCHIVE_STORE_DIR", default_value = DEFAULT_CHECKPOINT_DIRECTORY)]
    pub store_dir: PathBuf,

    /// Output format (json or human)
    #[arg(long, global = true, value_enum, default_value = "human")]
    pub output_format: OutputFormat,

    /// Serve Prometheus metrics on this address (e.g. 127.0.0.1:9090)
    #[arg(long, global = true)]
    pub metrics_addr: Option<SocketAddr>,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch missing months forward to now and backward to the floor
    Crawl(CrawlArgs),

    /// Summarize the checkpoint store
    Status(StatusArgs),

    /// Concatenate every checkpoint into one CSV
    Combine(CombineArgs),
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

/// Crawl command arguments
#[derive(Args, Debug)]
pub struct CrawlArgs {
    /// Archive API key
    #[arg(long, env = "NYT_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Earliest month to fetch (YYYY-MM)
    #[arg(long, env = "ARCHIVE_FLOOR", default_value = "1990-01")]
    pub floor: MonthUnit,

    /// Minimum seconds between archive requests
    #[arg(long, env = "ARCHIVE_RATE_LIMIT_SECS", default_value_t = DEFAULT_RATE_LIMIT_SECS)]
    pub rate_limit_secs: u64,

    /// Archive API base URL
    #[arg(long, env = "ARCHIVE_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Treat this month as the current one (YYYY-MM); defaults to today's month
    #[arg(long)]
    pub now: Option<MonthUnit>,

    /// Skip fetching months missing between existing checkpoints
    #[arg(long, default_value_t = false)]
    pub no_fill_gaps: bool,
}

impl CrawlArgs {
    /// Build the crawl configuration for `store_dir`
    pub fn config(&self, store_dir: PathBuf) -> CrawlConfig {
        CrawlConfig::new(self.api_key.clone(), store_dir)
            .with_historical_floor(self.floor)
            .with_rate_limit(Duration::from_secs(self.rate_limit_secs))
            .with_base_url(self.base_url.clone())
            .with_fill_gaps(!self.no_fill_gaps)
    }

    /// Execute the crawl command
    ///
    /// Holds the store lock for the whole run, so a second crawl against the
    /// same directory fails immediately. Temporary files left by a killed
    /// run are removed once the lock is held.
    pub async fn execute(&self, cli: &Cli, shutdown: SharedShutdown) -> Result<(), CliError> {
        let mut lock = StoreLock::open(&cli.store_dir)?;
        let _guard = lock.try_exclusive()?;
        CheckpointStore::open(&cli.store_dir)?.remove_stale_temp_files()?;

        let config = self.config(cli.store_dir.clone());
        let client = ArchiveClient::from_config(&config)?;
        let scheduler = CrawlScheduler::new(config, Box::new(client))?.with_shutdown(shutdown);

        let now = self.now.unwrap_or_else(MonthUnit::current);
        info!(store = %cli.store_dir.display(), now = %now, "Crawl started");

        match scheduler.run(now).await {
            Ok(report) => {
                match cli.output_format {
                    OutputFormat::Json => output_json(&report),
                    OutputFormat::Human => output_human(&report),
                }
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Crawl stopped");
                eprintln!("Crawl stopped: {e}");
                eprintln!("Months already written are kept; run again to resume.");
                Err(e.into())
            }
        }
    }
}

fn direction_json(report: &DirectionReport) -> serde_json::Value {
    serde_json::json!({
        "units": report.units.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "records": report.records,
    })
}

fn output_json(report: &CrawlReport) {
    let output = serde_json::json!({
        "success": true,
        "forward": direction_json(&report.forward),
        "gaps": direction_json(&report.gaps),
        "backward": direction_json(&report.backward),
        "total_units": report.total_units(),
        "total_records": report.total_records(),
    });
    println!("{output}");
}

fn describe(report: &DirectionReport) -> String {
    match (report.units.first(), report.units.last()) {
        (Some(first), Some(last)) => format!(
            "{} months ({first} .. {last}), {} records",
            report.units.len(),
            report.records
        ),
        _ => "nothing to do".to_string(),
    }
}

fn output_human(report: &CrawlReport) {
    println!("\nCrawl completed successfully!");
    println!("Forward:  {}", describe(&report.forward));
    println!("Gaps:     {}", describe(&report.gaps));
    println!("Backward: {}", describe(&report.backward));
    println!(
        "Total: {} months, {} records",
        report.total_units(),
        report.total_records()
    );
}
