//! CLI command implementations

pub mod combine;
pub mod crawl;
pub mod error;
pub mod status;

pub use combine::CombineArgs;
pub use crawl::{Cli, Commands, CrawlArgs, OutputFormat};
pub use error::CliError;
pub use status::{StatusArgs, StoreSummary};
