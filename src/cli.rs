use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Project progress dashboard over a tabular task source.
/// The source defaults to ~/.pdash/workbook.json, the configuration to ~/.pdash/dashboard.json.
#[derive(Parser)]
#[command(name = "pdash", version, about = "Project progress dashboard")]
pub struct Cli {
    /// Path to the workbook JSON snapshot.
    #[arg(long, global = true, env = "PDASH_SOURCE")]
    pub source: Option<PathBuf>,

    /// Path to the dashboard configuration file.
    #[arg(long, global = true, env = "PDASH_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
