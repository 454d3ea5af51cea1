//! # pdash - Project progress dashboard
//!
//! A command-line dashboard that reads task rows from a tabular source, derives each
//! task's temporal status, progress and delay, and presents a summary plus a per-task
//! table, either printed or in an interactive terminal user interface (TUI).
//!
//! ## Key Features
//!
//! - **Derived Status**: Not started, in progress, overdue, completed, completed late
//! - **Progress and Delay**: Elapsed share of the plan window, whole days past the plan end
//! - **Field Mapping**: Bind task name, plan start, plan end and actual end to any source
//!   field, with keyword auto-matching for empty roles
//! - **Live Refresh**: The TUI recomputes whenever the source or configuration file changes
//! - **Export**: CSV of the computed task table
//!
//! ## Quick Start
//!
//! ```bash
//! # Pick a table and let field names fill the roles
//! pdash --source plan.json config set --table "Plan"
//!
//! # Print the summary and task table
//! pdash --source plan.json show
//!
//! # Launch the live dashboard
//! pdash --source plan.json ui
//! ```
//!
//! Files live in `~/.pdash/` unless `--source` / `--config` say otherwise.
//! Set `PDASH_LOG=debug` to see which records were dropped and why.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

pub mod cli;
pub mod cmd;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod run;
}

use cli::Cli;
use cmd::*;

fn main() {
    let cli = Cli::parse();

    // Determine the pdash directory
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let pd_dir = PathBuf::from(home).join(".pdash");
    if cli.source.is_none() || cli.config.is_none() {
        if let Err(e) = std::fs::create_dir_all(&pd_dir) {
            eprintln!("Failed to create pdash directory {}: {}", pd_dir.display(), e);
            std::process::exit(1);
        }
    }

    let is_ui = matches!(cli.command, Commands::Ui { .. });
    init_logging(is_ui, &pd_dir);

    let paths = Paths {
        source: cli.source.unwrap_or_else(|| pd_dir.join("workbook.json")),
        config: cli.config.unwrap_or_else(|| pd_dir.join("dashboard.json")),
    };

    match cli.command {
        Commands::Ui { poll_secs, now } => cmd_ui(&paths, poll_secs, now),

        Commands::Show { now, status, limit, json } => cmd_show(&paths, now, status, limit, json),

        Commands::Summary { now, json } => cmd_summary(&paths, now, json),

        Commands::Tables => cmd_tables(&paths),

        Commands::Fields { role, table } => cmd_fields(&paths, role, table),

        Commands::Config { action } => cmd_config(&paths, action),

        Commands::Export { output, now } => cmd_export(&paths, output, now),

        Commands::Completions { shell } => cmd_completions(shell),
    }
}

/// Log to stderr, or to `~/.pdash/pdash.log` while the TUI owns the terminal.
fn init_logging(is_ui: bool, pd_dir: &std::path::Path) {
    let filter = EnvFilter::try_from_env("PDASH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let writer = if is_ui {
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(pd_dir.join("pdash.log"))
        {
            Ok(file) => BoxMakeWriter::new(Mutex::new(file)),
            Err(_) => BoxMakeWriter::new(std::io::sink),
        }
    } else {
        BoxMakeWriter::new(std::io::stderr)
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(!is_ui)
        .init();
}
