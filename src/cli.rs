//! CLI argument parsing for the salesops-worker binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "salesops-worker", about = "Sales-ops backend worker")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the worker server (default if no subcommand given)
    Serve,
    /// Run database migrations and exit
    Migrate,
    /// Validate a PixSell export and print what an import would do
    Preview {
        /// Path to the exported CSV file
        file: PathBuf,
    },
    /// Import a PixSell export into the visits table
    Import {
        /// Path to the exported CSV file
        file: PathBuf,
    },
}
