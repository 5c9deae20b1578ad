//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Repo Vendor - Vendor external repositories into source control
#[derive(Parser, Debug)]
#[command(name = "repo-vendor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Vendor external repositories into the vendor directory
    Vendor(commands::vendor::VendorArgs),
    /// Materialize external repositories into the cache like a build would
    Reconcile(commands::reconcile::ReconcileArgs),
    /// Manage the external repository cache
    Cache(commands::cache::CacheArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        env_logger::Builder::new()
            .parse_filters(&self.log_level)
            .format_timestamp(None)
            .init();

        match self.command {
            Commands::Vendor(args) => commands::vendor::execute(args),
            Commands::Reconcile(args) => commands::reconcile::execute(args),
            Commands::Cache(args) => commands::cache::execute(args),
        }
    }
}
