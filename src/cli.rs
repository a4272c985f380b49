use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "queuesweep")]
#[command(about = "Clears completed Sonarr queue entries that will never import", long_about = None)]
pub struct Cli {
    /// Path to the TOML config file (defaults to $QUEUESWEEP_CONFIG or config/queuesweep.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll the queue until interrupted
    Run(SweepArgs),
    /// Run a single sweep and exit
    Once(SweepArgs),
    /// List the queue with each record's classification, removing nothing
    Inspect,
}

#[derive(clap::Args, Debug)]
pub struct SweepArgs {
    /// Log what would be removed without deleting anything
    #[arg(long)]
    pub dry_run: bool,
}
