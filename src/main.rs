mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use queuesweep::config::Config;
use queuesweep::observability;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let log = observability::init_tracing();

    let mut config = match cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    log.apply_config(&config.telemetry.log_level);

    match cli.command {
        Commands::Run(args) => {
            config.sweep.dry_run |= args.dry_run;
            commands::run(&config).await?
        }
        Commands::Once(args) => {
            config.sweep.dry_run |= args.dry_run;
            commands::once(&config).await?
        }
        Commands::Inspect => commands::inspect(&config).await?,
    }

    Ok(())
}
