use std::sync::Arc;

use queuesweep::client::{QueueApi, SonarrClient};
use queuesweep::config::Config;
use queuesweep::queue::removal_reason;
use queuesweep::sweeper::{SweepOptions, Sweeper};
use tracing::{error, info};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

fn connect(config: &Config) -> Result<Arc<SonarrClient>, AnyError> {
    let client = SonarrClient::from_config(&config.server)?;
    info!(base_url = %client.base_url(), "Sonarr client ready");
    Ok(Arc::new(client))
}

pub async fn run(config: &Config) -> Result<(), AnyError> {
    let sweeper = Sweeper::new(connect(config)?, SweepOptions::from(&config.sweep));
    sweeper.run(shutdown_signal()).await;
    info!(metrics = ?sweeper.metrics().snapshot(), "Sweeper stopped");
    Ok(())
}

pub async fn once(config: &Config) -> Result<(), AnyError> {
    let sweeper = Sweeper::new(connect(config)?, SweepOptions::from(&config.sweep));
    let report = sweeper.run_cycle().await?;

    println!("{}", report.summary());

    for (id, reason) in &report.matched {
        println!("  {id}: {reason}");
    }
    for (id, e) in &report.failed {
        println!("  {id}: FAILED ({e})");
    }

    Ok(())
}

pub async fn inspect(config: &Config) -> Result<(), AnyError> {
    let client = connect(config)?;
    let records = client.fetch_queue().await?;

    println!("{:>10}  {:<26} {:<24} TITLE", "ID", "STATUS", "VERDICT");
    for record in &records {
        let verdict = removal_reason(record)
            .map(|reason| format!("remove ({reason})"))
            .unwrap_or_else(|| "keep".to_string());
        println!(
            "{:>10}  {:<26} {:<24} {}",
            record.id.to_string(),
            record.status.as_str(),
            verdict,
            record.title.as_deref().unwrap_or("-")
        );
    }
    println!("{} record(s)", records.len());

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
