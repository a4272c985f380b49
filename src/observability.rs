//! Logging setup and sweep counters

use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};

const DEFAULT_FILTER: &str = "info";

/// Handle for swapping the log filter once configuration is known
pub struct LogHandle {
    handle: reload::Handle<EnvFilter, Registry>,
}

/// Install the global fmt subscriber before anything else logs.
///
/// Starts from `RUST_LOG` (or `info`); [`LogHandle::apply_config`] later
/// switches to the configured level unless `RUST_LOG` is set.
pub fn init_tracing() -> LogHandle {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    LogHandle { handle }
}

impl LogHandle {
    pub fn apply_config(&self, configured: &str) {
        self.apply(configured, std::env::var_os("RUST_LOG").is_some());
    }

    fn apply(&self, configured: &str, env_override: bool) {
        if env_override {
            return;
        }

        match EnvFilter::try_new(configured) {
            Ok(filter) => {
                if let Err(e) = self.handle.reload(filter) {
                    tracing::warn!(error = %e, "Failed to apply configured log level");
                }
            }
            Err(e) => {
                tracing::warn!(log_level = configured, error = %e, "Invalid log_level, keeping default");
            }
        }
    }
}

/// Counters for operator visibility; never read back by the sweep logic
#[derive(Debug, Default)]
pub struct SweepMetrics {
    cycles: AtomicU64,
    fetch_failures: AtomicU64,
    records_removed: AtomicU64,
    removal_failures: AtomicU64,
}

impl SweepMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cycle_started(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fetch_failed(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "fetch_failures", "Metric incremented");
    }

    pub fn record_removed(&self) {
        self.records_removed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "records_removed", "Metric incremented");
    }

    pub fn removal_failed(&self) {
        self.removal_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "removal_failures", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            records_removed: self.records_removed.load(Ordering::Relaxed),
            removal_failures: self.removal_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub cycles: u64,
    pub fetch_failures: u64,
    pub records_removed: u64,
    pub removal_failures: u64,
}
