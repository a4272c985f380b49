//! Poll loop: fetch the queue, pick out records that will never import,
//! remove them, sleep, repeat.
//!
//! Every failure inside a cycle is logged and swallowed. The loop itself only
//! returns when the shutdown future resolves, which is checked while idle.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::client::{QueueApi, TransportError};
use crate::config::SweepConfig;
use crate::observability::SweepMetrics;
use crate::queue::{QueueId, RemovalReason, removal_reason};

/// Runtime options for the poll loop
#[derive(Debug, Clone)]
pub struct SweepOptions {
    pub poll_interval: Duration,
    pub max_backoff: Option<Duration>,
    pub dry_run: bool,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self::from(&SweepConfig::default())
    }
}

impl From<&SweepConfig> for SweepOptions {
    fn from(config: &SweepConfig) -> Self {
        Self {
            poll_interval: config.poll_interval.as_duration(),
            max_backoff: config.max_backoff.map(|d| d.as_duration()),
            dry_run: config.dry_run,
        }
    }
}

/// Outcome of one fetch → filter → remove pass
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub fetched: usize,
    /// Removable records in fetch order
    pub matched: Vec<(QueueId, RemovalReason)>,
    pub removed: Vec<QueueId>,
    pub failed: Vec<(QueueId, String)>,
    pub dry_run: bool,
}

impl CycleReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// One-line outcome, e.g. `fetched 4, removed 2, 1 failed`
    pub fn summary(&self) -> String {
        let (verb, count) = if self.dry_run {
            ("would remove", self.matched.len())
        } else {
            ("removed", self.removed.len())
        };
        let mut line = format!("fetched {}, {verb} {count}", self.fetched);
        if !self.is_clean() {
            line.push_str(&format!(", {} failed", self.failed.len()));
        }
        line
    }
}

/// Sleep before the next cycle.
///
/// Without `max_backoff` this is always `interval`. With it, the n-th
/// consecutive failed fetch sleeps `interval * 2^(n-1)`, capped at the maximum.
pub fn backoff_delay(interval: Duration, max_backoff: Option<Duration>, failures: u32) -> Duration {
    let Some(max) = max_backoff else {
        return interval;
    };
    if failures <= 1 {
        return interval;
    }

    let factor = 1u32.checked_shl(failures - 1).unwrap_or(u32::MAX);
    interval.saturating_mul(factor).min(max).max(interval)
}

pub struct Sweeper {
    api: Arc<dyn QueueApi>,
    options: SweepOptions,
    metrics: Arc<SweepMetrics>,
}

impl Sweeper {
    pub fn new(api: Arc<dyn QueueApi>, options: SweepOptions) -> Self {
        Self {
            api,
            options,
            metrics: Arc::new(SweepMetrics::new()),
        }
    }

    pub fn metrics(&self) -> Arc<SweepMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Run a single cycle.
    ///
    /// A failed fetch is returned as an error. Removal failures are isolated
    /// per record and reported in [`CycleReport::failed`].
    pub async fn run_cycle(&self) -> Result<CycleReport, TransportError> {
        self.metrics.cycle_started();

        let records = match self.api.fetch_queue().await {
            Ok(records) => records,
            Err(e) => {
                self.metrics.fetch_failed();
                return Err(e);
            }
        };

        let mut report = CycleReport {
            fetched: records.len(),
            dry_run: self.options.dry_run,
            ..CycleReport::default()
        };

        let matches: Vec<_> = records
            .iter()
            .filter_map(|record| removal_reason(record).map(|reason| (record, reason)))
            .collect();

        debug!(fetched = report.fetched, matched = matches.len(), "Queue classified");

        for (record, reason) in matches {
            let title = record.title.as_deref().unwrap_or("");
            report.matched.push((record.id.clone(), reason));

            if self.options.dry_run {
                info!(id = %record.id, %reason, title, "Would remove queue item (dry run)");
                continue;
            }

            match self.api.remove(&record.id).await {
                Ok(()) => {
                    info!(id = %record.id, %reason, title, "Removed queue item");
                    self.metrics.record_removed();
                    report.removed.push(record.id.clone());
                }
                Err(e) => {
                    warn!(id = %record.id, error = %e, "Failed to remove queue item");
                    self.metrics.removal_failed();
                    report.failed.push((record.id.clone(), e.to_string()));
                }
            }
        }

        Ok(report)
    }

    /// Poll until `shutdown` resolves. Never returns an error.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!(
            interval = ?self.options.poll_interval,
            dry_run = self.options.dry_run,
            "Starting queue sweeper"
        );

        let mut consecutive_failures = 0u32;

        loop {
            match self.run_cycle().await {
                Ok(report) => {
                    consecutive_failures = 0;
                    if report.matched.is_empty() {
                        debug!(fetched = report.fetched, "Nothing to remove");
                    } else {
                        info!(
                            fetched = report.fetched,
                            matched = report.matched.len(),
                            removed = report.removed.len(),
                            failed = report.failed.len(),
                            "Sweep finished"
                        );
                    }
                }
                Err(e) => {
                    consecutive_failures = consecutive_failures.saturating_add(1);
                    error!(error = %e, consecutive_failures, "Failed to fetch queue");
                }
            }

            debug!(metrics = ?self.metrics.snapshot(), "Cycle complete");

            let delay = backoff_delay(
                self.options.poll_interval,
                self.options.max_backoff,
                consecutive_failures,
            );

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping sweeper");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{QueueRecord, QueueStatus};
    use async_trait::async_trait;
    use std::collections::{HashSet, VecDeque};
    use std::sync::Mutex;
    use tokio::sync::Notify;
    use tokio::time::Instant;

    /// Scripted queue: fetch results are consumed in order, then the queue is empty
    #[derive(Default)]
    struct MockQueue {
        fetches: Mutex<VecDeque<crate::client::Result<Vec<QueueRecord>>>>,
        failing_ids: HashSet<QueueId>,
        fetch_calls: Mutex<usize>,
        removed: Mutex<Vec<QueueId>>,
        stop_after_fetches: Option<(usize, Arc<Notify>)>,
    }

    impl MockQueue {
        fn scripted(fetches: Vec<crate::client::Result<Vec<QueueRecord>>>) -> Self {
            Self {
                fetches: Mutex::new(fetches.into()),
                ..Self::default()
            }
        }

        fn failing(mut self, ids: &[i64]) -> Self {
            self.failing_ids = ids.iter().map(|&id| QueueId::from(id)).collect();
            self
        }

        fn stop_after(mut self, fetches: usize, notify: Arc<Notify>) -> Self {
            self.stop_after_fetches = Some((fetches, notify));
            self
        }

        fn remove_calls(&self) -> Vec<QueueId> {
            self.removed.lock().unwrap().clone()
        }

        fn fetch_count(&self) -> usize {
            *self.fetch_calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl QueueApi for MockQueue {
        async fn fetch_queue(&self) -> crate::client::Result<Vec<QueueRecord>> {
            let calls = {
                let mut calls = self.fetch_calls.lock().unwrap();
                *calls += 1;
                *calls
            };
            if let Some((limit, notify)) = &self.stop_after_fetches {
                if calls == *limit {
                    notify.notify_one();
                }
            }
            self.fetches
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn remove(&self, id: &QueueId) -> crate::client::Result<()> {
            self.removed.lock().unwrap().push(id.clone());
            if self.failing_ids.contains(id) {
                return Err(TransportError::Status {
                    status: 500,
                    reason: "Internal Server Error".to_string(),
                });
            }
            Ok(())
        }
    }

    fn removable(id: i64) -> QueueRecord {
        QueueRecord {
            is_upgrade: Some(false),
            ..QueueRecord::new(id, QueueStatus::Completed)
        }
    }

    fn keep(id: i64) -> QueueRecord {
        QueueRecord {
            is_upgrade: Some(false),
            ..QueueRecord::new(id, QueueStatus::Downloading)
        }
    }

    fn options(secs: u64) -> SweepOptions {
        SweepOptions {
            poll_interval: Duration::from_secs(secs),
            max_backoff: None,
            dry_run: false,
        }
    }

    #[tokio::test]
    async fn test_only_matching_record_is_removed() {
        let api = Arc::new(MockQueue::scripted(vec![Ok(vec![keep(1), removable(2), keep(3)])]));
        let sweeper = Sweeper::new(api.clone(), options(60));

        let report = sweeper.run_cycle().await.unwrap();

        assert_eq!(report.fetched, 3);
        assert_eq!(report.matched, vec![(QueueId::Number(2), RemovalReason::NotAnUpgrade)]);
        assert_eq!(report.removed, vec![QueueId::Number(2)]);
        assert_eq!(api.remove_calls(), vec![QueueId::Number(2)]);
    }

    #[tokio::test]
    async fn test_fetch_failure_removes_nothing() {
        let api = Arc::new(MockQueue::scripted(vec![Err(TransportError::Timeout)]));
        let sweeper = Sweeper::new(api.clone(), options(60));

        let result = sweeper.run_cycle().await;

        assert!(matches!(result, Err(TransportError::Timeout)));
        assert!(api.remove_calls().is_empty());
        assert_eq!(sweeper.metrics().snapshot().fetch_failures, 1);
    }

    #[tokio::test]
    async fn test_removal_failure_does_not_block_others() {
        let api = Arc::new(
            MockQueue::scripted(vec![Ok(vec![removable(1), removable(2), removable(3)])])
                .failing(&[2]),
        );
        let sweeper = Sweeper::new(api.clone(), options(60));

        let report = sweeper.run_cycle().await.unwrap();

        assert_eq!(
            api.remove_calls(),
            vec![QueueId::Number(1), QueueId::Number(2), QueueId::Number(3)]
        );
        assert_eq!(report.removed, vec![QueueId::Number(1), QueueId::Number(3)]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, QueueId::Number(2));
        assert!(!report.is_clean());
        assert_eq!(report.summary(), "fetched 3, removed 2, 1 failed");

        let snapshot = sweeper.metrics().snapshot();
        assert_eq!(snapshot.records_removed, 2);
        assert_eq!(snapshot.removal_failures, 1);
    }

    #[tokio::test]
    async fn test_dry_run_issues_no_deletes() {
        let api = Arc::new(MockQueue::scripted(vec![Ok(vec![removable(5), keep(6)])]));
        let sweeper = Sweeper::new(
            api.clone(),
            SweepOptions {
                dry_run: true,
                ..options(60)
            },
        );

        let report = sweeper.run_cycle().await.unwrap();

        assert!(report.dry_run);
        assert_eq!(report.matched.len(), 1);
        assert!(report.removed.is_empty());
        assert!(api.remove_calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_retries_after_fetch_failure() {
        let stop = Arc::new(Notify::new());
        let api = Arc::new(
            MockQueue::scripted(vec![Err(TransportError::Timeout), Ok(vec![removable(7)])])
                .stop_after(2, stop.clone()),
        );
        let sweeper = Sweeper::new(api.clone(), options(60));

        let start = Instant::now();
        sweeper.run(async move { stop.notified().await }).await;
        let elapsed = start.elapsed();

        assert_eq!(api.fetch_count(), 2);
        assert_eq!(api.remove_calls(), vec![QueueId::Number(7)]);
        assert!(elapsed >= Duration::from_secs(60));
        assert!(elapsed < Duration::from_secs(61));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_sleeps_normally_after_removal_failure() {
        let stop = Arc::new(Notify::new());
        let api = Arc::new(
            MockQueue::scripted(vec![Ok(vec![removable(1), removable(2)])])
                .failing(&[1])
                .stop_after(2, stop.clone()),
        );
        let sweeper = Sweeper::new(api.clone(), options(30));

        let start = Instant::now();
        sweeper.run(async move { stop.notified().await }).await;
        let elapsed = start.elapsed();

        assert_eq!(api.remove_calls(), vec![QueueId::Number(1), QueueId::Number(2)]);
        assert_eq!(api.fetch_count(), 2);
        assert!(elapsed >= Duration::from_secs(30));
        assert!(elapsed < Duration::from_secs(31));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_backs_off_on_repeated_fetch_failures() {
        let stop = Arc::new(Notify::new());
        let api = Arc::new(
            MockQueue::scripted(vec![
                Err(TransportError::Timeout),
                Err(TransportError::Timeout),
                Err(TransportError::Timeout),
            ])
            .stop_after(4, stop.clone()),
        );
        let sweeper = Sweeper::new(
            api.clone(),
            SweepOptions {
                max_backoff: Some(Duration::from_secs(300)),
                ..options(60)
            },
        );

        let start = Instant::now();
        sweeper.run(async move { stop.notified().await }).await;

        // 60s + 120s + 240s between the four fetches
        assert_eq!(api.fetch_count(), 4);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(420));
        assert!(elapsed < Duration::from_secs(421));
    }

    #[test]
    fn test_backoff_delay() {
        let interval = Duration::from_secs(60);
        let max = Some(Duration::from_secs(300));

        assert_eq!(backoff_delay(interval, None, 5), interval);
        assert_eq!(backoff_delay(interval, max, 0), interval);
        assert_eq!(backoff_delay(interval, max, 1), interval);
        assert_eq!(backoff_delay(interval, max, 2), Duration::from_secs(120));
        assert_eq!(backoff_delay(interval, max, 3), Duration::from_secs(240));
        assert_eq!(backoff_delay(interval, max, 4), Duration::from_secs(300));
        assert_eq!(backoff_delay(interval, max, 64), Duration::from_secs(300));
    }

    #[test]
    fn test_options_from_config() {
        let config = SweepConfig {
            poll_interval: crate::config::HumanDuration::from_secs(15),
            max_backoff: Some(crate::config::HumanDuration::from_secs(600)),
            dry_run: true,
        };
        let options = SweepOptions::from(&config);
        assert_eq!(options.poll_interval, Duration::from_secs(15));
        assert_eq!(options.max_backoff, Some(Duration::from_secs(600)));
        assert!(options.dry_run);
    }
}
