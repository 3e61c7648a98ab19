//! Watch and resync driver
//!
//! After an initial full sync, two loops run side by side until the
//! cancellation token fires:
//!
//! - the watch loop consumes change events and reconciles records whose
//!   version has not been processed yet, restarting the watch whenever a
//!   session ends;
//! - the resync loop periodically lists every record and reconciles all
//!   marked ones unconditionally, covering events the watch missed.
//!
//! Cancellation stops both loops between records. A reconciliation that is
//! already running finishes; no new one starts.

use crate::engine::{Outcome, Reconciler};
use crate::error::SourceError;
use crate::index::ProcessedVersionIndex;
use crate::source::SecretSource;
use s3_operator_core::{EventKind, ManagedRecord, RecordEvent, Timer};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Timing of the controller loops
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// Interval between full resync passes
    pub resync_interval: Duration,
    /// Pause after a watch session fails to start
    pub watch_retry_delay: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            resync_interval: Duration::from_secs(300),
            watch_retry_delay: Duration::from_secs(5),
        }
    }
}

/// Result of one full sync pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Marked records found
    pub marked: usize,
    pub applied: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

pub struct Controller {
    source: Arc<dyn SecretSource>,
    reconciler: Arc<Reconciler>,
    index: ProcessedVersionIndex,
    settings: ControllerSettings,
}

impl Controller {
    pub fn new(
        source: Arc<dyn SecretSource>,
        reconciler: Arc<Reconciler>,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            source,
            reconciler,
            index: ProcessedVersionIndex::new(),
            settings,
        }
    }

    pub fn index(&self) -> &ProcessedVersionIndex {
        &self.index
    }

    pub fn reconciler(&self) -> &Arc<Reconciler> {
        &self.reconciler
    }

    /// Run until `token` is cancelled.
    ///
    /// Fails only when the initial listing fails.
    pub async fn run(&self, token: CancellationToken) -> Result<(), SourceError> {
        info!("Performing initial sync...");
        let report = self.sync_until(&token).await?;
        info!(
            "Initial sync complete: {} applied, {} skipped, {} failed",
            report.applied, report.skipped, report.failed
        );

        info!("Starting watch loop...");
        tokio::join!(self.watch_loop(&token), self.resync_loop(&token));

        info!("Controller stopped");
        Ok(())
    }

    /// One full pass over every marked record
    pub async fn sync(&self) -> Result<SyncReport, SourceError> {
        self.sync_until(&CancellationToken::new()).await
    }

    async fn sync_until(&self, token: &CancellationToken) -> Result<SyncReport, SourceError> {
        let timer = Timer::start();
        let result = self.sync_records(token).await;
        self.reconciler.metrics().observe_sync_duration(timer);
        result
    }

    async fn sync_records(&self, token: &CancellationToken) -> Result<SyncReport, SourceError> {
        let listing = tokio::select! {
            biased;
            _ = token.cancelled() => {
                info!("Sync interrupted by shutdown");
                return Ok(SyncReport::default());
            }
            listing = self.source.list() => listing?,
        };

        let records: Vec<ManagedRecord> = listing
            .into_iter()
            .filter(|record| self.reconciler.is_marked(record))
            .collect();

        info!("Found {} annotated secret(s)", records.len());

        let mut report = SyncReport {
            marked: records.len(),
            ..Default::default()
        };

        for record in &records {
            if token.is_cancelled() {
                info!("Sync interrupted by shutdown");
                break;
            }
            match self.reconciler.reconcile(record).await {
                Ok(Outcome::Applied { .. }) => {
                    self.index
                        .record(record.key(), record.resource_version.clone())
                        .await;
                    report.applied += 1;
                }
                Ok(_) => report.skipped += 1,
                Err(_) => report.failed += 1,
            }
        }

        Ok(report)
    }

    /// Apply one change event
    pub async fn handle_event(&self, event: RecordEvent) {
        let RecordEvent { kind, record } = event;
        let key = record.key();

        match kind {
            EventKind::Deleted => {
                if self.index.remove(&key).await.is_some() {
                    info!(record = %key, "Secret deleted");
                }
            }
            EventKind::Added | EventKind::Modified => {
                if !self.reconciler.is_marked(&record) {
                    return;
                }
                if self.index.is_current(&key, &record.resource_version).await {
                    debug!(record = %key, version = %record.resource_version, "Already processed");
                    return;
                }

                info!(record = %key, event = %kind, "Processing secret");
                if let Ok(Outcome::Applied { .. }) = self.reconciler.reconcile(&record).await {
                    self.index.record(key, record.resource_version).await;
                }
            }
        }
    }

    async fn watch_loop(&self, token: &CancellationToken) {
        loop {
            let session = tokio::select! {
                _ = token.cancelled() => break,
                session = self.source.watch() => session,
            };

            match session {
                Ok(events) => {
                    self.consume(events, token).await;
                    if token.is_cancelled() {
                        break;
                    }
                    info!("Watch channel closed, will restart");
                }
                Err(e) => {
                    error!("Failed to start watch: {}", e);
                    tokio::select! {
                        _ = token.cancelled() => break,
                        _ = tokio::time::sleep(self.settings.watch_retry_delay) => {}
                    }
                }
            }
        }
        info!("Watch loop stopped");
    }

    async fn consume(&self, mut events: mpsc::Receiver<RecordEvent>, token: &CancellationToken) {
        loop {
            let event = tokio::select! {
                biased;
                _ = token.cancelled() => return,
                event = events.recv() => event,
            };
            match event {
                Some(event) => self.handle_event(event).await,
                None => return,
            }
        }
    }

    async fn resync_loop(&self, token: &CancellationToken) {
        let mut ticker = tokio::time::interval(self.settings.resync_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; the initial sync covered it.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            info!("Starting periodic resync");
            match self.sync_until(token).await {
                Ok(report) if report.is_clean() => {
                    debug!("Resync complete: {} applied, {} skipped", report.applied, report.skipped)
                }
                Ok(report) => warn!("Resync finished with {} failed secret(s)", report.failed),
                Err(e) => error!("Resync failed: {}", e),
            }
        }
        info!("Resync loop stopped");
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("reconciler", &self.reconciler)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
