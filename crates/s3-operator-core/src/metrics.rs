//! Operator metrics
//!
//! Counters and histograms live on an [`OperatorMetrics`] instance built once
//! at startup and shared by `Arc`, so independent operators (and tests) never
//! share state through globals.

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::histogram::Histogram;
use prometheus_client::registry::Registry;
use std::time::Instant;

/// Prometheus client default latency buckets, in seconds
const DEFAULT_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Measures elapsed wall time for a histogram observation
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Seconds since the timer was started
    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Reconciliation counters and duration histograms
#[derive(Debug)]
pub struct OperatorMetrics {
    registry: Registry,
    secrets_processed: Counter,
    errors: Counter,
    users_created: Counter,
    users_updated: Counter,
    buckets_created: Counter,
    bucket_owners_changed: Counter,
    sync_duration: Histogram,
    handle_secret_duration: Histogram,
}

impl Default for OperatorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl OperatorMetrics {
    /// Create a metrics instance with every metric registered
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let secrets_processed = Counter::default();
        let errors = Counter::default();
        let users_created = Counter::default();
        let users_updated = Counter::default();
        let buckets_created = Counter::default();
        let bucket_owners_changed = Counter::default();
        let sync_duration = Histogram::new(DEFAULT_BUCKETS.into_iter());
        let handle_secret_duration = Histogram::new(DEFAULT_BUCKETS.into_iter());

        // Counters get the `_total` suffix from the encoder.
        registry.register(
            "s3_operator_secrets_processed",
            "Total number of secrets processed",
            secrets_processed.clone(),
        );
        registry.register(
            "s3_operator_errors",
            "Total number of errors encountered",
            errors.clone(),
        );
        registry.register(
            "s3_operator_users_created",
            "Total number of users created",
            users_created.clone(),
        );
        registry.register(
            "s3_operator_users_updated",
            "Total number of users updated",
            users_updated.clone(),
        );
        registry.register(
            "s3_operator_buckets_created",
            "Total number of buckets created",
            buckets_created.clone(),
        );
        registry.register(
            "s3_operator_bucket_owners_changed",
            "Total number of bucket owners changed",
            bucket_owners_changed.clone(),
        );
        registry.register(
            "s3_operator_sync_duration_seconds",
            "Duration of a sync cycle",
            sync_duration.clone(),
        );
        registry.register(
            "s3_operator_handle_secret_duration_seconds",
            "Duration of handling a secret",
            handle_secret_duration.clone(),
        );

        Self {
            registry,
            secrets_processed,
            errors,
            users_created,
            users_updated,
            buckets_created,
            bucket_owners_changed,
            sync_duration,
            handle_secret_duration,
        }
    }

    pub fn inc_secrets_processed(&self) {
        self.secrets_processed.inc();
    }

    pub fn inc_errors(&self) {
        self.errors.inc();
    }

    pub fn inc_users_created(&self) {
        self.users_created.inc();
    }

    pub fn inc_users_updated(&self) {
        self.users_updated.inc();
    }

    pub fn inc_buckets_created(&self) {
        self.buckets_created.inc();
    }

    pub fn inc_bucket_owners_changed(&self) {
        self.bucket_owners_changed.inc();
    }

    pub fn observe_sync_duration(&self, timer: Timer) {
        self.sync_duration.observe(timer.elapsed_secs());
    }

    pub fn observe_handle_secret_duration(&self, timer: Timer) {
        self.handle_secret_duration.observe(timer.elapsed_secs());
    }

    pub fn secrets_processed(&self) -> u64 {
        self.secrets_processed.get()
    }

    pub fn errors(&self) -> u64 {
        self.errors.get()
    }

    pub fn users_created(&self) -> u64 {
        self.users_created.get()
    }

    pub fn users_updated(&self) -> u64 {
        self.users_updated.get()
    }

    pub fn buckets_created(&self) -> u64 {
        self.buckets_created.get()
    }

    pub fn bucket_owners_changed(&self) -> u64 {
        self.bucket_owners_changed.get()
    }

    /// Render every metric in Prometheus text exposition format
    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let mut buf = String::new();
        encode(&mut buf, &self.registry)?;
        Ok(buf)
    }
}
