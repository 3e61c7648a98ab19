//! Reconciliation engine
//!
//! Maps one observed record to a sequence of idempotent backend calls:
//!
//! 1. Records without the marker annotation are skipped.
//! 2. Required fields are resolved; any missing one fails validation.
//! 3. With endpoint enforcement, a record naming a different endpoint is
//!    skipped without touching the backend.
//! 4. The user is created, or updated with the (possibly new) secret.
//! 5. The bucket is created owned by the user, or its owner is repaired.
//!
//! The user step always runs before the bucket step since bucket creation
//! assigns the user as owner.

use crate::error::ReconcileError;
use crate::fields;
use crate::locks::KeyedLocks;
use s3_operator_backends::{Backend, UserSpec, UserUpdate};
use s3_operator_core::{ExtractedIntent, ManagedRecord, OperatorMetrics, Timer};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Policy knobs of the engine
#[derive(Debug, Clone)]
pub struct ReconcilerSettings {
    /// Annotation key whose presence opts a record in
    pub marker_key: String,
    /// Skip records naming an endpoint other than the backend's
    pub enforce_endpoint: bool,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self {
            marker_key: s3_operator_core::DEFAULT_ANNOTATION_KEY.to_string(),
            enforce_endpoint: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Created,
    Updated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketAction {
    Created,
    OwnerChanged,
    Unchanged,
}

/// Terminal state of a successful or skipped reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied {
        user: UserAction,
        bucket: BucketAction,
    },
    SkippedUnmarked,
    SkippedEndpointMismatch {
        requested: String,
    },
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Applied { .. } => write!(f, "applied"),
            Outcome::SkippedUnmarked => write!(f, "skipped (unmarked)"),
            Outcome::SkippedEndpointMismatch { .. } => write!(f, "skipped (endpoint mismatch)"),
        }
    }
}

/// Drives one backend on behalf of many records
pub struct Reconciler {
    backend: Arc<dyn Backend>,
    settings: ReconcilerSettings,
    metrics: Arc<OperatorMetrics>,
    locks: KeyedLocks,
}

impl Reconciler {
    pub fn new(
        backend: Arc<dyn Backend>,
        settings: ReconcilerSettings,
        metrics: Arc<OperatorMetrics>,
    ) -> Self {
        Self {
            backend,
            settings,
            metrics,
            locks: KeyedLocks::new(),
        }
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub fn settings(&self) -> &ReconcilerSettings {
        &self.settings
    }

    pub fn metrics(&self) -> &Arc<OperatorMetrics> {
        &self.metrics
    }

    /// Whether the record carries the configured marker
    pub fn is_marked(&self, record: &ManagedRecord) -> bool {
        record.has_marker(&self.settings.marker_key)
    }

    /// Reconcile one record and log its terminal state.
    ///
    /// Failures are counted in the error metric and returned; they never
    /// affect other records.
    pub async fn reconcile(&self, record: &ManagedRecord) -> Result<Outcome, ReconcileError> {
        let key = record.key();

        if !self.is_marked(record) {
            debug!(record = %key, "Skipping secret without marker annotation");
            return Ok(Outcome::SkippedUnmarked);
        }

        let timer = Timer::start();
        self.metrics.inc_secrets_processed();
        let result = self.reconcile_marked(&key, record).await;
        self.metrics.observe_handle_secret_duration(timer);

        match &result {
            Ok(Outcome::Applied { user, bucket }) => {
                info!(record = %key, ?user, ?bucket, "Secret reconciled");
            }
            Ok(Outcome::SkippedEndpointMismatch { requested }) => {
                warn!(
                    record = %key,
                    "Skipping secret {}: endpoint URL {} does not match operator configuration {}",
                    key,
                    requested,
                    self.backend.endpoint()
                );
            }
            Ok(Outcome::SkippedUnmarked) => {}
            Err(e) => {
                self.metrics.inc_errors();
                error!(record = %key, retryable = e.is_retryable(), "Error handling secret: {}", e);
            }
        }

        result
    }

    async fn reconcile_marked(
        &self,
        key: &str,
        record: &ManagedRecord,
    ) -> Result<Outcome, ReconcileError> {
        let intent = fields::extract_intent(&record.fields())
            .map_err(|missing| ReconcileError::validation(key, missing))?;

        if let Some(requested) = self.endpoint_mismatch(&intent) {
            return Ok(Outcome::SkippedEndpointMismatch {
                requested: requested.to_string(),
            });
        }

        let _guards = self
            .locks
            .lock_all(&[
                format!("user:{}", intent.access_key),
                format!("bucket:{}", intent.bucket_name),
            ])
            .await;

        let user = self.reconcile_user(key, &intent).await?;
        let bucket = self.reconcile_bucket(key, &intent).await?;

        Ok(Outcome::Applied { user, bucket })
    }

    /// The endpoint a record asks for, when enforcement rejects it
    fn endpoint_mismatch<'a>(&self, intent: &'a ExtractedIntent) -> Option<&'a str> {
        if !self.settings.enforce_endpoint {
            return None;
        }
        intent
            .endpoint_url
            .as_deref()
            .filter(|requested| !requested.is_empty() && *requested != self.backend.endpoint())
    }

    async fn reconcile_user(
        &self,
        key: &str,
        intent: &ExtractedIntent,
    ) -> Result<UserAction, ReconcileError> {
        let exists = self
            .backend
            .user_exists(&intent.access_key)
            .await
            .map_err(|e| ReconcileError::backend(key, "check if user exists", e))?;

        if !exists {
            let user = UserSpec {
                role: intent.role.clone(),
                user_id: intent.user_id,
                group_id: intent.group_id,
                ..UserSpec::new(intent.access_key.clone(), intent.secret_key.clone())
            };
            self.backend
                .create_user(&user)
                .await
                .map_err(|e| ReconcileError::backend(key, "create user", e))?;
            self.metrics.inc_users_created();
            return Ok(UserAction::Created);
        }

        let update = UserUpdate {
            secret_key: Some(intent.secret_key.clone()),
            user_id: intent.user_id,
            group_id: intent.group_id,
        };
        self.backend
            .update_user(&intent.access_key, &update)
            .await
            .map_err(|e| ReconcileError::backend(key, "update user", e))?;
        self.metrics.inc_users_updated();
        Ok(UserAction::Updated)
    }

    async fn reconcile_bucket(
        &self,
        key: &str,
        intent: &ExtractedIntent,
    ) -> Result<BucketAction, ReconcileError> {
        let bucket = intent.bucket_name.as_str();
        let exists = self
            .backend
            .bucket_exists(bucket)
            .await
            .map_err(|e| ReconcileError::backend(key, "check if bucket exists", e))?;

        if !exists {
            self.backend
                .create_bucket(bucket, Some(&intent.access_key))
                .await
                .map_err(|e| ReconcileError::backend(key, "create bucket", e))?;
            self.metrics.inc_buckets_created();
            return Ok(BucketAction::Created);
        }

        let owner = match self.backend.get_bucket_owner(bucket).await {
            Ok(owner) => owner,
            Err(e) => {
                debug!(record = %key, bucket, "Bucket owner unavailable, skipping ownership check: {}", e);
                return Ok(BucketAction::Unchanged);
            }
        };

        if owner == intent.access_key {
            return Ok(BucketAction::Unchanged);
        }

        self.backend
            .change_bucket_owner(bucket, &intent.access_key)
            .await
            .map_err(|e| ReconcileError::backend(key, "change bucket owner", e))?;
        self.metrics.inc_bucket_owners_changed();
        Ok(BucketAction::OwnerChanged)
    }
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("backend", &self.backend.name())
            .field("endpoint", &self.backend.endpoint())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
