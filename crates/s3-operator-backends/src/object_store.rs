//! Bucket operations over the standard S3 protocol
//!
//! Shared by every backend. The client uses path-style addressing (required
//! by most S3-compatible gateways), static root credentials, and has SDK
//! retries disabled: retrying is left to the next event or resync pass.

use crate::config::BackendConfig;
use crate::error::{BackendError, Result};
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::timeout::TimeoutConfig;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client;
use tracing::{debug, info};

/// S3 protocol client for bucket CRUD
#[derive(Clone)]
pub struct ObjectStore {
    client: Client,
}

impl ObjectStore {
    /// Build a client for the configured endpoint
    pub fn new(config: &BackendConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "s3-operator",
        );

        let s3_config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(&config.endpoint_url)
            .credentials_provider(credentials)
            .force_path_style(true)
            .retry_config(RetryConfig::disabled())
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(config.request_timeout)
                    .build(),
            )
            .build();

        Self {
            client: Client::from_conf(s3_config),
        }
    }

    /// Whether the bucket exists.
    ///
    /// Every HEAD failure, not just 404, is reported as "does not exist":
    /// a spurious negative only leads to an idempotent create attempt,
    /// while a surfaced error would block bucket creation entirely.
    pub async fn bucket_exists(&self, bucket: &str) -> bool {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => true,
            Err(e) => {
                debug!(
                    "HEAD bucket {} failed, treating as absent: {}",
                    bucket,
                    DisplayErrorContext(&e)
                );
                false
            }
        }
    }

    pub async fn create_bucket(&self, bucket: &str) -> Result<()> {
        self.client
            .create_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| {
                BackendError::object_store("create-bucket", DisplayErrorContext(&e).to_string())
            })?;

        info!("Created bucket: {}", bucket);
        Ok(())
    }

    pub async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        self.client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| {
                BackendError::object_store("delete-bucket", DisplayErrorContext(&e).to_string())
            })?;

        info!("Deleted bucket: {}", bucket);
        Ok(())
    }

    /// Names of every bucket visible to the root credentials
    pub async fn list_buckets(&self) -> Result<Vec<String>> {
        let resp = self.client.list_buckets().send().await.map_err(|e| {
            BackendError::object_store("list-buckets", DisplayErrorContext(&e).to_string())
        })?;

        let names: Vec<String> = resp
            .buckets()
            .iter()
            .filter_map(|b| b.name().map(str::to_string))
            .collect();

        debug!("Listed {} bucket(s)", names.len());
        Ok(names)
    }
}

impl std::fmt::Debug for ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStore").finish_non_exhaustive()
    }
}
