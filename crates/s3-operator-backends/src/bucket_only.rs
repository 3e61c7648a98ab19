//! Bucket-only backends (MinIO, Garage)
//!
//! Both systems manage users or keys through their own admin APIs, which this
//! operator does not speak. Only bucket operations are available; user and
//! ownership operations are declined with [`BackendError::Unsupported`].

use crate::config::BackendConfig;
use crate::error::{BackendError, Result};
use crate::object_store::ObjectStore;
use crate::traits::{Backend, UserSpec, UserUpdate};
use async_trait::async_trait;
use tracing::{debug, info};

/// Backend limited to the S3 bucket API
#[derive(Debug)]
pub struct BucketOnlyBackend {
    name: &'static str,
    label: &'static str,
    endpoint_url: String,
    objects: ObjectStore,
}

impl BucketOnlyBackend {
    /// `name` identifies the backend in errors, `label` in log lines
    pub fn new(name: &'static str, label: &'static str, config: &BackendConfig) -> Self {
        Self {
            name,
            label,
            endpoint_url: config.endpoint_url.clone(),
            objects: ObjectStore::new(config),
        }
    }

    pub fn minio(config: &BackendConfig) -> Self {
        Self::new("minio", "MinIO", config)
    }

    pub fn garage(config: &BackendConfig) -> Self {
        Self::new("garage", "Garage", config)
    }

    fn unsupported<T>(&self, operation: &'static str) -> Result<T> {
        Err(BackendError::unsupported(self.name, operation))
    }
}

#[async_trait]
impl Backend for BucketOnlyBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    fn endpoint(&self) -> &str {
        &self.endpoint_url
    }

    async fn test_connection(&self) -> Result<()> {
        info!("Testing connection to {}: {}", self.label, self.endpoint_url);
        let buckets = self.objects.list_buckets().await?;
        info!("Successfully listed {} bucket(s)", buckets.len());
        Ok(())
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        Ok(self.objects.bucket_exists(bucket).await)
    }

    async fn create_bucket(&self, bucket: &str, owner: Option<&str>) -> Result<()> {
        if self.objects.bucket_exists(bucket).await {
            info!("Bucket {} already exists", bucket);
            return Ok(());
        }
        self.objects.create_bucket(bucket).await?;
        if let Some(owner) = owner {
            debug!("{} has no bucket ownership, ignoring owner {}", self.label, owner);
        }
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        self.objects.delete_bucket(bucket).await
    }

    async fn get_bucket_owner(&self, _bucket: &str) -> Result<String> {
        self.unsupported("get-bucket-owner")
    }

    async fn change_bucket_owner(&self, _bucket: &str, _new_owner: &str) -> Result<()> {
        self.unsupported("change-bucket-owner")
    }

    async fn user_exists(&self, _access_key: &str) -> Result<bool> {
        self.unsupported("user-exists")
    }

    async fn create_user(&self, _user: &UserSpec) -> Result<()> {
        self.unsupported("create-user")
    }

    async fn update_user(&self, _access_key: &str, _update: &UserUpdate) -> Result<()> {
        self.unsupported("update-user")
    }

    async fn delete_user(&self, _access_key: &str) -> Result<()> {
        self.unsupported("delete-user")
    }
}
