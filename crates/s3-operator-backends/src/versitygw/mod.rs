//! VersityGW backend
//!
//! Buckets go through the S3 protocol; users and bucket ownership go through
//! the gateway's admin API: `PATCH` requests to `/create-user`,
//! `/update-user`, `/delete-user`, `/list-users`, `/list-buckets` and
//! `/change-bucket-owner/`, all SigV4-signed with the root credentials.

mod admin;
pub mod signing;
pub mod xml;

pub use admin::AdminClient;

use crate::config::BackendConfig;
use crate::error::{BackendError, Result};
use crate::object_store::ObjectStore;
use crate::traits::{Backend, UserSpec, UserUpdate};
use async_trait::async_trait;
use reqwest::Method;
use tracing::info;

const NAME: &str = "versitygw";

/// Backend for VersityGW with full user management
#[derive(Debug)]
pub struct VersityGw {
    endpoint_url: String,
    objects: ObjectStore,
    admin: AdminClient,
}

impl VersityGw {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        Ok(Self {
            endpoint_url: config.endpoint_url.clone(),
            admin: AdminClient::new(config)?,
            objects: ObjectStore::new(config),
        })
    }

    /// Access keys of every account on the gateway
    pub async fn list_users(&self) -> Result<Vec<String>> {
        let body = self
            .admin
            .send("list-users", Method::PATCH, "/list-users", &[], None)
            .await?;
        xml::parse_user_list(&body).map_err(|e| BackendError::protocol("list-users", e.to_string()))
    }

    /// Bucket names as reported by the admin API
    pub async fn list_buckets(&self) -> Result<Vec<String>> {
        let body = self
            .admin
            .send("list-buckets", Method::PATCH, "/list-buckets", &[], None)
            .await?;
        xml::parse_bucket_list(&body)
            .map_err(|e| BackendError::protocol("list-buckets", e.to_string()))
    }
}

#[async_trait]
impl Backend for VersityGw {
    fn name(&self) -> &'static str {
        NAME
    }

    fn endpoint(&self) -> &str {
        &self.endpoint_url
    }

    async fn test_connection(&self) -> Result<()> {
        info!("Testing connection to VersityGW: {}", self.endpoint_url);

        let buckets = self.list_buckets().await?;
        info!("Successfully listed {} bucket(s)", buckets.len());

        let users = self.list_users().await?;
        info!("Successfully listed {} user(s)", users.len());

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
            self.change_bucket_owner(bucket, owner).await?;
        }
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        self.objects.delete_bucket(bucket).await
    }

    async fn get_bucket_owner(&self, bucket: &str) -> Result<String> {
        let path = format!("/{}", urlencoding::encode(bucket));
        let body = self
            .admin
            .send("get-bucket-acl", Method::GET, &path, &[("acl", "")], None)
            .await?;
        xml::parse_acl_owner(&body).map_err(|e| BackendError::protocol("get-bucket-acl", e.to_string()))
    }

    async fn change_bucket_owner(&self, bucket: &str, new_owner: &str) -> Result<()> {
        self.admin
            .send(
                "change-bucket-owner",
                Method::PATCH,
                "/change-bucket-owner/",
                &[("bucket", bucket), ("owner", new_owner)],
                None,
            )
            .await?;

        info!("Changed owner of bucket {} to {}", bucket, new_owner);
        Ok(())
    }

    async fn user_exists(&self, access_key: &str) -> Result<bool> {
        let users = self.list_users().await?;
        Ok(users.iter().any(|user| user == access_key))
    }

    async fn create_user(&self, user: &UserSpec) -> Result<()> {
        if self.user_exists(&user.access_key).await? {
            info!("User {} already exists", user.access_key);
            return Ok(());
        }

        self.admin
            .send(
                "create-user",
                Method::PATCH,
                "/create-user",
                &[],
                Some(xml::create_user_payload(user)),
            )
            .await?;

        info!("Created user: {}", user.access_key);
        Ok(())
    }

    async fn update_user(&self, access_key: &str, update: &UserUpdate) -> Result<()> {
        self.admin
            .send(
                "update-user",
                Method::PATCH,
                "/update-user",
                &[("access", access_key)],
                Some(xml::update_user_payload(update)),
            )
            .await?;

        info!("Updated user: {}", access_key);
        Ok(())
    }

    async fn delete_user(&self, access_key: &str) -> Result<()> {
        self.admin
            .send(
                "delete-user",
                Method::PATCH,
                "/delete-user",
                &[("access", access_key)],
                None,
            )
            .await?;

        info!("Deleted user: {}", access_key);
        Ok(())
    }
}
