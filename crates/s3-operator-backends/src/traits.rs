//! Backend capability contract

use crate::error::Result;
use async_trait::async_trait;
use std::fmt;

/// A user to create on the backend
#[derive(Clone, PartialEq, Eq)]
pub struct UserSpec {
    pub access_key: String,
    pub secret_key: String,
    pub role: Option<String>,
    pub user_id: Option<i64>,
    pub group_id: Option<i64>,
}

impl UserSpec {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            role: None,
            user_id: None,
            group_id: None,
        }
    }
}

impl fmt::Debug for UserSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserSpec")
            .field("access_key", &self.access_key)
            .field("role", &self.role)
            .field("user_id", &self.user_id)
            .field("group_id", &self.group_id)
            .finish_non_exhaustive()
    }
}

/// Mutable properties of an existing user.
///
/// `None` leaves the stored value untouched.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub secret_key: Option<String>,
    pub user_id: Option<i64>,
    pub group_id: Option<i64>,
}

impl fmt::Debug for UserUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserUpdate")
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("user_id", &self.user_id)
            .field("group_id", &self.group_id)
            .finish()
    }
}

/// Operations every S3-compatible storage backend offers.
///
/// Every call may block on network I/O and is bounded by the configured
/// request timeout. Dropping the returned future abandons the call.
///
/// Backends without user management return
/// [`BackendError::Unsupported`](crate::BackendError::Unsupported) from
/// `user_exists`, `create_user`, `update_user`, `delete_user`,
/// `get_bucket_owner` and `change_bucket_owner`.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Backend name (e.g. "versitygw")
    fn name(&self) -> &'static str;

    /// Configured endpoint; no I/O
    fn endpoint(&self) -> &str;

    /// Round-trip to the backend to prove the credentials work
    async fn test_connection(&self) -> Result<()>;

    /// Whether the bucket exists.
    ///
    /// Backends without a reliable not-found signal report any lookup
    /// failure as "does not exist".
    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    /// Create a bucket; succeeds without changes when it already exists
    async fn create_bucket(&self, bucket: &str, owner: Option<&str>) -> Result<()>;

    async fn delete_bucket(&self, bucket: &str) -> Result<()>;

    /// Access key of the bucket owner
    async fn get_bucket_owner(&self, bucket: &str) -> Result<String>;

    async fn change_bucket_owner(&self, bucket: &str, new_owner: &str) -> Result<()>;

    async fn user_exists(&self, access_key: &str) -> Result<bool>;

    /// Create a user; succeeds without changes when it already exists
    async fn create_user(&self, user: &UserSpec) -> Result<()>;

    /// Overwrite the supplied properties of an existing user
    async fn update_user(&self, access_key: &str, update: &UserUpdate) -> Result<()>;

    async fn delete_user(&self, access_key: &str) -> Result<()>;
}
