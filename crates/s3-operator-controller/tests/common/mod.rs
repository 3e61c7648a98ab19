//! Shared test support for controller tests
//!
//! - `MockBackend`: in-memory backend with call tracking, failure injection
//!   and optional per-call latency
//! - `MemorySource`: in-memory change source with scripted watch sessions
//! - Record builders

#![allow(dead_code)]

use async_trait::async_trait;
use s3_operator_backends::{Backend, BackendError, UserSpec, UserUpdate};
use s3_operator_controller::{Reconciler, ReconcilerSettings, SecretSource, SourceError};
use s3_operator_core::{ManagedRecord, OperatorMetrics, RecordEvent, DEFAULT_ANNOTATION_KEY};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

pub const ENDPOINT: &str = "http://versitygw.storage:7070";

/// A user as stored by the mock backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockUser {
    pub secret_key: String,
    pub role: Option<String>,
    pub user_id: Option<i64>,
    pub group_id: Option<i64>,
}

#[derive(Default)]
struct MockState {
    users: HashMap<String, MockUser>,
    buckets: HashMap<String, Option<String>>,
    calls: Vec<(String, String)>,
    failing: HashSet<&'static str>,
    owner_lookup_fails: bool,
}

/// In-memory backend honoring the capability contract
pub struct MockBackend {
    endpoint: String,
    user_management: bool,
    latency: Option<Duration>,
    state: Mutex<MockState>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            endpoint: ENDPOINT.to_string(),
            user_management: true,
            latency: None,
            state: Mutex::new(MockState::default()),
        }
    }

    /// Backend that declines user and ownership operations
    pub fn bucket_only() -> Self {
        Self {
            user_management: false,
            ..Self::new()
        }
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn with_user(self, access_key: &str, secret_key: &str) -> Self {
        self.state.lock().unwrap().users.insert(
            access_key.to_string(),
            MockUser {
                secret_key: secret_key.to_string(),
                role: None,
                user_id: None,
                group_id: None,
            },
        );
        self
    }

    pub fn with_bucket(self, name: &str, owner: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .buckets
            .insert(name.to_string(), Some(owner.to_string()));
        self
    }

    /// Make every call of `operation` fail with a 500
    pub fn fail_on(&self, operation: &'static str) {
        self.state.lock().unwrap().failing.insert(operation);
    }

    pub fn recover(&self, operation: &'static str) {
        self.state.lock().unwrap().failing.remove(operation);
    }

    /// Make `get-bucket-owner` fail
    pub fn fail_owner_lookup(&self) {
        self.state.lock().unwrap().owner_lookup_fails = true;
    }

    /// Every call as `(operation, argument)`, in order
    pub fn calls(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Operation names only, in order
    pub fn operations(&self) -> Vec<String> {
        self.calls().into_iter().map(|(op, _)| op).collect()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.calls().iter().filter(|(op, _)| op == operation).count()
    }

    pub fn total_calls(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn user(&self, access_key: &str) -> Option<MockUser> {
        self.state.lock().unwrap().users.get(access_key).cloned()
    }

    pub fn user_count(&self) -> usize {
        self.state.lock().unwrap().users.len()
    }

    /// `None` when the bucket does not exist, `Some(None)` when it has no owner
    pub fn bucket_owner(&self, name: &str) -> Option<Option<String>> {
        self.state.lock().unwrap().buckets.get(name).cloned()
    }

    fn name_static(&self) -> &'static str {
        if self.user_management {
            "mock"
        } else {
            "mock-bucket-only"
        }
    }

    /// Record the call and apply failure injection
    async fn enter(&self, operation: &'static str, argument: &str) -> Result<(), BackendError> {
        let failing = {
            let mut state = self.state.lock().unwrap();
            state.calls.push((operation.to_string(), argument.to_string()));
            state.failing.contains(operation)
        };
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if failing {
            return Err(BackendError::Status {
                operation,
                status: 500,
                body: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn require_user_management(&self, operation: &'static str) -> Result<(), BackendError> {
        if self.user_management {
            Ok(())
        } else {
            Err(BackendError::unsupported(self.name_static(), operation))
        }
    }

    fn not_found(operation: &'static str, what: &str) -> BackendError {
        BackendError::Status {
            operation,
            status: 404,
            body: format!("{} not found", what),
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MockBackend {
    fn name(&self) -> &'static str {
        self.name_static()
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn test_connection(&self) -> Result<(), BackendError> {
        self.enter("test-connection", "").await
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool, BackendError> {
        self.enter("bucket-exists", bucket).await?;
        Ok(self.state.lock().unwrap().buckets.contains_key(bucket))
    }

    async fn create_bucket(&self, bucket: &str, owner: Option<&str>) -> Result<(), BackendError> {
        self.enter("create-bucket", bucket).await?;
        let owner = if self.user_management {
            owner.map(str::to_string)
        } else {
            None
        };
        self.state
            .lock()
            .unwrap()
            .buckets
            .entry(bucket.to_string())
            .or_insert(owner);
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<(), BackendError> {
        self.enter("delete-bucket", bucket).await?;
        match self.state.lock().unwrap().buckets.remove(bucket) {
            Some(_) => Ok(()),
            None => Err(Self::not_found("delete-bucket", bucket)),
        }
    }

    async fn get_bucket_owner(&self, bucket: &str) -> Result<String, BackendError> {
        self.enter("get-bucket-owner", bucket).await?;
        self.require_user_management("get-bucket-owner")?;
        let state = self.state.lock().unwrap();
        if state.owner_lookup_fails {
            return Err(BackendError::protocol("get-bucket-acl", "malformed ACL"));
        }
        match state.buckets.get(bucket) {
            Some(owner) => Ok(owner.clone().unwrap_or_default()),
            None => Err(Self::not_found("get-bucket-owner", bucket)),
        }
    }

    async fn change_bucket_owner(&self, bucket: &str, new_owner: &str) -> Result<(), BackendError> {
        self.enter("change-bucket-owner", bucket).await?;
        self.require_user_management("change-bucket-owner")?;
        match self.state.lock().unwrap().buckets.get_mut(bucket) {
            Some(owner) => {
                *owner = Some(new_owner.to_string());
                Ok(())
            }
            None => Err(Self::not_found("change-bucket-owner", bucket)),
        }
    }

    async fn user_exists(&self, access_key: &str) -> Result<bool, BackendError> {
        self.enter("user-exists", access_key).await?;
        self.require_user_management("user-exists")?;
        Ok(self.state.lock().unwrap().users.contains_key(access_key))
    }

    async fn create_user(&self, user: &UserSpec) -> Result<(), BackendError> {
        self.enter("create-user", &user.access_key).await?;
        self.require_user_management("create-user")?;
        self.state
            .lock()
            .unwrap()
            .users
            .entry(user.access_key.clone())
            .or_insert_with(|| MockUser {
                secret_key: user.secret_key.clone(),
                role: user.role.clone(),
                user_id: user.user_id,
                group_id: user.group_id,
            });
        Ok(())
    }

    async fn update_user(&self, access_key: &str, update: &UserUpdate) -> Result<(), BackendError> {
        self.enter("update-user", access_key).await?;
        self.require_user_management("update-user")?;
        let mut state = self.state.lock().unwrap();
        let user = state
            .users
            .get_mut(access_key)
            .ok_or_else(|| Self::not_found("update-user", access_key))?;
        if let Some(secret) = &update.secret_key {
            user.secret_key = secret.clone();
        }
        if let Some(user_id) = update.user_id {
            user.user_id = Some(user_id);
        }
        if let Some(group_id) = update.group_id {
            user.group_id = Some(group_id);
        }
        Ok(())
    }

    async fn delete_user(&self, access_key: &str) -> Result<(), BackendError> {
        self.enter("delete-user", access_key).await?;
        self.require_user_management("delete-user")?;
        match self.state.lock().unwrap().users.remove(access_key) {
            Some(_) => Ok(()),
            None => Err(Self::not_found("delete-user", access_key)),
        }
    }
}

/// Change source serving a fixed listing and queued watch sessions
pub struct MemorySource {
    records: Mutex<Vec<ManagedRecord>>,
    sessions: Mutex<VecDeque<mpsc::Receiver<RecordEvent>>>,
    list_calls: AtomicUsize,
    watch_calls: AtomicUsize,
    fail_list: AtomicBool,
    hang_list: AtomicBool,
}

impl MemorySource {
    pub fn new(records: Vec<ManagedRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            sessions: Mutex::new(VecDeque::new()),
            list_calls: AtomicUsize::new(0),
            watch_calls: AtomicUsize::new(0),
            fail_list: AtomicBool::new(false),
            hang_list: AtomicBool::new(false),
        }
    }

    pub fn set_records(&self, records: Vec<ManagedRecord>) {
        *self.records.lock().unwrap() = records;
    }

    /// Queue a watch session; events sent on the returned handle are
    /// delivered, and dropping it ends the session.
    pub fn open_session(&self) -> mpsc::Sender<RecordEvent> {
        let (tx, rx) = mpsc::channel(16);
        self.sessions.lock().unwrap().push_back(rx);
        tx
    }

    pub fn fail_listing(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent listings never complete
    pub fn hang_listing(&self, hang: bool) {
        self.hang_list.store(hang, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn watch_calls(&self) -> usize {
        self.watch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretSource for MemorySource {
    async fn list(&self) -> Result<Vec<ManagedRecord>, SourceError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang_list.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(SourceError::CommandFailed {
                program: "memory".to_string(),
                status: Some(1),
                stderr: "listing unavailable".to_string(),
            });
        }
        Ok(self.records.lock().unwrap().clone())
    }

    async fn watch(&self) -> Result<mpsc::Receiver<RecordEvent>, SourceError> {
        self.watch_calls.fetch_add(1, Ordering::SeqCst);
        self.sessions
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| SourceError::Unavailable("no watch session queued".to_string()))
    }
}

/// Record carrying the default marker annotation
pub fn marked_record(namespace: &str, name: &str, version: &str) -> ManagedRecord {
    ManagedRecord::new(namespace, name)
        .with_annotation(DEFAULT_ANNOTATION_KEY, "true")
        .with_resource_version(version)
}

/// Marked record with the three required fields in the `data` source
pub fn credentials_record(
    name: &str,
    version: &str,
    bucket: &str,
    access_key: &str,
    secret_key: &str,
) -> ManagedRecord {
    marked_record("default", name, version)
        .with_data("bucket-name", bucket)
        .with_data("access-key", access_key)
        .with_data("secret-key", secret_key)
}

pub fn reconciler(backend: Arc<MockBackend>) -> Reconciler {
    reconciler_with(backend, ReconcilerSettings::default())
}

pub fn reconciler_with(backend: Arc<MockBackend>, settings: ReconcilerSettings) -> Reconciler {
    Reconciler::new(backend, settings, Arc::new(OperatorMetrics::new()))
}
