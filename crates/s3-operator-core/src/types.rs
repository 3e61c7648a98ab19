//! Record and intent types
//!
//! A [`ManagedRecord`] is the operator's view of one secret. It is observed,
//! never mutated. An [`ExtractedIntent`] is derived from it once per
//! reconciliation attempt.

use std::collections::BTreeMap;
use std::fmt;

/// Case-sensitive string map of secret fields
pub type FieldMap = BTreeMap<String, String>;

/// One secret as seen by the operator
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ManagedRecord {
    /// Namespace of the secret
    pub namespace: String,
    /// Name of the secret
    pub name: String,
    /// Secret annotations; the marker key lives here
    pub annotations: BTreeMap<String, String>,
    /// Decoded binary data source
    pub data: FieldMap,
    /// Plain-text data source, wins over `data` on key collision
    pub string_data: FieldMap,
    /// Opaque version token that changes on every mutation
    pub resource_version: String,
}

impl ManagedRecord {
    /// Create an empty record with the given identity
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add an annotation
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Add a field to the binary data source
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Add a field to the plain-text data source
    pub fn with_string_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.string_data.insert(key.into(), value.into());
        self
    }

    /// Set the version token
    pub fn with_resource_version(mut self, version: impl Into<String>) -> Self {
        self.resource_version = version.into();
        self
    }

    /// Namespace-scoped identifier (`namespace/name`)
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    /// Whether the record carries the marker annotation.
    ///
    /// Only presence matters; the annotation value is ignored.
    pub fn has_marker(&self, marker_key: &str) -> bool {
        self.annotations.contains_key(marker_key)
    }

    /// Flatten both field sources into one map, plain-text source last
    pub fn fields(&self) -> FieldMap {
        let mut merged = self.data.clone();
        for (key, value) in &self.string_data {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }
}

impl fmt::Debug for ManagedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Field values are credentials; only their keys are printed.
        f.debug_struct("ManagedRecord")
            .field("namespace", &self.namespace)
            .field("name", &self.name)
            .field("annotations", &self.annotations)
            .field("data", &self.data.keys().collect::<Vec<_>>())
            .field("string_data", &self.string_data.keys().collect::<Vec<_>>())
            .field("resource_version", &self.resource_version)
            .finish()
    }
}

/// Kind of change delivered by the change source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Added,
    Modified,
    Deleted,
}

impl EventKind {
    /// Parse the watch event type used by the Kubernetes API
    pub fn from_watch_type(value: &str) -> Option<Self> {
        match value {
            "ADDED" => Some(Self::Added),
            "MODIFIED" => Some(Self::Modified),
            "DELETED" => Some(Self::Deleted),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Added => write!(f, "added"),
            EventKind::Modified => write!(f, "modified"),
            EventKind::Deleted => write!(f, "deleted"),
        }
    }
}

/// A single change notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEvent {
    pub kind: EventKind,
    pub record: ManagedRecord,
}

impl RecordEvent {
    pub fn new(kind: EventKind, record: ManagedRecord) -> Self {
        Self { kind, record }
    }
}

/// What a record asks the backend to converge to
#[derive(Clone, PartialEq, Eq)]
pub struct ExtractedIntent {
    pub bucket_name: String,
    pub access_key: String,
    pub secret_key: String,
    pub endpoint_url: Option<String>,
    pub role: Option<String>,
    pub user_id: Option<i64>,
    pub group_id: Option<i64>,
}

impl fmt::Debug for ExtractedIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractedIntent")
            .field("bucket_name", &self.bucket_name)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("endpoint_url", &self.endpoint_url)
            .field("role", &self.role)
            .field("user_id", &self.user_id)
            .field("group_id", &self.group_id)
            .finish()
    }
}
