//! Processed-version index
//!
//! Remembers the version of each record that was last reconciled
//! successfully, so duplicate deliveries of an unchanged record are skipped.
//! Not authoritative: a full resync ignores it.

use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct ProcessedVersionIndex {
    versions: RwLock<HashMap<String, String>>,
}

impl ProcessedVersionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `version` is the last successfully reconciled version of `key`
    pub async fn is_current(&self, key: &str, version: &str) -> bool {
        self.versions
            .read()
            .await
            .get(key)
            .is_some_and(|seen| seen == version)
    }

    pub async fn record(&self, key: impl Into<String>, version: impl Into<String>) {
        self.versions.write().await.insert(key.into(), version.into());
    }

    pub async fn remove(&self, key: &str) -> Option<String> {
        self.versions.write().await.remove(key)
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.versions.read().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.versions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_and_compare() {
        let index = ProcessedVersionIndex::new();
        assert!(!index.is_current("ns/a", "1").await);

        index.record("ns/a", "1").await;
        assert!(index.is_current("ns/a", "1").await);
        assert!(!index.is_current("ns/a", "2").await);

        index.record("ns/a", "2").await;
        assert_eq!(index.get("ns/a").await.as_deref(), Some("2"));
        assert_eq!(index.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let index = ProcessedVersionIndex::new();
        index.record("ns/a", "1").await;
        assert_eq!(index.remove("ns/a").await.as_deref(), Some("1"));
        assert!(index.is_empty().await);
        assert_eq!(index.remove("ns/a").await, None);
    }
}
