//! Controller error types

use s3_operator_backends::BackendError;
use std::time::Duration;
use thiserror::Error;

/// Why a single record could not be reconciled
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Required fields are missing under every recognized spelling
    #[error("Secret {record} is missing required fields ({})", missing.join(", "))]
    Validation {
        record: String,
        missing: Vec<&'static str>,
    },

    /// The record violates operator policy
    #[error("Secret {record} rejected: {reason}")]
    Policy { record: String, reason: String },

    /// A backend call failed part-way through
    #[error("Secret {record}: failed to {step}: {source}")]
    Backend {
        record: String,
        step: &'static str,
        #[source]
        source: BackendError,
    },
}

impl ReconcileError {
    pub fn validation(record: impl Into<String>, missing: Vec<&'static str>) -> Self {
        Self::Validation {
            record: record.into(),
            missing,
        }
    }

    pub fn backend(record: impl Into<String>, step: &'static str, source: BackendError) -> Self {
        Self::Backend {
            record: record.into(),
            step,
            source,
        }
    }

    /// Identity of the record that failed
    pub fn record(&self) -> &str {
        match self {
            Self::Validation { record, .. }
            | Self::Policy { record, .. }
            | Self::Backend { record, .. } => record,
        }
    }

    /// Whether the next event or resync pass may succeed without the record
    /// being edited
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Validation { .. } | Self::Policy { .. } => false,
            Self::Backend { source, .. } => source.is_transient(),
        }
    }
}

/// Failures of the change source
#[derive(Error, Debug)]
pub enum SourceError {
    /// The helper process could not be started
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The helper process exited unsuccessfully
    #[error("{program} exited with status {}: {stderr}", status.map_or_else(|| "unknown".to_string(), |s| s.to_string()))]
    CommandFailed {
        program: String,
        status: Option<i32>,
        stderr: String,
    },

    /// Output could not be decoded into records
    #[error("Failed to decode secret listing: {0}")]
    Decode(#[from] serde_json::Error),

    /// The helper process did not finish in time
    #[error("{program} did not finish within {timeout:?}")]
    TimedOut { program: String, timeout: Duration },

    /// The source is not available (e.g. no further watch sessions)
    #[error("Change source unavailable: {0}")]
    Unavailable(String),
}
