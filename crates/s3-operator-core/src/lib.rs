//! # s3-operator-core
//!
//! Core library for the S3 operator providing:
//! - Operator configuration and validation
//! - Managed record and reconciliation intent types
//! - The error taxonomy shared by the backends and the controller
//! - Instance-scoped Prometheus metrics

pub mod config;
pub mod error;
pub mod metrics;
pub mod types;

pub use config::{OperatorConfig, DEFAULT_ANNOTATION_KEY, DEFAULT_REGION};
pub use error::{Error, Result};
pub use metrics::{OperatorMetrics, Timer};
pub use types::{EventKind, ExtractedIntent, FieldMap, ManagedRecord, RecordEvent};
