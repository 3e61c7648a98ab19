//! Storage backend adapters for the S3 operator
//!
//! Every backend implements the [`Backend`] capability contract:
//!
//! - VersityGW (full user lifecycle over its signed admin API)
//! - MinIO (bucket operations only)
//! - Garage (bucket operations only)
//!
//! Bucket-only backends answer user and ownership operations with
//! [`BackendError::Unsupported`] so the reconciliation path stays uniform.

pub mod bucket_only;
pub mod config;
pub mod error;
pub mod object_store;
pub mod traits;
pub mod versitygw;

pub use config::{BackendConfig, BackendKind};
pub use error::{BackendError, Result};
pub use traits::{Backend, UserSpec, UserUpdate};

use std::sync::Arc;

/// Create a backend instance for the given kind
pub fn create_backend(kind: BackendKind, config: &BackendConfig) -> Result<Arc<dyn Backend>> {
    match kind {
        BackendKind::VersityGw => Ok(Arc::new(versitygw::VersityGw::new(config)?)),
        BackendKind::Minio => Ok(Arc::new(bucket_only::BucketOnlyBackend::minio(config))),
        BackendKind::Garage => Ok(Arc::new(bucket_only::BucketOnlyBackend::garage(config))),
    }
}

/// Create a backend instance from its configured name
pub fn create_backend_by_name(name: &str, config: &BackendConfig) -> Result<Arc<dyn Backend>> {
    let kind = name.parse::<BackendKind>()?;
    create_backend(kind, config)
}
