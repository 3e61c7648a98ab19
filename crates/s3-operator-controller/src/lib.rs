//! Reconciliation of annotated secrets into S3 backend state
//!
//! - [`fields`]: alternate-key lookup and intent extraction
//! - [`engine`]: the per-record reconciliation state machine
//! - [`controller`]: initial sync, watch loop and periodic resync
//! - [`source`]: change sources (kubectl)

pub mod controller;
pub mod engine;
pub mod error;
pub mod fields;
pub mod index;
pub mod locks;
pub mod source;

pub use controller::{Controller, ControllerSettings, SyncReport};
pub use engine::{BucketAction, Outcome, Reconciler, ReconcilerSettings, UserAction};
pub use error::{ReconcileError, SourceError};
pub use index::ProcessedVersionIndex;
pub use locks::KeyedLocks;
pub use source::{KubectlSource, SecretSource, WatchDecoder};
