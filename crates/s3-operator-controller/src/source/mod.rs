//! Change sources that feed records to the controller

mod kubectl;

pub use kubectl::{parse_secret_list, KubectlSource, WatchDecoder};

use crate::error::SourceError;
use async_trait::async_trait;
use s3_operator_core::{ManagedRecord, RecordEvent};
use tokio::sync::mpsc;

/// Supplies records and change events.
///
/// Delivery is at-least-once and may have gaps; the controller compensates
/// with periodic full listings.
#[async_trait]
pub trait SecretSource: Send + Sync {
    /// Every current record, marked or not
    async fn list(&self) -> Result<Vec<ManagedRecord>, SourceError>;

    /// Start one watch session. The receiver closes when the session ends.
    async fn watch(&self) -> Result<mpsc::Receiver<RecordEvent>, SourceError>;
}
