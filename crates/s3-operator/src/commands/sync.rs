//! Single reconciliation pass

use crate::cli::OperatorArgs;
use anyhow::{bail, Context, Result};
use s3_operator_core::OperatorMetrics;
use std::sync::Arc;
use tracing::info;

pub async fn run(args: &OperatorArgs) -> Result<()> {
    let config = super::load_config(args)?;
    let backend = super::connect_backend(&config).await?;
    let controller = super::build_controller(&config, backend, Arc::new(OperatorMetrics::new()));

    let report = controller.sync().await.context("Failed to list secrets")?;
    info!(
        "Sync complete: {} marked, {} applied, {} skipped, {} failed",
        report.marked, report.applied, report.skipped, report.failed
    );

    if !report.is_clean() {
        bail!("{} secret(s) failed to reconcile", report.failed);
    }
    Ok(())
}
