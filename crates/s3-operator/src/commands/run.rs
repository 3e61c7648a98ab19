//! Long-running operator

use crate::cli::OperatorArgs;
use crate::{server, signal};
use anyhow::{Context, Result};
use s3_operator_core::OperatorMetrics;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub async fn run(args: &OperatorArgs) -> Result<()> {
    let config = super::load_config(args)?;

    info!("Starting S3 operator");
    info!("Backend: {}", config.backend_name);
    info!("Annotation key: {}", config.annotation_key);
    info!("Endpoint: {}", config.endpoint_url);

    let metrics = Arc::new(OperatorMetrics::new());
    let token = CancellationToken::new();
    signal::cancel_on_signal(token.clone());

    let listener = server::bind(config.metrics_port)
        .await
        .with_context(|| format!("Failed to bind metrics port {}", config.metrics_port))?;
    let server = tokio::spawn(server::serve(listener, metrics.clone(), token.clone()));

    let result = async {
        let backend = super::connect_backend(&config).await?;
        let controller = super::build_controller(&config, backend, metrics);
        info!("Starting controller...");
        controller
            .run(token.clone())
            .await
            .context("Controller failed")
    }
    .await;

    token.cancel();
    match server.await {
        Ok(Err(e)) => warn!("Metrics server failed: {e}"),
        Err(e) => warn!("Metrics server task failed: {e}"),
        Ok(Ok(())) => {}
    }

    result?;
    info!("Operator shutdown complete");
    Ok(())
}
