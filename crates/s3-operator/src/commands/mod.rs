//! Command implementations

pub mod check;
pub mod run;
pub mod sync;

use crate::cli::OperatorArgs;
use anyhow::{Context, Result};
use s3_operator_backends::{create_backend_by_name, Backend, BackendConfig};
use s3_operator_controller::{
    Controller, ControllerSettings, KubectlSource, Reconciler, ReconcilerSettings,
};
use s3_operator_core::{OperatorConfig, OperatorMetrics};
use std::sync::Arc;
use tracing::info;

/// Build and validate the configuration from parsed arguments
pub(crate) fn load_config(args: &OperatorArgs) -> Result<OperatorConfig> {
    let config = args.to_config();
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Create the configured backend and prove the credentials work
pub(crate) async fn connect_backend(config: &OperatorConfig) -> Result<Arc<dyn Backend>> {
    let backend = create_backend_by_name(&config.backend_name, &BackendConfig::from(config))
        .with_context(|| format!("Failed to initialize backend '{}'", config.backend_name))?;

    info!("Testing backend connection...");
    backend
        .test_connection()
        .await
        .context("Backend connection test failed")?;
    info!("Backend connection test passed");

    Ok(backend)
}

/// Wire the reconciler and the kubectl change source into a controller
pub(crate) fn build_controller(
    config: &OperatorConfig,
    backend: Arc<dyn Backend>,
    metrics: Arc<OperatorMetrics>,
) -> Controller {
    let reconciler = Reconciler::new(backend, reconciler_settings(config), metrics);

    let source = KubectlSource::new()
        .with_binary_path(config.kubectl.clone())
        .with_kubeconfig(config.kubeconfig.clone())
        .with_request_timeout(config.request_timeout)
        .with_watch_timeout(config.watch_timeout);

    Controller::new(
        Arc::new(source),
        Arc::new(reconciler),
        controller_settings(config),
    )
}

fn reconciler_settings(config: &OperatorConfig) -> ReconcilerSettings {
    ReconcilerSettings {
        marker_key: config.annotation_key.clone(),
        enforce_endpoint: config.enforce_endpoint,
    }
}

fn controller_settings(config: &OperatorConfig) -> ControllerSettings {
    ControllerSettings {
        resync_interval: config.resync_interval,
        ..Default::default()
    }
}
