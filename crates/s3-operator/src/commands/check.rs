//! Backend connectivity check

use crate::cli::OperatorArgs;
use anyhow::Result;
use tracing::info;

pub async fn run(args: &OperatorArgs) -> Result<()> {
    let config = super::load_config(args)?;
    let backend = super::connect_backend(&config).await?;
    info!(
        "Backend {} at {} is reachable",
        backend.name(),
        backend.endpoint()
    );
    Ok(())
}
