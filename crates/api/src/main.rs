//! Celestial Archive - Main Entry Point

use anyhow::Context;
use api::{init_logging, run_server, AppSettings};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = AppSettings::load().context("loading settings")?;
    init_logging(&settings.logging).context("initialising logging")?;

    info!("=== Celestial Archive v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        replay_dir = %settings.camera.replay_dir.display(),
        model_dir = %settings.detection.model_dir.display(),
        prompts = settings.prompt.endpoint.is_some(),
        "Starting reflection companion..."
    );

    run_server(settings).await.context("running server")?;

    Ok(())
}
