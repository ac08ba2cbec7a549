//! Outbreak Sentinel - Main Entry Point

use anyhow::Context;
use api::{init_logging, run_server, AppConfig};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    init_logging(&config.logging)?;

    info!("=== Outbreak Sentinel v{} ===", env!("CARGO_PKG_VERSION"));

    let metrics = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Failed to install Prometheus recorder: {}; continuing without metrics", e);
            None
        }
    };

    run_server(config, metrics).await
}
