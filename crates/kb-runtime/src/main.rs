//! # Knowledge-Base Runtime
//!
//! Starts the event core with every domain module registered and runs until
//! Ctrl+C.

use anyhow::{Context, Result};
use kb_runtime::{KnowledgeRuntime, RuntimeConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = RuntimeConfig::from_env();
    kb_telemetry::init_telemetry(&config.telemetry).context("Failed to initialise telemetry")?;

    let runtime = KnowledgeRuntime::new(config)?;
    runtime.start();

    info!("Runtime is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;

    let snapshot = runtime.bus().metrics().snapshot();
    info!(
        published = snapshot.events_published,
        delivered = snapshot.deliveries(),
        failed = snapshot.deliveries_failed,
        "Final bus metrics"
    );
    Ok(())
}
