//! # Peer-Mesh Node Runtime
//!
//! The main entry point for the peer-mesh node.
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry (logging + metrics)
//! 2. Load configuration (file, environment, flags)
//! 3. Start the node runtime (consumer, listener, dials)
//! 4. Run until Ctrl-C, then shut down gracefully

use anyhow::{Context, Result};
use clap::Parser;
use mesh_telemetry::{init_telemetry, TelemetryConfig};
use node_runtime::{load_config, Args, NodeRuntime};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging and metrics
    let _telemetry =
        init_telemetry(&TelemetryConfig::from_env()).context("Failed to initialize telemetry")?;

    // Load configuration
    let config = load_config(&args).context("Failed to load configuration")?;
    info!(
        listen = ?config.listen,
        dial = config.dial.len(),
        max_peers = config.network.max_peers,
        "Configuration loaded"
    );

    let runtime = NodeRuntime::new(config)?;
    runtime.run_until_ctrl_c().await
}
