//! # Node Runtime
//!
//! Owns one `Node`, the task that consumes its event stream, and the
//! listener task.
//!
//! ## Startup Sequence
//!
//! 1. Start the event consumer
//! 2. Spawn the listener (if a listen address is configured)
//! 3. Dial every configured peer
//!
//! ## Shutdown Sequence
//!
//! 1. Close the node (peers, listener, workers)
//! 2. Wait for the consumer to log the node-closed signal
//! 3. Cancel the consumer

use crate::config::NodeConfig;
use anyhow::{Context, Result};
use mesh_network::{EventKind, Node, ShutdownReport, Signal};
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// How long shutdown waits for the consumer to drain.
const CONSUMER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// The runtime around one node.
pub struct NodeRuntime {
    node: Node,
    config: NodeConfig,
    /// Stops the event consumer.
    consumer_cancel: CancellationToken,
    consumer: Mutex<Option<JoinHandle<()>>>,
}

impl NodeRuntime {
    /// Create a runtime. Nothing runs until `start`.
    ///
    /// # Errors
    ///
    /// Returns error if the network configuration is invalid.
    pub fn new(config: NodeConfig) -> Result<Self> {
        let node = Node::new(config.network.clone()).context("Invalid network configuration")?;
        Ok(Self {
            node,
            config,
            consumer_cancel: CancellationToken::new(),
            consumer: Mutex::new(None),
        })
    }

    /// The node driven by this runtime.
    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Start consuming events, listening and dialing.
    ///
    /// Dial failures are logged and do not abort startup.
    ///
    /// # Errors
    ///
    /// Returns error if the runtime was already started.
    pub async fn start(&self) -> Result<()> {
        info!("===========================================");
        info!("  Peer-Mesh Node Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        {
            let mut consumer = self.consumer.lock().await;
            if consumer.is_some() {
                anyhow::bail!("Runtime already started");
            }
            let events = self.node.events(self.consumer_cancel.clone());
            *consumer = Some(tokio::spawn(log_events(events)));
        }

        if let Some(addr) = self.config.listen.clone() {
            let node = self.node.clone();
            tokio::spawn(async move {
                if let Err(e) = node.listen(&addr).await {
                    error!(addr = %addr, error = %e, "Listener stopped");
                }
            });
        }

        for target in &self.config.dial {
            match self.node.dial(target).await {
                Ok(peer) => info!(peer = %peer, "Dialed peer"),
                Err(e) => warn!(addr = %target, error = %e, "Dial failed"),
            }
        }

        info!(
            listen = ?self.config.listen,
            max_peers = self.config.network.max_peers,
            "Node is running"
        );
        Ok(())
    }

    /// Close the node and stop the consumer.
    ///
    /// # Errors
    ///
    /// Returns error if the node was already closed.
    pub async fn shutdown(&self) -> Result<ShutdownReport> {
        info!("Initiating graceful shutdown...");

        let report = self.node.close().await.context("Failed to close node")?;
        for failure in &report.failures {
            warn!(error = %failure, "Peer did not close cleanly");
        }

        if let Some(consumer) = self.consumer.lock().await.take() {
            if tokio::time::timeout(CONSUMER_DRAIN_TIMEOUT, consumer)
                .await
                .is_err()
            {
                warn!("Event consumer did not drain in time");
            }
        }
        self.consumer_cancel.cancel();

        info!(closed = report.closed, "Shutdown complete");
        Ok(report)
    }

    /// Start, wait for Ctrl-C, then shut down.
    ///
    /// # Errors
    ///
    /// Returns error if startup, the signal handler or shutdown fails.
    pub async fn run_until_ctrl_c(&self) -> Result<()> {
        self.start().await?;
        info!("Press Ctrl+C to stop.");
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for Ctrl-C")?;
        self.shutdown().await?;
        Ok(())
    }
}

/// Log every signal until the node-closed signal arrives or the stream ends.
async fn log_events(mut events: mpsc::Receiver<Signal>) {
    while let Some(signal) = events.recv().await {
        let origin = signal.origin().map(|id| id.as_str()).unwrap_or("-");
        match signal.kind() {
            EventKind::MessageReceived => info!(
                target: "events",
                peer = origin,
                bytes = signal.payload().len(),
                payload = %String::from_utf8_lossy(signal.payload()),
                "Message received"
            ),
            EventKind::PeerDisconnected if signal.origin().is_none() => {
                info!(target: "events", addr = ?signal.payload_str(), "Node closed");
                break;
            }
            kind => info!(target: "events", kind = %kind, peer = origin, "Peer event"),
        }
    }
}
