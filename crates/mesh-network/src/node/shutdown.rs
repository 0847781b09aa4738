//! Node shutdown and single-peer disconnect.

use super::core::Node;
use crate::error::{NetworkError, Result};
use mesh_telemetry::metrics::PEERS_CONNECTED;
use shared_types::PeerId;
use std::sync::atomic::Ordering;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Outcome of `Node::close`.
#[derive(Debug, Default)]
pub struct ShutdownReport {
    /// Connections closed cleanly.
    pub closed: usize,
    /// One `NetworkError::Close` per connection whose close failed.
    pub failures: Vec<NetworkError>,
}

impl ShutdownReport {
    /// True if every connection closed cleanly.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl Node {
    /// Shut the node down.
    ///
    /// Closes every connected peer concurrently, publishes the node-closed
    /// signal (`PeerDisconnected` with no origin), stops the accept loop and
    /// all watch workers, then empties the routing table. Workers exit
    /// without publishing a per-peer `PeerDisconnected`.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyClosed`, with no side effects, on every call after
    /// the first.
    pub async fn close(&self) -> Result<ShutdownReport> {
        if self
            .inner
            .closed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(NetworkError::AlreadyClosed);
        }
        info!(peers = self.inner.router.len(), "Closing node");

        let mut closing = JoinSet::new();
        for (id, peer) in self.inner.router.snapshot() {
            closing.spawn(async move { (id, peer.close().await) });
        }

        self.publish_node_closed().await;
        self.inner.shutdown.cancel();

        let mut report = ShutdownReport::default();
        while let Some(joined) = closing.join_next().await {
            match joined {
                Ok((_, Ok(()))) => report.closed += 1,
                Ok((peer, Err(source))) => {
                    warn!(peer = %peer, error = %source, "Failed to close peer");
                    report.failures.push(NetworkError::Close { peer, source });
                }
                Err(e) => warn!(error = %e, "Peer close task failed"),
            }
        }

        self.inner.router.flush();
        PEERS_CONNECTED.set(0);
        info!(
            closed = report.closed,
            failed = report.failures.len(),
            "Node closed"
        );
        Ok(report)
    }

    /// Close one peer's connection.
    ///
    /// The peer's watch worker then removes it and publishes
    /// `PeerDisconnected`, exactly as for a remote hang-up.
    ///
    /// # Errors
    ///
    /// Returns `PeerNotFound` if `id` is unknown, or `Close` if the
    /// transport reports an error.
    pub async fn disconnect(&self, id: &PeerId) -> Result<()> {
        let peer = self
            .inner
            .router
            .query(id)
            .ok_or_else(|| NetworkError::PeerNotFound(id.clone()))?;

        info!(peer = %id, "Disconnecting peer");
        peer.close().await.map_err(|source| NetworkError::Close {
            peer: id.clone(),
            source,
        })
    }
}
