//! Per-peer watch worker.
//!
//! One worker runs for every admitted peer. It owns the receive side of the
//! connection: each frame is published as `MessageReceived`, keep-alive
//! probes only refresh the read deadline, and the first receive error ends
//! the peer.

use super::core::Node;
use crate::domain::Peer;
use mesh_telemetry::metrics::{BYTES_RECEIVED, MESSAGES_RECEIVED, PEERS_CONNECTED, PEER_DISCONNECTIONS};
use shared_types::future_deadline;
use std::io;
use std::sync::Arc;
use tracing::{debug, info, trace};

pub(crate) async fn watch(node: Node, peer: Arc<Peer>) {
    let shutdown = node.inner.shutdown.clone();
    let idle = node.inner.config.peer_idle_timeout;
    debug!(peer = %peer.id(), seq = peer.seq(), "Watch worker started");

    loop {
        let received = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            received = peer.recv() => received,
        };

        // Teardown after close() is close()'s job.
        if node.is_closed() {
            break;
        }

        match received {
            Ok(payload) if payload.is_empty() => {
                trace!(peer = %peer.id(), "Keep-alive");
            }
            Ok(payload) => {
                MESSAGES_RECEIVED.inc();
                BYTES_RECEIVED.inc_by(payload.len() as u64);
                debug!(peer = %peer.id(), bytes = payload.len(), "Message received");
                node.publish_message(peer.id(), &payload).await;
            }
            Err(e) => {
                disconnect(&node, &peer, e).await;
                break;
            }
        }

        peer.set_read_deadline(future_deadline(idle));
    }

    debug!(peer = %peer.id(), seq = peer.seq(), "Watch worker stopped");
}

/// Remove the peer, release its connection and announce the disconnection.
async fn disconnect(node: &Node, peer: &Peer, reason: io::Error) {
    if node.inner.router.remove(peer) {
        PEERS_CONNECTED.set(node.inner.router.len() as i64);
    }
    if let Err(e) = peer.close().await {
        debug!(peer = %peer.id(), error = %e, "Close after disconnect failed");
    }
    PEER_DISCONNECTIONS.inc();
    info!(peer = %peer.id(), reason = %reason, "Peer disconnected");
    node.publish_peer_disconnected(peer.id()).await;
}
