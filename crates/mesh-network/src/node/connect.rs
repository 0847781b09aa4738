//! Accept loop, dial and peer admission.

use super::core::Node;
use super::watch::watch;
use crate::adapters::TcpConnection;
use crate::domain::Peer;
use crate::error::{NetworkError, Result};
use crate::ports::Connection;
use mesh_telemetry::metrics::{PEERS_CONNECTED, PEER_CONNECTIONS};
use shared_types::{ConnectionDirection, PeerId};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

impl Node {
    /// Bind `addr` and accept peers until the node is closed.
    ///
    /// Publishes `SelfListening` once the socket is bound. Each accepted
    /// connection goes through admission; a rejected connection is closed
    /// and the loop keeps accepting.
    ///
    /// # Errors
    ///
    /// - `NodeClosed` if called after `close`
    /// - `Bind` if the address cannot be bound
    /// - `Accept` if accepting fails while the node is still open
    ///
    /// Returns `Ok(())` once `close` stops the loop.
    pub async fn listen(&self, addr: &str) -> Result<()> {
        if self.is_closed() {
            return Err(NetworkError::NodeClosed);
        }

        let bind_error = |source| NetworkError::Bind {
            addr: addr.to_string(),
            source,
        };
        let listener = TcpListener::bind(addr).await.map_err(bind_error)?;
        let local = listener.local_addr().map_err(bind_error)?;
        *self.inner.local_addr.lock() = Some(local);

        info!(addr = %local, "Listening for peers");
        self.publish_self_listening(local).await;

        self.accept_loop(listener).await
    }

    async fn accept_loop(&self, listener: TcpListener) -> Result<()> {
        let shutdown = self.inner.shutdown.clone();
        loop {
            let accepted = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                accepted = listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, remote)) => {
                    debug!(remote = %remote, "Accepted connection");
                    if let Err(e) = self.establish_tcp(stream, ConnectionDirection::Inbound).await {
                        warn!(remote = %remote, error = %e, "Inbound connection refused");
                    }
                }
                Err(_) if self.is_closed() => break,
                Err(e) => {
                    error!(error = %e, "Accept failed");
                    return Err(NetworkError::Accept(e));
                }
            }
        }
        debug!("Accept loop stopped");
        Ok(())
    }

    /// Connect to `addr` and admit the connection as an outbound peer.
    ///
    /// Returns the new peer's identity (the remote address).
    ///
    /// # Errors
    ///
    /// Returns `NodeClosed` after `close`. Otherwise failures come back as
    /// `Dial { addr, .. }` wrapping a connect error, a timeout or an
    /// admission rejection.
    pub async fn dial(&self, addr: &str) -> Result<PeerId> {
        if self.is_closed() {
            return Err(NetworkError::NodeClosed);
        }

        let timeout = self.inner.config.dial_timeout;
        let stream = match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                record_outcome(ConnectionDirection::Outbound, "failed");
                return Err(NetworkError::dial(addr, NetworkError::Connect(e)));
            }
            Err(_) => {
                record_outcome(ConnectionDirection::Outbound, "failed");
                return Err(NetworkError::dial(addr, NetworkError::DialTimeout(timeout)));
            }
        };

        let peer = self
            .establish_tcp(stream, ConnectionDirection::Outbound)
            .await
            .map_err(|e| NetworkError::dial(addr, e))?;
        Ok(peer.id().clone())
    }

    async fn establish_tcp(
        &self,
        stream: TcpStream,
        direction: ConnectionDirection,
    ) -> Result<Arc<Peer>> {
        if self.inner.config.keep_alive {
            if let Err(e) = TcpConnection::enable_keepalive(&stream) {
                debug!(error = %e, "Failed to enable TCP keep-alive");
            }
        }
        let conn = TcpConnection::new(stream, self.inner.config.max_frame_size)
            .map_err(NetworkError::Connect)?;
        self.establish(Box::new(conn), direction).await
    }

    /// Admit an established connection as a peer.
    ///
    /// On success the peer is in the routing table, `PeerConnected` has been
    /// published and a watch worker is running. If the identity was already
    /// connected, the earlier connection is closed and replaced.
    ///
    /// # Errors
    ///
    /// Returns `AdmissionRejected` if the table is full or `NodeClosed` after
    /// `close`. The connection is closed in both cases.
    pub async fn establish(
        &self,
        conn: Box<dyn Connection>,
        direction: ConnectionDirection,
    ) -> Result<Arc<Peer>> {
        let peer = Arc::new(Peer::new(
            conn,
            direction,
            self.inner.config.peer_idle_timeout,
        ));

        if self.is_closed() {
            release(&peer).await;
            return Err(NetworkError::NodeClosed);
        }

        let max_peers = self.inner.config.max_peers;
        let displaced = match self.inner.router.admit(peer.clone(), max_peers) {
            Ok(displaced) => displaced,
            Err(e) => {
                record_outcome(direction, "rejected");
                warn!(peer = %peer.id(), max_peers, "Max peers exceeded");
                release(&peer).await;
                return Err(e);
            }
        };

        // close() may have snapshotted the table before this insert.
        if self.is_closed() {
            self.inner.router.remove(&peer);
            release(&peer).await;
            return Err(NetworkError::NodeClosed);
        }

        record_outcome(direction, "accepted");
        PEERS_CONNECTED.set(self.inner.router.len() as i64);

        if let Some(old) = displaced {
            warn!(peer = %old.id(), "Identity already connected, replacing earlier connection");
            release(&old).await;
        }

        info!(peer = %peer.id(), direction = %direction, "Peer connected");
        // Published before the worker starts so it precedes the peer's messages.
        self.publish_peer_connected(peer.id()).await;
        tokio::spawn(watch(self.clone(), peer.clone()));

        Ok(peer)
    }
}

/// Close a connection whose failure nobody can act on.
async fn release(peer: &Peer) {
    if let Err(e) = peer.close().await {
        debug!(peer = %peer.id(), error = %e, "Close failed");
    }
}

fn record_outcome(direction: ConnectionDirection, outcome: &str) {
    PEER_CONNECTIONS
        .with_label_values(&[direction.as_str(), outcome])
        .inc();
}
