//! # Peer
//!
//! A `Peer` owns one live `Connection` plus its read and write deadlines.
//! It is shared (`Arc<Peer>`) between the routing table, the watch worker
//! and senders.

use crate::ports::Connection;
use parking_lot::Mutex;
use serde::Serialize;
use shared_types::{future_deadline, remaining, ConnectionDirection, PeerId};
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime};
use tracing::debug;

/// Process-wide connection counter. Distinguishes two connections that
/// share an identity.
static NEXT_SEQ: AtomicU64 = AtomicU64::new(1);

/// One live peer connection.
pub struct Peer {
    id: PeerId,
    seq: u64,
    direction: ConnectionDirection,
    connected_at: SystemTime,
    conn: Box<dyn Connection>,
    read_deadline: Mutex<Instant>,
    write_deadline: Mutex<Instant>,
}

impl Peer {
    /// Wrap `conn`. Identity comes from the remote address; both deadlines
    /// start at now + `idle`.
    pub fn new(conn: Box<dyn Connection>, direction: ConnectionDirection, idle: Duration) -> Self {
        let deadline = future_deadline(idle);
        Self {
            id: PeerId::from_remote(conn.remote_addr()),
            seq: NEXT_SEQ.fetch_add(1, Ordering::Relaxed),
            direction,
            connected_at: SystemTime::now(),
            conn,
            read_deadline: Mutex::new(deadline),
            write_deadline: Mutex::new(deadline),
        }
    }

    /// Peer identity.
    #[must_use]
    pub fn id(&self) -> &PeerId {
        &self.id
    }

    /// Connection sequence number, unique per process.
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Who initiated the connection.
    #[must_use]
    pub fn direction(&self) -> ConnectionDirection {
        self.direction
    }

    /// Remote socket address.
    #[must_use]
    pub fn remote_addr(&self) -> SocketAddr {
        self.conn.remote_addr()
    }

    /// Wall-clock time the connection was established.
    #[must_use]
    pub fn connected_at(&self) -> SystemTime {
        self.connected_at
    }

    /// Receive the next frame, failing with `TimedOut` once the read
    /// deadline passes.
    ///
    /// The deadline is sampled when the call starts.
    pub async fn recv(&self) -> io::Result<Vec<u8>> {
        let deadline = *self.read_deadline.lock();
        tokio::time::timeout_at(deadline.into(), self.conn.recv())
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "read deadline exceeded"))?
    }

    /// Write one frame, failing with `TimedOut` once the write deadline
    /// passes. Returns the payload bytes written.
    ///
    /// An already expired deadline fails before anything is written and
    /// leaves the connection usable. A deadline that expires while the frame
    /// is being written closes the connection: the remote would otherwise
    /// parse later frames as the rest of the truncated one.
    pub async fn write(&self, payload: &[u8]) -> io::Result<usize> {
        let deadline = *self.write_deadline.lock();
        if remaining(deadline).is_zero() {
            return Err(write_timeout());
        }

        match tokio::time::timeout_at(deadline.into(), self.conn.send(payload)).await {
            Ok(sent) => sent,
            Err(_) => {
                if let Err(e) = self.conn.close().await {
                    debug!(peer = %self.id, error = %e, "Close after partial write failed");
                }
                Err(write_timeout())
            }
        }
    }

    /// Move the read deadline.
    pub fn set_read_deadline(&self, deadline: Instant) {
        *self.read_deadline.lock() = deadline;
    }

    /// Move the write deadline.
    pub fn set_write_deadline(&self, deadline: Instant) {
        *self.write_deadline.lock() = deadline;
    }

    /// Current read deadline.
    #[must_use]
    pub fn read_deadline(&self) -> Instant {
        *self.read_deadline.lock()
    }

    /// Current write deadline.
    #[must_use]
    pub fn write_deadline(&self) -> Instant {
        *self.write_deadline.lock()
    }

    /// Close the underlying connection. Any pending `recv` fails.
    pub async fn close(&self) -> io::Result<()> {
        self.conn.close().await
    }

    /// Read-only view for `Node::table`.
    #[must_use]
    pub fn summary(&self) -> PeerSummary {
        PeerSummary {
            id: self.id.clone(),
            remote_addr: self.remote_addr(),
            direction: self.direction,
            connected_at: self.connected_at,
        }
    }
}

fn write_timeout() -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, "write deadline exceeded")
}

impl std::fmt::Debug for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peer")
            .field("id", &self.id)
            .field("seq", &self.seq)
            .field("direction", &self.direction)
            .finish_non_exhaustive()
    }
}

/// Snapshot of one routing table entry. Carries no connection access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerSummary {
    /// Peer identity.
    pub id: PeerId,
    /// Remote socket address.
    pub remote_addr: SocketAddr,
    /// Who initiated the connection.
    pub direction: ConnectionDirection,
    /// When the connection was established.
    pub connected_at: SystemTime,
}
