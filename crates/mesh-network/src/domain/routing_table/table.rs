//! Main RoutingTable implementation.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use shared_types::PeerId;

use crate::domain::Peer;
use crate::error::NetworkError;

/// Point-in-time copy of the routing table.
pub type Table = HashMap<PeerId, Arc<Peer>>;

/// Identity-keyed set of live peers.
///
/// # Concurrency
///
/// Queries take a shared lock and may run in parallel; mutations take the
/// exclusive lock. No lock is held across an await point.
///
/// # Identity collisions
///
/// Inserting an identity that is already present replaces the stored peer
/// (last writer wins) and hands the displaced peer back to the caller, who
/// owns closing it. `remove` compares connection sequence numbers, so a
/// displaced connection can never evict its replacement.
#[derive(Debug, Default)]
pub struct RoutingTable {
    peers: RwLock<Table>,
}

impl RoutingTable {
    /// Create an empty routing table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `peer` under its identity. Returns the peer it displaced.
    pub fn add(&self, peer: Arc<Peer>) -> Option<Arc<Peer>> {
        self.peers.write().insert(peer.id().clone(), peer)
    }

    /// Insert `peer` unless that would grow the table past `max_peers`.
    ///
    /// The size check and the insert happen under one write lock. Replacing
    /// an identity already present does not grow the table and is always
    /// admitted.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::AdmissionRejected` when the table is full.
    pub fn admit(&self, peer: Arc<Peer>, max_peers: usize) -> Result<Option<Arc<Peer>>, NetworkError> {
        let mut peers = self.peers.write();
        if !peers.contains_key(peer.id()) && peers.len() >= max_peers {
            return Err(NetworkError::AdmissionRejected { max_peers });
        }
        Ok(peers.insert(peer.id().clone(), peer))
    }

    /// Remove `peer` if it is still the stored entry for its identity.
    ///
    /// Returns `true` if an entry was removed. Removing an absent or
    /// displaced peer is a no-op. The caller must close the connection.
    pub fn remove(&self, peer: &Peer) -> bool {
        let mut peers = self.peers.write();
        match peers.get(peer.id()) {
            Some(stored) if stored.seq() == peer.seq() => {
                peers.remove(peer.id());
                true
            }
            _ => false,
        }
    }

    /// Look up a peer by identity.
    #[must_use]
    pub fn query(&self, id: &PeerId) -> Option<Arc<Peer>> {
        self.peers.read().get(id).cloned()
    }

    /// Number of live peers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.read().len()
    }

    /// True if no peer is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.read().is_empty()
    }

    /// Drop every entry and return how many there were.
    ///
    /// Connections are not closed here; callers close them first.
    pub fn flush(&self) -> usize {
        let drained = std::mem::take(&mut *self.peers.write());
        drained.len()
    }

    /// Copy of the current contents. Later mutations do not affect it.
    #[must_use]
    pub fn snapshot(&self) -> Table {
        self.peers.read().clone()
    }
}
