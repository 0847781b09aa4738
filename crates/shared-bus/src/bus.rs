//! # Event Bus
//!
//! Pairs the `Broker` with the default `Subscriber` and exposes the only
//! producer entry points the node uses. There is no generic "emit" API.

use crate::events::{EventKind, Signal};
use crate::publisher::{Broker, EventPublisher};
use crate::subscriber::Subscriber;
use crate::DEFAULT_CHANNEL_CAPACITY;
use shared_types::PeerId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Broker plus default subscriber, wired for every `EventKind`.
pub struct EventBus {
    broker: Broker,
    subscriber: Arc<Subscriber>,
}

impl EventBus {
    /// Create a bus with the default queue capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a bus whose subscriber queue holds `capacity` signals.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let subscriber = Arc::new(Subscriber::new(capacity));
        let mut broker = Broker::new();
        // register default events
        for kind in EventKind::ALL {
            broker.register(kind, subscriber.clone());
        }
        Self { broker, subscriber }
    }

    /// Relay the merged signal stream to `out` until `cancel` fires.
    pub async fn listen(&self, cancel: CancellationToken, out: mpsc::Sender<Signal>) {
        self.subscriber.listen(cancel, out).await;
    }

    /// The default subscriber.
    #[must_use]
    pub fn subscriber(&self) -> &Arc<Subscriber> {
        &self.subscriber
    }

    /// Total signals published through this bus.
    #[must_use]
    pub fn signals_published(&self) -> u64 {
        self.broker.signals_published()
    }

    /// A new peer entered the routing table. Payload: the peer identity.
    pub async fn peer_connected(&self, peer: &PeerId) {
        let signal = Signal::new(
            EventKind::PeerConnected,
            Some(peer.clone()),
            peer.as_bytes(),
        );
        self.broker.publish(signal).await;
    }

    /// A peer connection ended. Payload: the peer identity.
    pub async fn peer_disconnected(&self, peer: &PeerId) {
        let signal = Signal::new(
            EventKind::PeerDisconnected,
            Some(peer.clone()),
            peer.as_bytes(),
        );
        self.broker.publish(signal).await;
    }

    /// The node itself closed. Published as `PeerDisconnected` with no origin;
    /// payload is the bound listen address, or empty if the node never listened.
    pub async fn node_closed(&self, local_addr: Option<&str>) {
        let payload = local_addr.map(str::as_bytes).unwrap_or_default();
        let signal = Signal::new(EventKind::PeerDisconnected, None, payload);
        self.broker.publish(signal).await;
    }

    /// A peer sent a message. The payload is copied into the signal.
    pub async fn new_message(&self, peer: &PeerId, payload: &[u8]) {
        let signal = Signal::new(EventKind::MessageReceived, Some(peer.clone()), payload);
        self.broker.publish(signal).await;
    }

    /// The node bound its listener on `addr`.
    pub async fn self_listening(&self, addr: &str) {
        let signal = Signal::new(EventKind::SelfListening, None, addr.as_bytes());
        self.broker.publish(signal).await;
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
