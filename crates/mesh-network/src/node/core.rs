use crate::config::NetworkConfig;
use crate::domain::{PeerSummary, RoutingTable};
use crate::error::{NetworkError, Result};
use mesh_telemetry::metrics::{BYTES_SENT, SIGNALS_PUBLISHED};
use parking_lot::Mutex;
use shared_bus::{EventBus, EventKind, Signal};
use shared_types::{future_deadline, PeerId};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Buffer between the subscriber queue and a consumer. Kept at one so
/// cancellation strands at most one signal.
const CONSUMER_BUFFER: usize = 1;

pub(crate) struct NodeInner {
    pub(crate) config: NetworkConfig,
    pub(crate) router: RoutingTable,
    pub(crate) events: EventBus,
    /// Flips once, at the start of `close`.
    pub(crate) closed: AtomicBool,
    /// Fired by `close` to stop the accept loop and every watch worker.
    pub(crate) shutdown: CancellationToken,
    pub(crate) local_addr: Mutex<Option<SocketAddr>>,
}

/// A peer-mesh node.
///
/// Cloning is cheap and every clone drives the same node, so one clone can
/// run `listen` in its own task while others dial, send and consume events.
///
/// # Example
///
/// ```rust,ignore
/// let node = Node::new(NetworkConfig::default())?;
/// let mut events = node.events(CancellationToken::new());
///
/// tokio::spawn({
///     let node = node.clone();
///     async move { node.listen("0.0.0.0:7000").await }
/// });
///
/// while let Some(signal) = events.recv().await {
///     println!("{} {:?}", signal.kind(), signal.origin());
/// }
/// ```
#[derive(Clone)]
pub struct Node {
    pub(crate) inner: Arc<NodeInner>,
}

impl Node {
    /// Create a node. Nothing is bound until `listen`.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::Config` if the configuration is invalid.
    pub fn new(config: NetworkConfig) -> Result<Self> {
        config.validate()?;
        let events = EventBus::with_capacity(config.event_queue_capacity);
        Ok(Self {
            inner: Arc::new(NodeInner {
                config,
                router: RoutingTable::new(),
                events,
                closed: AtomicBool::new(false),
                shutdown: CancellationToken::new(),
                local_addr: Mutex::new(None),
            }),
        })
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &NetworkConfig {
        &self.inner.config
    }

    /// True once `close` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Address the listener is bound to, once `listen` has bound it.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.inner.local_addr.lock()
    }

    /// Snapshot of connected peers, ordered by identity.
    ///
    /// The returned summaries give no access to the connections.
    #[must_use]
    pub fn table(&self) -> Vec<PeerSummary> {
        let mut peers: Vec<_> = self
            .inner
            .router
            .snapshot()
            .values()
            .map(|peer| peer.summary())
            .collect();
        peers.sort_by(|a, b| a.id.cmp(&b.id));
        peers
    }

    /// Number of connected peers.
    #[must_use]
    pub fn peer_count(&self) -> usize {
        self.inner.router.len()
    }

    /// Start relaying signals to a new consumer channel until `cancel`
    /// fires.
    ///
    /// Signals arrive in the order they were published, across every kind.
    /// Calling this more than once creates competing consumers: each signal
    /// reaches exactly one of them.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn events(&self, cancel: CancellationToken) -> mpsc::Receiver<Signal> {
        let (tx, rx) = mpsc::channel(CONSUMER_BUFFER);
        let node = self.clone();
        tokio::spawn(async move { node.inner.events.listen(cancel, tx).await });
        rx
    }

    /// `events` wrapped as a `Stream`.
    pub fn event_stream(&self, cancel: CancellationToken) -> ReceiverStream<Signal> {
        ReceiverStream::new(self.events(cancel))
    }

    /// Write `payload` to the peer known as `id`.
    ///
    /// The peer's write deadline is extended afterwards whether or not the
    /// write succeeded. A failed write leaves the routing table alone; the
    /// watch worker handles the disconnection.
    ///
    /// # Errors
    ///
    /// Returns `PeerNotFound` if `id` is unknown or `FrameTooLarge` if the
    /// payload exceeds `max_frame_size`; nothing is written in either case.
    /// Otherwise returns `Send` carrying the transport error.
    pub async fn send_message(&self, id: &PeerId, payload: &[u8]) -> Result<usize> {
        let peer = self
            .inner
            .router
            .query(id)
            .ok_or_else(|| NetworkError::PeerNotFound(id.clone()))?;

        let max = self.inner.config.max_frame_size;
        if payload.len() > max {
            return Err(NetworkError::FrameTooLarge {
                size: payload.len(),
                max,
            });
        }

        let written = peer.write(payload).await;
        peer.set_write_deadline(future_deadline(self.inner.config.peer_idle_timeout));

        match written {
            Ok(n) => {
                BYTES_SENT.inc_by(n as u64);
                debug!(peer = %id, bytes = n, "Message sent");
                Ok(n)
            }
            Err(source) => Err(NetworkError::Send {
                peer: id.clone(),
                source,
            }),
        }
    }

    // -------------------------------------------------------------------------
    // Signal producers
    // -------------------------------------------------------------------------

    pub(crate) async fn publish_peer_connected(&self, id: &PeerId) {
        self.inner.events.peer_connected(id).await;
        count_signal(EventKind::PeerConnected);
    }

    pub(crate) async fn publish_peer_disconnected(&self, id: &PeerId) {
        self.inner.events.peer_disconnected(id).await;
        count_signal(EventKind::PeerDisconnected);
    }

    pub(crate) async fn publish_message(&self, id: &PeerId, payload: &[u8]) {
        self.inner.events.new_message(id, payload).await;
        count_signal(EventKind::MessageReceived);
    }

    pub(crate) async fn publish_self_listening(&self, addr: SocketAddr) {
        self.inner.events.self_listening(&addr.to_string()).await;
        count_signal(EventKind::SelfListening);
    }

    pub(crate) async fn publish_node_closed(&self) {
        let local = self.local_addr().map(|addr| addr.to_string());
        self.inner.events.node_closed(local.as_deref()).await;
        count_signal(EventKind::PeerDisconnected);
    }
}

fn count_signal(kind: EventKind) {
    SIGNALS_PUBLISHED.with_label_values(&[kind.as_str()]).inc();
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("local_addr", &self.local_addr())
            .field("peers", &self.inner.router.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
