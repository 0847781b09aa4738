//! Cross-crate integration tests and their shared fixtures.

pub mod admission;
pub mod end_to_end;
pub mod identity;
pub mod shutdown;

use mesh_network::{EventKind, NetworkConfig, Node, Signal};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Upper bound for anything a test waits on.
pub const WAIT: Duration = Duration::from_secs(3);

/// A node whose listener is bound on an ephemeral loopback port.
pub struct ListeningNode {
    pub node: Node,
    pub addr: SocketAddr,
    pub events: mpsc::Receiver<Signal>,
    pub cancel: CancellationToken,
}

/// Start a node listening on `127.0.0.1:0` and wait for `SelfListening`.
///
/// # Panics
///
/// Panics if the listener does not come up within `WAIT`.
pub async fn listening_node(config: NetworkConfig) -> ListeningNode {
    let node = Node::new(config).expect("valid config");
    let cancel = CancellationToken::new();
    let mut events = node.events(cancel.clone());

    tokio::spawn({
        let node = node.clone();
        async move { node.listen("127.0.0.1:0").await }
    });

    let signal = next_signal(&mut events).await;
    assert_eq!(signal.kind(), EventKind::SelfListening);
    let addr = node.local_addr().expect("listener bound");
    assert_eq!(signal.payload_str(), Some(addr.to_string().as_str()));

    ListeningNode {
        node,
        addr,
        events,
        cancel,
    }
}

/// A node that never listens, with its consumer attached.
pub fn dialing_node(config: NetworkConfig) -> (Node, mpsc::Receiver<Signal>) {
    let node = Node::new(config).expect("valid config");
    let events = node.events(CancellationToken::new());
    (node, events)
}

/// Receive the next signal or panic after `WAIT`.
pub async fn next_signal(events: &mut mpsc::Receiver<Signal>) -> Signal {
    tokio::time::timeout(WAIT, events.recv())
        .await
        .expect("timed out waiting for signal")
        .expect("event stream ended")
}

/// Receive signals until one of `kind` arrives.
pub async fn next_of_kind(events: &mut mpsc::Receiver<Signal>, kind: EventKind) -> Signal {
    loop {
        let signal = next_signal(events).await;
        if signal.kind() == kind {
            return signal;
        }
    }
}

/// Assert nothing arrives for a short while.
pub async fn assert_quiet(events: &mut mpsc::Receiver<Signal>) {
    let waited = tokio::time::timeout(Duration::from_millis(150), events.recv()).await;
    assert!(waited.is_err(), "unexpected signal: {:?}", waited);
}

/// Poll `check` until it holds or panic after `WAIT`.
pub async fn wait_until<F: Fn() -> bool>(check: F) {
    tokio::time::timeout(WAIT, async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached");
}
