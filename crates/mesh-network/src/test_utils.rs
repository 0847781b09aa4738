//! Test utilities for the mesh network.
//!
//! This module provides an in-memory `Connection` for deterministic testing
//! of the routing table and watch worker without sockets.
//! Enable with the `test-utils` feature flag.
//!
//! # Example
//!
//! ```rust,ignore
//! use mesh_network::test_utils::MockConnection;
//! use mesh_network::ports::Connection;
//!
//! let (conn, handle) = MockConnection::pair("127.0.0.1:9000".parse().unwrap());
//! handle.push(b"hello".to_vec());
//! assert_eq!(conn.recv().await.unwrap(), b"hello");
//! ```

use crate::ports::Connection;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
struct Shared {
    sent: Mutex<Vec<Vec<u8>>>,
    stall_writes: AtomicBool,
    fail_close: AtomicBool,
    close_calls: Mutex<usize>,
    closed: CancellationToken,
}

/// In-memory connection. Frames pushed through the paired `MockHandle`
/// come out of `recv`; frames passed to `send` are recorded on the handle.
#[derive(Debug)]
pub struct MockConnection {
    remote: SocketAddr,
    inbox: tokio::sync::Mutex<mpsc::UnboundedReceiver<io::Result<Vec<u8>>>>,
    shared: Arc<Shared>,
}

/// Test-side control of a `MockConnection`.
#[derive(Debug, Clone)]
pub struct MockHandle {
    inbox: mpsc::UnboundedSender<io::Result<Vec<u8>>>,
    shared: Arc<Shared>,
}

impl MockConnection {
    /// Create a connection that reports `remote` as its peer address.
    #[must_use]
    pub fn pair(remote: SocketAddr) -> (Self, MockHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared::default());
        let conn = Self {
            remote,
            inbox: tokio::sync::Mutex::new(rx),
            shared: shared.clone(),
        };
        (conn, MockHandle { inbox: tx, shared })
    }
}

impl MockHandle {
    /// Deliver one frame to the connection's `recv`.
    pub fn push(&self, frame: Vec<u8>) {
        let _ = self.inbox.send(Ok(frame));
    }

    /// Deliver a keep-alive probe.
    pub fn push_keepalive(&self) {
        self.push(Vec::new());
    }

    /// Make the next `recv` fail with `kind`.
    pub fn push_error(&self, kind: io::ErrorKind) {
        let _ = self.inbox.send(Err(io::Error::from(kind)));
    }

    /// Simulate the remote closing its end.
    pub fn hang_up(&self) {
        self.push_error(io::ErrorKind::UnexpectedEof);
    }

    /// Frames written so far.
    #[must_use]
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.shared.sent.lock().clone()
    }

    /// Make every later `send` block forever.
    pub fn stall_writes(&self) {
        self.shared.stall_writes.store(true, Ordering::SeqCst);
    }

    /// Make `close` report an error (the connection still closes).
    pub fn fail_close(&self) {
        self.shared.fail_close.store(true, Ordering::SeqCst);
    }

    /// True once `close` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.closed.is_cancelled()
    }

    /// Number of `close` calls seen.
    #[must_use]
    pub fn close_calls(&self) -> usize {
        *self.shared.close_calls.lock()
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn recv(&self) -> io::Result<Vec<u8>> {
        tokio::select! {
            biased;
            _ = self.shared.closed.cancelled() => {
                Err(io::Error::from(io::ErrorKind::ConnectionAborted))
            }
            next = async { self.inbox.lock().await.recv().await } => {
                next.unwrap_or_else(|| Err(io::Error::from(io::ErrorKind::UnexpectedEof)))
            }
        }
    }

    async fn send(&self, payload: &[u8]) -> io::Result<usize> {
        if self.shared.closed.is_cancelled() {
            return Err(io::Error::from(io::ErrorKind::NotConnected));
        }
        if self.shared.stall_writes.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.shared.sent.lock().push(payload.to_vec());
        Ok(payload.len())
    }

    async fn close(&self) -> io::Result<()> {
        *self.shared.close_calls.lock() += 1;
        self.shared.closed.cancel();
        if self.shared.fail_close.load(Ordering::SeqCst) {
            return Err(io::Error::other("mock close failure"));
        }
        Ok(())
    }

    fn remote_addr(&self) -> SocketAddr {
        self.remote
    }
}
