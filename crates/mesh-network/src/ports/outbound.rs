//! # Driven Ports (Outbound SPI)
//!
//! The node never touches sockets directly. Every live peer is reached
//! through a `Connection`, so the orchestrator can be driven by the TCP
//! adapter in production and by in-memory mocks in tests.

use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;

/// A framed, bidirectional connection to one remote peer.
///
/// # Thread Safety
///
/// `recv` is called from exactly one watch worker while `send` and `close`
/// may be called concurrently from other tasks. Implementations must allow
/// this without one call blocking the others indefinitely.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Wait for the next frame from the peer.
    ///
    /// An empty `Vec` is a keep-alive probe, not end of stream. End of
    /// stream, resets and malformed frames are errors.
    ///
    /// Once `close` has been called, a pending or future `recv` must fail.
    async fn recv(&self) -> io::Result<Vec<u8>>;

    /// Send one frame. Returns the number of payload bytes written.
    async fn send(&self, payload: &[u8]) -> io::Result<usize>;

    /// Release the connection. Calling it more than once is harmless.
    async fn close(&self) -> io::Result<()>;

    /// Address of the remote end. Peer identity derives from it.
    fn remote_addr(&self) -> SocketAddr;
}
