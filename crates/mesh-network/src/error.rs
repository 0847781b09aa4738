//! Error types for the mesh network.

use crate::config::ConfigError;
use shared_types::PeerId;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by `Node` operations.
///
/// Receive failures never reach the caller: the watch worker treats them as
/// disconnection. They still appear here so adapters share one vocabulary.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The listening socket could not be opened.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Requested listen address.
        addr: String,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },

    /// The accept loop failed and stopped.
    #[error("Accept failed: {0}")]
    Accept(#[source] io::Error),

    /// The routing table already holds `max_peers` peers.
    #[error("Max peers exceeded: {max_peers}")]
    AdmissionRejected {
        /// Configured peer limit.
        max_peers: usize,
    },

    /// Outbound connection failed. Wraps the cause with the target address.
    #[error("Failed to dial {addr}: {source}")]
    Dial {
        /// Dial target.
        addr: String,
        /// Connect error, timeout or admission rejection.
        #[source]
        source: Box<NetworkError>,
    },

    /// TCP connect error.
    #[error("Connect error: {0}")]
    Connect(#[source] io::Error),

    /// TCP connect did not finish in time.
    #[error("Connect timed out after {0:?}")]
    DialTimeout(Duration),

    /// No peer with this identity is in the routing table.
    #[error("Peer not found: {0}")]
    PeerNotFound(PeerId),

    /// Writing to a peer failed. The table is left untouched; the watch
    /// worker handles any resulting disconnection.
    #[error("Failed to send to {peer}: {source}")]
    Send {
        /// Target peer.
        peer: PeerId,
        /// Transport error, returned as the adapter reported it.
        #[source]
        source: io::Error,
    },

    /// Reading from a peer failed (EOF, reset, deadline or bad frame).
    #[error("Failed to receive from {peer}: {source}")]
    Receive {
        /// Source peer.
        peer: PeerId,
        /// Transport error.
        #[source]
        source: io::Error,
    },

    /// Closing a peer connection failed.
    #[error("Failed to close {peer}: {source}")]
    Close {
        /// Peer being closed.
        peer: PeerId,
        /// Transport error.
        #[source]
        source: io::Error,
    },

    /// A frame, incoming or outgoing, exceeded the configured limit.
    #[error("Frame of {size} bytes exceeds limit of {max} bytes")]
    FrameTooLarge {
        /// Frame length, announced or about to be sent.
        size: usize,
        /// Configured `max_frame_size`.
        max: usize,
    },

    /// The node has been closed; no further listening or dialing.
    #[error("Node is closed")]
    NodeClosed,

    /// `close` was already called on this node.
    #[error("Node already closed")]
    AlreadyClosed,

    /// Configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl NetworkError {
    /// Wrap an error as a dial failure for `addr`.
    pub(crate) fn dial(addr: &str, source: NetworkError) -> Self {
        Self::Dial {
            addr: addr.to_string(),
            source: Box::new(source),
        }
    }

    /// True if this error (or the dial failure it wraps) is an admission
    /// rejection.
    #[must_use]
    pub fn is_admission_rejected(&self) -> bool {
        match self {
            Self::AdmissionRejected { .. } => true,
            Self::Dial { source, .. } => source.is_admission_rejected(),
            _ => false,
        }
    }
}

impl From<NetworkError> for io::Error {
    fn from(err: NetworkError) -> Self {
        match err {
            NetworkError::Send { source, .. }
            | NetworkError::Receive { source, .. }
            | NetworkError::Close { source, .. }
            | NetworkError::Connect(source)
            | NetworkError::Accept(source) => source,
            NetworkError::FrameTooLarge { .. } => io::Error::new(io::ErrorKind::InvalidData, err),
            other => io::Error::other(other),
        }
    }
}

/// Result alias for node operations.
pub type Result<T> = std::result::Result<T, NetworkError>;
