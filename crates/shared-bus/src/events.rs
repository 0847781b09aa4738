//! # Peer Events
//!
//! Defines the closed set of event kinds and the immutable `Signal` that
//! flows through the bus.

use serde::{Deserialize, Serialize};
use shared_types::PeerId;
use std::fmt;

/// All kinds of occurrence the node publishes.
///
/// The set is fixed; consumers cannot add kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A peer was accepted or dialed and entered the routing table.
    PeerConnected,
    /// A peer sent a non-empty message.
    MessageReceived,
    /// A peer connection ended. With no origin, the node itself closed.
    PeerDisconnected,
    /// The node bound its listener.
    SelfListening,
}

impl EventKind {
    /// Every kind, in declaration order. Used to wire the default sink.
    pub const ALL: [EventKind; 4] = [
        EventKind::PeerConnected,
        EventKind::MessageReceived,
        EventKind::PeerDisconnected,
        EventKind::SelfListening,
    ];

    /// Stable snake_case label (logs, metric labels).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PeerConnected => "peer_connected",
            Self::MessageReceived => "message_received",
            Self::PeerDisconnected => "peer_disconnected",
            Self::SelfListening => "self_listening",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One published occurrence.
///
/// Fields are private: a signal cannot change once built. The payload is an
/// owned copy of the bytes handed to the constructor, so the producer's
/// buffer may be reused freely after publishing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    kind: EventKind,
    origin: Option<PeerId>,
    payload: Vec<u8>,
}

impl Signal {
    /// Build a signal.
    pub fn new(kind: EventKind, origin: Option<PeerId>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            origin,
            payload: payload.into(),
        }
    }

    /// Event kind.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Identity of the peer this signal is about, if any.
    #[must_use]
    pub fn origin(&self) -> Option<&PeerId> {
        self.origin.as_ref()
    }

    /// Raw payload bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload as text, if it is valid UTF-8.
    #[must_use]
    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }

    /// Consume the signal and keep only the payload.
    #[must_use]
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}
