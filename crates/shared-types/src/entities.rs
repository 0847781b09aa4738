//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Identity**: `PeerId`
//! - **Connection**: `ConnectionDirection`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;

// =============================================================================
// IDENTITY
// =============================================================================

/// Identity of one live peer connection.
///
/// Derived solely from the remote socket address (e.g. `192.168.1.1:8080`),
/// so two connections from the same address and port share an identity.
/// It is a lookup key only; it never grants access to the connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    /// Create an identity from its textual form.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive the identity of a connection from its remote address.
    #[must_use]
    pub fn from_remote(addr: SocketAddr) -> Self {
        Self(addr.to_string())
    }

    /// The textual form of this identity.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identity as raw bytes (used as signal payload).
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<SocketAddr> for PeerId {
    fn from(addr: SocketAddr) -> Self {
        Self::from_remote(addr)
    }
}

impl From<&str> for PeerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

// =============================================================================
// CONNECTION
// =============================================================================

/// Which side initiated a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionDirection {
    /// Accepted by our listener.
    Inbound,
    /// Dialed by us.
    Outbound,
}

impl ConnectionDirection {
    /// Lowercase label used in logs and metric labels.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }
}

impl fmt::Display for ConnectionDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
