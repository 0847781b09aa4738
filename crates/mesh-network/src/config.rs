//! # Network Configuration
//!
//! `NetworkConfig` carries every tunable of the node. It can be built in code
//! (`Default`, `for_testing`) or loaded from the `[network]` table of a TOML
//! file.
//!
//! ```toml
//! [network]
//! max_peers = 16
//! peer_idle_timeout_secs = 30
//! dial_timeout_secs = 10
//! max_frame_size = 1048576
//! event_queue_capacity = 1000
//! keep_alive = true
//! ```

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default maximum number of live peers.
pub const DEFAULT_MAX_PEERS: usize = 16;

/// Default idle window before a silent peer is dropped.
pub const DEFAULT_PEER_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Default time allowed for an outbound TCP connect.
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Default largest accepted frame (1 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Node configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Upper bound on live peers. Inbound and outbound share it.
    pub max_peers: usize,
    /// Read and write deadlines are pushed this far ahead on every activity.
    pub peer_idle_timeout: Duration,
    /// Time allowed for `Node::dial` to complete the TCP connect.
    pub dial_timeout: Duration,
    /// Largest frame payload accepted from a peer.
    pub max_frame_size: usize,
    /// Capacity of the merged signal queue.
    pub event_queue_capacity: usize,
    /// Enable TCP keep-alive on every stream.
    pub keep_alive: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            max_peers: DEFAULT_MAX_PEERS,
            peer_idle_timeout: DEFAULT_PEER_IDLE_TIMEOUT,
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            event_queue_capacity: shared_bus::DEFAULT_CHANNEL_CAPACITY,
            keep_alive: true,
        }
    }
}

impl NetworkConfig {
    /// Configuration for tests: small limits and short timeouts.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            max_peers: 4,
            peer_idle_timeout: Duration::from_secs(5),
            dial_timeout: Duration::from_secs(2),
            max_frame_size: 64 * 1024,
            event_queue_capacity: 64,
            keep_alive: false,
        }
    }

    /// Override the peer limit.
    #[must_use]
    pub fn with_max_peers(mut self, max_peers: usize) -> Self {
        self.max_peers = max_peers;
        self
    }

    /// Override the idle window.
    #[must_use]
    pub fn with_peer_idle_timeout(mut self, idle: Duration) -> Self {
        self.peer_idle_timeout = idle;
        self
    }

    /// Check that every limit is usable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_peers == 0 {
            return Err(ConfigError::Invalid("max_peers must be at least 1".into()));
        }
        if self.peer_idle_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "peer_idle_timeout must be non-zero".into(),
            ));
        }
        if self.dial_timeout.is_zero() {
            return Err(ConfigError::Invalid("dial_timeout must be non-zero".into()));
        }
        if self.max_frame_size == 0 || self.max_frame_size > u32::MAX as usize {
            return Err(ConfigError::Invalid(format!(
                "max_frame_size must be between 1 and {}",
                u32::MAX
            )));
        }
        if self.event_queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "event_queue_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Load from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed or validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse from TOML text. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the text is not valid TOML or the result is invalid.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let defaults = Self::default();
        let nc = file.network;
        let config = Self {
            max_peers: nc.max_peers.unwrap_or(defaults.max_peers),
            peer_idle_timeout: nc
                .peer_idle_timeout_secs
                .map_or(defaults.peer_idle_timeout, Duration::from_secs),
            dial_timeout: nc
                .dial_timeout_secs
                .map_or(defaults.dial_timeout, Duration::from_secs),
            max_frame_size: nc.max_frame_size.unwrap_or(defaults.max_frame_size),
            event_queue_capacity: nc
                .event_queue_capacity
                .unwrap_or(defaults.event_queue_capacity),
            keep_alive: nc.keep_alive.unwrap_or(defaults.keep_alive),
        };

        config.validate()?;
        Ok(config)
    }
}

/// Configuration file structure. Unknown tables are ignored so the runtime
/// can keep its own sections in the same file.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    network: NetworkConfigFile,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct NetworkConfigFile {
    max_peers: Option<usize>,
    peer_idle_timeout_secs: Option<u64>,
    dial_timeout_secs: Option<u64>,
    max_frame_size: Option<usize>,
    event_queue_capacity: Option<usize>,
    keep_alive: Option<bool>,
}

/// Errors that can occur during config loading.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// File I/O error.
    #[error("Failed to read config file {path}: {error}")]
    Io {
        /// Path of the file that failed to load.
        path: String,
        /// Error message from the I/O operation.
        error: String,
    },

    /// TOML parse error.
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// A value is out of range.
    #[error("Invalid config: {0}")]
    Invalid(String),
}
