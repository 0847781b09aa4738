//! # Node Configuration
//!
//! Runtime configuration: where to listen, whom to dial, and the network
//! tunables.
//!
//! ## Sources (later wins)
//!
//! 1. Built-in defaults
//! 2. TOML file given by `--config` / `MESH_CONFIG`
//! 3. Environment (`MESH_LISTEN_ADDR`, `MESH_MAX_PEERS`)
//! 4. Command-line flags
//!
//! ```toml
//! [node]
//! listen = "0.0.0.0:7000"
//! dial = ["10.0.0.2:7000"]
//!
//! [network]
//! max_peers = 16
//! ```

use crate::cli::Args;
use mesh_network::{ConfigError, NetworkConfig};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeConfig {
    /// Listen address. No listener is started if unset.
    pub listen: Option<String>,
    /// Peers to dial at startup.
    pub dial: Vec<String>,
    /// Network configuration.
    pub network: NetworkConfig,
}

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    node: NodeSection,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct NodeSection {
    listen: Option<String>,
    #[serde(default)]
    dial: Vec<String>,
}

impl NodeConfig {
    /// Parse the `[node]` and `[network]` tables.
    ///
    /// # Errors
    ///
    /// Returns error if the text is not valid TOML or a value is invalid.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let network = NetworkConfig::from_toml_str(content)?;
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        Ok(Self {
            listen: file.node.listen,
            dial: file.node.dial,
            network,
        })
    }

    /// Load from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }
}

/// Load configuration from file, environment and flags.
///
/// Environment overrides arrive through `args` (clap reads them).
///
/// # Errors
///
/// Returns error if the file cannot be loaded or the merged result is
/// invalid.
pub fn load_config(args: &Args) -> Result<NodeConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration file");
            NodeConfig::load(path)?
        }
        None => NodeConfig::default(),
    };

    if let Some(listen) = &args.listen {
        config.listen = Some(listen.clone());
    }
    config.dial.extend(args.dial.iter().cloned());
    if let Some(max_peers) = args.max_peers {
        config.network.max_peers = max_peers;
    }

    config.network.validate()?;
    Ok(config)
}
