//! Command-line arguments.

use clap::Parser;
use std::path::PathBuf;

/// Peer-mesh node.
#[derive(Parser, Debug, Default, Clone)]
#[command(name = "node-runtime")]
#[command(about = "Run a peer-mesh node: accept peers, dial peers, log every signal")]
#[command(version)]
pub struct Args {
    /// Address to listen on (e.g. 0.0.0.0:7000)
    #[arg(short, long, env = "MESH_LISTEN_ADDR", value_name = "HOST:PORT")]
    pub listen: Option<String>,

    /// Peer to dial at startup. May be repeated.
    #[arg(short, long = "dial", value_name = "HOST:PORT")]
    pub dial: Vec<String>,

    /// TOML configuration file
    #[arg(short, long, env = "MESH_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Maximum number of connected peers
    #[arg(long, env = "MESH_MAX_PEERS")]
    pub max_peers: Option<usize>,
}
