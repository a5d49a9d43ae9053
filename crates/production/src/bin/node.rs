//! pBFT replica node.
//!
//! Production binary for running one member of the replica group.
//!
//! # Usage
//!
//! ```bash
//! pbft-node --config node1.toml
//! pbft-node --config node1.toml --log-level debug
//! ```
//!
//! # Configuration
//!
//! Each node knows its own id, its listen endpoints, the full peer
//! directory, and who the primary is. There is no persistent state; a
//! restart starts over from genesis. Example TOML:
//!
//! ```toml
//! [node]
//! id = "node1"
//! primary = "node1"
//!
//! [network]
//! peer_listen = "127.0.0.1:7001"
//! rpc_listen = "127.0.0.1:8001"
//! send_timeout_ms = 1000
//!
//! [[peers]]
//! id = "node2"
//! addr = "127.0.0.1:7002"
//!
//! [[peers]]
//! id = "node3"
//! addr = "127.0.0.1:7003"
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use pbft_consensus::ReplicaState;
use pbft_production::rpc::{NodeStatusState, RpcServer, RpcServerConfig, RpcState};
use pbft_production::telemetry::init_telemetry;
use pbft_production::{spawn_node_loop, spawn_peer_listener, PeerTransport, TransportConfig};
use pbft_types::{Block, NodeId, ReplicaSet};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::signal;
use tokio::sync::{mpsc, RwLock};
use tracing::info;

/// pBFT replica node.
///
/// Runs one member of a fixed replica group.
#[derive(Parser, Debug)]
#[command(name = "pbft-node")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (TOML)
    #[arg(short, long)]
    config: PathBuf,

    /// Log level filter (overrides RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// RPC listen address (overrides config)
    #[arg(long)]
    rpc_addr: Option<SocketAddr>,
}

/// Top-level node configuration.
#[derive(Debug, Clone, Deserialize)]
struct NodeConfig {
    /// Node identity.
    node: NodeSection,

    /// Listen endpoints and transport tuning.
    network: NetworkSection,

    /// The peer directory: every other member of the group.
    #[serde(default)]
    peers: Vec<PeerEntry>,
}

/// Node identity configuration.
#[derive(Debug, Clone, Deserialize)]
struct NodeSection {
    /// This node's id.
    id: String,

    /// The statically designated primary.
    primary: String,
}

/// Network configuration.
#[derive(Debug, Clone, Deserialize)]
struct NetworkSection {
    /// Address for inbound peer connections.
    peer_listen: SocketAddr,

    /// Address for the client-facing RPC server.
    rpc_listen: SocketAddr,

    /// Bound on outbound connect/write time, in milliseconds.
    #[serde(default = "default_send_timeout_ms")]
    send_timeout_ms: u64,
}

fn default_send_timeout_ms() -> u64 {
    1000
}

/// A peer directory entry.
#[derive(Debug, Clone, Deserialize)]
struct PeerEntry {
    /// The peer's id.
    id: String,

    /// The peer's inbound listen address.
    addr: SocketAddr,
}

impl NodeConfig {
    /// Load configuration from a TOML file.
    fn load(path: &PathBuf) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_telemetry(&cli.log_level);

    let mut config = NodeConfig::load(&cli.config)?;
    if let Some(rpc_addr) = cli.rpc_addr {
        config.network.rpc_listen = rpc_addr;
    }

    let node_id = NodeId::from(config.node.id.clone());
    let primary_id = NodeId::from(config.node.primary.clone());

    // Membership is the peer directory plus this node.
    let mut members: Vec<NodeId> = config
        .peers
        .iter()
        .map(|p| NodeId::from(p.id.clone()))
        .collect();
    members.push(node_id.clone());
    let replicas = ReplicaSet::new(members, primary_id.clone());

    info!(
        node = %node_id,
        primary = %primary_id,
        members = replicas.len(),
        f = replicas.max_faulty(),
        quorum = replicas.quorum(),
        "replica group configured"
    );

    let state = ReplicaState::new(node_id.clone(), replicas);
    let is_primary = state.is_primary();

    // Event channel: peer listener and RPC handlers produce, node loop consumes.
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let peer_addrs: HashMap<NodeId, SocketAddr> = config
        .peers
        .iter()
        .map(|p| (NodeId::from(p.id.clone()), p.addr))
        .collect();
    let transport = PeerTransport::new(
        node_id.clone(),
        peer_addrs,
        TransportConfig {
            send_timeout: Duration::from_millis(config.network.send_timeout_ms),
        },
    );

    let (_peer_addr, _listener_task) =
        spawn_peer_listener(config.network.peer_listen, event_tx.clone())
            .await
            .context("failed to start peer listener")?;

    // Shared snapshots the node loop keeps fresh for the RPC handlers.
    let status = Arc::new(RwLock::new(NodeStatusState {
        node_id: node_id.to_string(),
        view: 0,
        is_primary,
        primary_id: primary_id.to_string(),
        chain_height: 0,
        malicious_mode: "honest".to_string(),
    }));
    let chain = Arc::new(RwLock::new(vec![Block::genesis()]));

    let node_task = spawn_node_loop(state, event_rx, transport, status.clone(), chain.clone());

    let rpc_state = RpcState {
        ready: Arc::new(AtomicBool::new(false)),
        status,
        chain,
        event_tx,
        start_time: Instant::now(),
    };
    let rpc_handle = RpcServer::new(
        RpcServerConfig {
            listen_addr: config.network.rpc_listen,
        },
        rpc_state,
    )
    .start()
    .await
    .context("failed to start RPC server")?;

    rpc_handle.set_ready(true);
    info!(node = %node_id, "node started, press Ctrl+C to stop");

    signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!(node = %node_id, "shutting down");

    rpc_handle.abort();
    node_task.abort();
    Ok(())
}
