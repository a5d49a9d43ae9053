//! Shared state for RPC handlers.

use pbft_core::Event;
use pbft_types::Block;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, RwLock};

/// Shared state for RPC handlers.
///
/// Handlers never touch the state machine; they read snapshots the node
/// loop refreshes after every event, and enqueue events for anything that
/// must mutate the engine.
#[derive(Clone)]
pub struct RpcState {
    /// Ready flag for the readiness probe.
    pub ready: Arc<AtomicBool>,
    /// Node status snapshot, maintained by the node loop.
    pub status: Arc<RwLock<NodeStatusState>>,
    /// Committed chain snapshot, maintained by the node loop.
    pub chain: Arc<RwLock<Vec<Block>>>,
    /// Channel into the node loop.
    pub event_tx: mpsc::UnboundedSender<Event>,
    /// Server start time for uptime reporting.
    pub start_time: Instant,
}

/// Mutable node status, updated by the node loop.
#[derive(Debug, Clone)]
pub struct NodeStatusState {
    /// This node's id.
    pub node_id: String,
    /// Current view.
    pub view: u64,
    /// Whether this node is the primary.
    pub is_primary: bool,
    /// The primary's id, for NOT_PRIMARY redirects.
    pub primary_id: String,
    /// Height of the committed chain tip.
    pub chain_height: u64,
    /// Current fault-injection mode.
    pub malicious_mode: String,
}
