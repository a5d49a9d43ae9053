//! The task that owns the consensus state machine.

use crate::rpc::NodeStatusState;
use crate::transport::PeerTransport;
use pbft_consensus::ReplicaState;
use pbft_core::{Action, Event, StateMachine};
use pbft_types::Block;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Spawn the node event loop.
///
/// The loop is the single writer of the state machine: it receives events
/// from the peer listener and the RPC handlers over `event_rx`, lets the
/// engine process them, then executes the returned actions. Broadcast I/O
/// happens on the transport's writer tasks, outside this loop's critical
/// path. After every event the RPC snapshots are refreshed so handlers can
/// answer without touching the state machine.
pub fn spawn_node_loop(
    mut state: ReplicaState,
    mut event_rx: mpsc::UnboundedReceiver<Event>,
    transport: Arc<PeerTransport>,
    status: Arc<RwLock<NodeStatusState>>,
    chain: Arc<RwLock<Vec<Block>>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let start = Instant::now();
        info!(node = %state.node_id(), "node loop started");

        while let Some(event) = event_rx.recv().await {
            state.set_time(start.elapsed());
            let actions = state.handle(event);

            for action in actions {
                match action {
                    Action::Broadcast { message } => {
                        if let Err(err) = transport.broadcast(&message) {
                            warn!(node = %state.node_id(), %err, "failed to encode outbound message");
                        }
                    }
                    Action::BlockCommitted { block } => {
                        chain.write().await.push(block);
                    }
                }
            }

            let mut snapshot = status.write().await;
            snapshot.view = state.view().0;
            snapshot.chain_height = state.chain().height().0;
            snapshot.malicious_mode = state.malicious_mode().as_str().to_string();
        }

        info!(node = %state.node_id(), "event channel closed; node loop exiting");
    })
}
