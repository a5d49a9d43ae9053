//! Action types returned by the state machine.

use pbft_types::{Block, ConsensusMessage};

/// All possible outputs from the state machine.
///
/// The runner executes these; the state machine itself performs no I/O.
#[derive(Debug, Clone)]
pub enum Action {
    /// Send a consensus message to every peer.
    ///
    /// Delivery is at-most-once with arbitrary delay and may silently drop;
    /// the quorum logic is the sole correctness mechanism, so no runner
    /// retries or acknowledges.
    Broadcast {
        /// The message to fan out.
        message: ConsensusMessage,
    },

    /// A block was appended to the local chain.
    ///
    /// Notification for the runner: the production node refreshes its RPC
    /// snapshots from it, the simulator counts commits.
    BlockCommitted {
        /// The newly applied block.
        block: Block,
    },
}

impl Action {
    /// Human-readable name for logging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Action::Broadcast { .. } => "Broadcast",
            Action::BlockCommitted { .. } => "BlockCommitted",
        }
    }
}
