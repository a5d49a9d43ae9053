//! Event types for the deterministic state machine.

use crate::MaliciousMode;
use pbft_types::{CommitMsg, ConsensusMessage, PrePrepareMsg, PrepareMsg};

/// Priority levels for event ordering within the same timestamp.
///
/// Events at the same simulation time are processed in priority order.
/// Lower values = higher priority (processed first). Network traffic
/// already in flight is handled before new external inputs, which keeps
/// causality intact in the deterministic runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum EventPriority {
    /// Consensus messages from other nodes.
    Network = 0,

    /// External inputs: client submissions and control toggles.
    Client = 1,
}

/// All possible events a node can receive.
///
/// Events are **passive data** — they describe something that happened.
/// The state machine processes events and returns actions.
#[derive(Debug, Clone)]
pub enum Event {
    /// A client submitted a payload for inclusion in the chain.
    /// Only the primary initiates consensus for it.
    ClientSubmit {
        /// Opaque payload for the new block.
        data: String,
    },

    /// Received a block proposal from the primary.
    PrePrepareReceived {
        /// The proposal.
        message: PrePrepareMsg,
    },

    /// Received a prepare vote. Sender identity comes from `vote.sender`.
    PrepareReceived {
        /// The vote.
        vote: PrepareMsg,
    },

    /// Received a commit vote. Sender identity comes from `vote.sender`.
    CommitReceived {
        /// The vote.
        vote: CommitMsg,
    },

    /// Operator toggled the fault-injection mode.
    SetMaliciousMode {
        /// The new mode.
        mode: MaliciousMode,
    },
}

impl Event {
    /// The ordering priority of this event.
    pub fn priority(&self) -> EventPriority {
        match self {
            Event::PrePrepareReceived { .. }
            | Event::PrepareReceived { .. }
            | Event::CommitReceived { .. } => EventPriority::Network,
            Event::ClientSubmit { .. } | Event::SetMaliciousMode { .. } => EventPriority::Client,
        }
    }

    /// Human-readable name for logging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Event::ClientSubmit { .. } => "ClientSubmit",
            Event::PrePrepareReceived { .. } => "PrePrepareReceived",
            Event::PrepareReceived { .. } => "PrepareReceived",
            Event::CommitReceived { .. } => "CommitReceived",
            Event::SetMaliciousMode { .. } => "SetMaliciousMode",
        }
    }
}

/// Convert a delivered wire message into the event a receiving node handles.
///
/// Used by both the simulation runner and the production transport so
/// received messages are handled uniformly.
impl From<ConsensusMessage> for Event {
    fn from(message: ConsensusMessage) -> Self {
        match message {
            ConsensusMessage::PrePrepare(message) => Event::PrePrepareReceived { message },
            ConsensusMessage::Prepare(vote) => Event::PrepareReceived { vote },
            ConsensusMessage::Commit(vote) => Event::CommitReceived { vote },
        }
    }
}
