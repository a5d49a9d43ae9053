//! Consensus wire messages.
//!
//! One message type per protocol phase. The pre-prepare carries the full
//! block; prepares and commits carry only the digest being voted on, keyed
//! by `(sequence, digest)` at the receiver so that mismatched votes from
//! Byzantine senders never pool into the same tally.

use crate::{Block, Hash, NodeId, SequenceNumber, ViewNumber};
use sbor::prelude::*;

/// Primary's proposal for a slot.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct PrePrepareMsg {
    /// View the proposal was made under.
    pub view: ViewNumber,
    /// Slot being proposed.
    pub sequence: SequenceNumber,
    /// The proposed block.
    pub block: Block,
    /// Proposing node. Must be the primary.
    pub sender: NodeId,
}

/// A replica's prepare vote for `(sequence, digest)`.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct PrepareMsg {
    /// View the vote was cast under.
    pub view: ViewNumber,
    /// Slot being voted on.
    pub sequence: SequenceNumber,
    /// Digest of the block being voted for.
    pub digest: Hash,
    /// Voting node.
    pub sender: NodeId,
}

/// A replica's commit vote for `(sequence, digest)`.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct CommitMsg {
    /// View the vote was cast under.
    pub view: ViewNumber,
    /// Slot being voted on.
    pub sequence: SequenceNumber,
    /// Digest of the block being voted for.
    pub digest: Hash,
    /// Voting node.
    pub sender: NodeId,
}

/// Any consensus message a node can put on the wire.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub enum ConsensusMessage {
    /// Primary's block proposal.
    PrePrepare(PrePrepareMsg),
    /// Prepare-phase vote.
    Prepare(PrepareMsg),
    /// Commit-phase vote.
    Commit(CommitMsg),
}

impl ConsensusMessage {
    /// Human-readable name for logging.
    pub fn type_name(&self) -> &'static str {
        match self {
            ConsensusMessage::PrePrepare(_) => "PrePrepare",
            ConsensusMessage::Prepare(_) => "Prepare",
            ConsensusMessage::Commit(_) => "Commit",
        }
    }

    /// The sending node.
    pub fn sender(&self) -> &NodeId {
        match self {
            ConsensusMessage::PrePrepare(m) => &m.sender,
            ConsensusMessage::Prepare(m) => &m.sender,
            ConsensusMessage::Commit(m) => &m.sender,
        }
    }

    /// The slot this message concerns.
    pub fn sequence(&self) -> SequenceNumber {
        match self {
            ConsensusMessage::PrePrepare(m) => m.sequence,
            ConsensusMessage::Prepare(m) => m.sequence,
            ConsensusMessage::Commit(m) => m.sequence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BlockHeight;

    #[test]
    fn test_sbor_roundtrip() {
        let block = Block::new(
            "payload".to_string(),
            Hash::ZERO,
            BlockHeight(1),
            ViewNumber(0),
            SequenceNumber(1),
            7,
        );
        let msg = ConsensusMessage::PrePrepare(PrePrepareMsg {
            view: ViewNumber(0),
            sequence: SequenceNumber(1),
            block,
            sender: NodeId::from("node1"),
        });

        let bytes = basic_encode(&msg).unwrap();
        let decoded: ConsensusMessage = basic_decode(&bytes).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_accessors() {
        let msg = ConsensusMessage::Prepare(PrepareMsg {
            view: ViewNumber(0),
            sequence: SequenceNumber(3),
            digest: Hash::from_bytes(b"d"),
            sender: NodeId::from("node2"),
        });
        assert_eq!(msg.type_name(), "Prepare");
        assert_eq!(msg.sender(), &NodeId::from("node2"));
        assert_eq!(msg.sequence(), SequenceNumber(3));
    }
}
