//! Per-sequence message log and quorum accounting.

use pbft_types::{Block, Hash, NodeId, SequenceNumber};
use std::collections::{HashMap, HashSet};

/// Result of recording a pre-prepare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalOutcome {
    /// The slot was vacant; the proposal is now recorded.
    Inserted,
    /// The identical proposal was already recorded. No-op.
    Duplicate,
    /// A different proposal already occupies the slot. The first one stays.
    Equivocation,
}

/// Tallies of pre-prepare / prepare / commit messages per slot.
///
/// Prepare and commit votes are keyed by `(sequence, digest)` and held as
/// sender sets: a Byzantine replica voting several digests for one slot
/// lands in disjoint tallies, and duplicate votes from one sender count
/// once. Entries are retained for the life of the process (log garbage
/// collection is out of scope).
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    pre_prepares: HashMap<SequenceNumber, Block>,
    prepares: HashMap<(SequenceNumber, Hash), HashSet<NodeId>>,
    commits: HashMap<(SequenceNumber, Hash), HashSet<NodeId>>,
}

impl MessageLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the primary's proposal for a slot. First proposal wins;
    /// a second distinct block at the same slot is an equivocation.
    pub fn record_pre_prepare(&mut self, sequence: SequenceNumber, block: Block) -> ProposalOutcome {
        match self.pre_prepares.get(&sequence) {
            None => {
                self.pre_prepares.insert(sequence, block);
                ProposalOutcome::Inserted
            }
            Some(existing) if existing.block_hash == block.block_hash => ProposalOutcome::Duplicate,
            Some(_) => ProposalOutcome::Equivocation,
        }
    }

    /// The recorded proposal for a slot, if any.
    pub fn proposal(&self, sequence: SequenceNumber) -> Option<&Block> {
        self.pre_prepares.get(&sequence)
    }

    /// Record a prepare vote. Returns `false` for a duplicate from the
    /// same sender. Votes are accepted speculatively: the pre-prepare for
    /// the slot need not have arrived yet.
    pub fn record_prepare(&mut self, sequence: SequenceNumber, digest: Hash, sender: NodeId) -> bool {
        self.prepares
            .entry((sequence, digest))
            .or_default()
            .insert(sender)
    }

    /// Record a commit vote. Same semantics as [`Self::record_prepare`].
    pub fn record_commit(&mut self, sequence: SequenceNumber, digest: Hash, sender: NodeId) -> bool {
        self.commits
            .entry((sequence, digest))
            .or_default()
            .insert(sender)
    }

    /// Number of distinct prepare voters for `(sequence, digest)`.
    pub fn prepare_count(&self, sequence: SequenceNumber, digest: Hash) -> usize {
        self.prepares
            .get(&(sequence, digest))
            .map_or(0, HashSet::len)
    }

    /// Number of distinct commit voters for `(sequence, digest)`.
    pub fn commit_count(&self, sequence: SequenceNumber, digest: Hash) -> usize {
        self.commits
            .get(&(sequence, digest))
            .map_or(0, HashSet::len)
    }

    /// The prepared predicate: a recorded pre-prepare with this digest plus
    /// a quorum of matching prepares.
    pub fn prepared(&self, sequence: SequenceNumber, digest: Hash, quorum: usize) -> bool {
        self.pre_prepares
            .get(&sequence)
            .is_some_and(|b| b.block_hash == digest)
            && self.prepare_count(sequence, digest) >= quorum
    }

    /// The committed-local predicate: a quorum of matching commits.
    pub fn committed(&self, sequence: SequenceNumber, digest: Hash, quorum: usize) -> bool {
        self.commit_count(sequence, digest) >= quorum
    }
}
