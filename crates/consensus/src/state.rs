//! The per-replica consensus state machine.

use crate::chain::Blockchain;
use crate::message_log::{MessageLog, ProposalOutcome};
use pbft_core::{Action, Event, MaliciousMode, StateMachine};
use pbft_types::{
    Block, CommitMsg, ConsensusMessage, Hash, NodeId, PrePrepareMsg, PrepareMsg, ReplicaSet,
    SequenceNumber, ViewNumber,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// pBFT replica state machine.
///
/// Drives the three-phase protocol reactively: every inbound event may
/// advance one slot's state, and the `prepared_seen` / `committed_seen`
/// guard sets ensure each transition fires exactly once regardless of
/// message duplication or reordering.
///
/// # State Machine Flow
///
/// 1. **Client submit** → primary allocates a slot, builds and broadcasts
///    the pre-prepare, then enters its own prepare phase
/// 2. **Pre-prepare received** → validate, record, broadcast prepare
/// 3. **Prepare received** → tally; at a quorum of matching prepares,
///    broadcast commit (once)
/// 4. **Commit received** → tally; at a quorum of matching commits, apply
///    the pending block — in strict sequence order
pub struct ReplicaState {
    // ═══════════════════════════════════════════════════════════════════════
    // Identity
    // ═══════════════════════════════════════════════════════════════════════
    /// This replica's id.
    node_id: NodeId,

    /// The fixed group membership and primary designation.
    replicas: ReplicaSet,

    // ═══════════════════════════════════════════════════════════════════════
    // Chain state
    // ═══════════════════════════════════════════════════════════════════════
    /// Current view. Fixed at 0; view change is out of scope.
    view: ViewNumber,

    /// Next slot the primary will assign. Meaningful on the primary only.
    next_sequence: SequenceNumber,

    /// Committed blocks, genesis first.
    chain: Blockchain,

    // ═══════════════════════════════════════════════════════════════════════
    // Per-slot consensus state
    // ═══════════════════════════════════════════════════════════════════════
    /// Message tallies keyed by slot and `(slot, digest)`.
    log: MessageLog,

    /// Accepted proposals currently under consensus.
    pending: HashMap<SequenceNumber, Block>,

    /// Slots whose prepare quorum already triggered a commit vote.
    prepared_seen: HashSet<(SequenceNumber, Hash)>,

    /// Slots whose commit quorum already triggered (or scheduled) an apply.
    committed_seen: HashSet<(SequenceNumber, Hash)>,

    /// Committed blocks waiting for an earlier slot to apply first.
    parked: BTreeMap<SequenceNumber, Block>,

    /// Highest slot applied to the chain. Genesis occupies slot 0.
    last_applied: SequenceNumber,

    // ═══════════════════════════════════════════════════════════════════════
    // Fault injection
    // ═══════════════════════════════════════════════════════════════════════
    /// Current outbound behavior mode.
    malicious: MaliciousMode,

    /// Time fed in by the runner; stamps proposed blocks.
    now: Duration,
}

impl ReplicaState {
    /// Create a replica at genesis.
    ///
    /// # Panics
    ///
    /// Panics if `node_id` is not a member of `replicas`; that is a startup
    /// configuration error.
    pub fn new(node_id: NodeId, replicas: ReplicaSet) -> Self {
        assert!(
            replicas.contains(&node_id),
            "node {node_id} is not a member of its own replica set"
        );
        Self {
            node_id,
            replicas,
            view: ViewNumber(0),
            next_sequence: SequenceNumber(1),
            chain: Blockchain::new(),
            log: MessageLog::new(),
            pending: HashMap::new(),
            prepared_seen: HashSet::new(),
            committed_seen: HashSet::new(),
            parked: BTreeMap::new(),
            last_applied: SequenceNumber(0),
            malicious: MaliciousMode::Honest,
            now: Duration::ZERO,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════════════

    /// This replica's id.
    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// Whether this replica is the primary.
    pub fn is_primary(&self) -> bool {
        self.replicas.is_primary(&self.node_id)
    }

    /// The group membership.
    pub fn replicas(&self) -> &ReplicaSet {
        &self.replicas
    }

    /// Current view.
    pub fn view(&self) -> ViewNumber {
        self.view
    }

    /// The committed chain.
    pub fn chain(&self) -> &Blockchain {
        &self.chain
    }

    /// Current fault-injection mode.
    pub fn malicious_mode(&self) -> MaliciousMode {
        self.malicious
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Event handlers
    // ═══════════════════════════════════════════════════════════════════════

    fn on_client_submit(&mut self, data: String) -> Vec<Action> {
        if !self.is_primary() {
            warn!(
                node = %self.node_id,
                primary = %self.replicas.primary(),
                "client submission at non-primary replica rejected"
            );
            return vec![];
        }

        let sequence = self.next_sequence;
        self.next_sequence = sequence.next();

        let parent = self.projected_tip(sequence);
        let block = Block::new(
            data,
            parent.block_hash,
            parent.height.next(),
            self.view,
            sequence,
            self.now.as_millis() as u64,
        );

        info!(
            node = %self.node_id,
            seq = %sequence,
            height = %block.height,
            hash = %block.block_hash,
            "primary initiating consensus"
        );

        let recorded = self.log.record_pre_prepare(sequence, block.clone());
        debug_assert_eq!(recorded, ProposalOutcome::Inserted);
        self.pending.insert(sequence, block.clone());

        let mut actions = Vec::new();
        self.broadcast(
            ConsensusMessage::PrePrepare(PrePrepareMsg {
                view: self.view,
                sequence,
                block: block.clone(),
                sender: self.node_id.clone(),
            }),
            &mut actions,
        );

        // The primary enters its own prepare phase immediately, as if it had
        // received its own pre-prepare.
        self.emit_prepare(sequence, block.block_hash, &mut actions);
        self.try_advance(sequence, &mut actions);
        actions
    }

    fn on_pre_prepare(&mut self, message: PrePrepareMsg) -> Vec<Action> {
        let PrePrepareMsg {
            view,
            sequence,
            block,
            sender,
        } = message;

        if view != self.view {
            warn!(
                node = %self.node_id,
                got = %view,
                expected = %self.view,
                "view mismatch: dropping pre-prepare"
            );
            return vec![];
        }
        if !self.replicas.is_primary(&sender) {
            warn!(node = %self.node_id, %sender, "pre-prepare from non-primary: dropping");
            return vec![];
        }
        if block.sequence != sequence || block.view != view {
            warn!(
                node = %self.node_id,
                seq = %sequence,
                "pre-prepare envelope disagrees with block slot: dropping"
            );
            return vec![];
        }

        // An occupied slot is handled before anything else: the first
        // accepted proposal is never displaced, and an identical re-delivery
        // must stay a no-op.
        if let Some(existing) = self.log.proposal(sequence) {
            if existing.block_hash == block.block_hash {
                debug!(node = %self.node_id, seq = %sequence, "duplicate pre-prepare ignored");
            } else {
                warn!(
                    node = %self.node_id,
                    seq = %sequence,
                    first = %existing.block_hash,
                    second = %block.block_hash,
                    "equivocation: conflicting pre-prepare rejected"
                );
            }
            return vec![];
        }

        if !block.digest_matches() {
            warn!(
                node = %self.node_id,
                seq = %sequence,
                hash = %block.block_hash,
                "invalid block: digest mismatch"
            );
            return vec![];
        }
        if sequence <= self.last_applied {
            debug!(node = %self.node_id, seq = %sequence, "pre-prepare for an applied slot ignored");
            return vec![];
        }
        if !block.extends(self.projected_tip(sequence)) {
            warn!(
                node = %self.node_id,
                seq = %sequence,
                height = %block.height,
                parent = %block.previous_hash,
                "invalid block: does not extend the chain"
            );
            return vec![];
        }

        match self.log.record_pre_prepare(sequence, block.clone()) {
            ProposalOutcome::Inserted => {}
            _ => return vec![],
        }
        self.pending.insert(sequence, block.clone());

        info!(
            node = %self.node_id,
            seq = %sequence,
            hash = %block.block_hash,
            "pre-prepare accepted"
        );

        let mut actions = Vec::new();
        self.emit_prepare(sequence, block.block_hash, &mut actions);
        self.try_advance(sequence, &mut actions);
        actions
    }

    fn on_prepare(&mut self, vote: PrepareMsg) -> Vec<Action> {
        if vote.view != self.view {
            warn!(node = %self.node_id, got = %vote.view, "view mismatch: dropping prepare");
            return vec![];
        }
        if !self.replicas.contains(&vote.sender) {
            warn!(node = %self.node_id, sender = %vote.sender, "prepare from unknown sender dropped");
            return vec![];
        }
        if !self
            .log
            .record_prepare(vote.sequence, vote.digest, vote.sender.clone())
        {
            trace!(node = %self.node_id, seq = %vote.sequence, sender = %vote.sender, "duplicate prepare ignored");
            return vec![];
        }

        debug!(
            node = %self.node_id,
            seq = %vote.sequence,
            sender = %vote.sender,
            count = self.log.prepare_count(vote.sequence, vote.digest),
            quorum = self.replicas.quorum(),
            "prepare recorded"
        );

        let mut actions = Vec::new();
        self.try_advance(vote.sequence, &mut actions);
        actions
    }

    fn on_commit(&mut self, vote: CommitMsg) -> Vec<Action> {
        if vote.view != self.view {
            warn!(node = %self.node_id, got = %vote.view, "view mismatch: dropping commit");
            return vec![];
        }
        if !self.replicas.contains(&vote.sender) {
            warn!(node = %self.node_id, sender = %vote.sender, "commit from unknown sender dropped");
            return vec![];
        }
        if !self
            .log
            .record_commit(vote.sequence, vote.digest, vote.sender.clone())
        {
            trace!(node = %self.node_id, seq = %vote.sequence, sender = %vote.sender, "duplicate commit ignored");
            return vec![];
        }

        debug!(
            node = %self.node_id,
            seq = %vote.sequence,
            sender = %vote.sender,
            count = self.log.commit_count(vote.sequence, vote.digest),
            quorum = self.replicas.quorum(),
            "commit recorded"
        );

        let mut actions = Vec::new();
        self.try_advance(vote.sequence, &mut actions);
        actions
    }

    fn on_set_malicious(&mut self, mode: MaliciousMode) -> Vec<Action> {
        info!(node = %self.node_id, %mode, "malicious mode set");
        self.malicious = mode;
        vec![]
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Phase transitions
    // ═══════════════════════════════════════════════════════════════════════

    /// Re-evaluate the quorum predicates for one slot and fire any
    /// transition that newly became true. Safe to call after every
    /// mutation; the guard sets keep transitions one-shot.
    fn try_advance(&mut self, sequence: SequenceNumber, actions: &mut Vec<Action>) {
        // Without the accepted proposal there is nothing to vote or apply;
        // speculative votes wait in the log until it arrives.
        let Some(digest) = self.pending.get(&sequence).map(|b| b.block_hash) else {
            return;
        };
        let quorum = self.replicas.quorum();

        if !self.prepared_seen.contains(&(sequence, digest))
            && self.log.prepared(sequence, digest, quorum)
        {
            self.prepared_seen.insert((sequence, digest));
            info!(
                node = %self.node_id,
                seq = %sequence,
                "prepared: quorum of matching prepares"
            );
            self.emit_commit(sequence, digest, actions);
        }

        if !self.committed_seen.contains(&(sequence, digest))
            && self.log.committed(sequence, digest, quorum)
        {
            self.committed_seen.insert((sequence, digest));
            info!(
                node = %self.node_id,
                seq = %sequence,
                "committed locally: quorum of commits"
            );
            if let Some(block) = self.pending.remove(&sequence) {
                self.parked.insert(sequence, block);
                self.drain_ready(actions);
            }
        }
    }

    /// Apply parked blocks in strictly increasing slot order. A commit
    /// quorum landing for slot `s` while `s - 1` is still in flight stays
    /// parked until the gap closes.
    fn drain_ready(&mut self, actions: &mut Vec<Action>) {
        loop {
            let next = self.last_applied.next();
            let Some(block) = self.parked.remove(&next) else {
                break;
            };
            match self.chain.append(block.clone()) {
                Ok(()) => {
                    self.last_applied = next;
                    info!(
                        node = %self.node_id,
                        height = %block.height,
                        hash = %block.block_hash,
                        data = %block.data,
                        "block applied to chain"
                    );
                    actions.push(Action::BlockCommitted { block });
                }
                Err(err) => {
                    error!(
                        node = %self.node_id,
                        seq = %next,
                        %err,
                        "refusing to apply block that fails chain validation"
                    );
                    break;
                }
            }
        }
    }

    /// Broadcast our prepare vote for a slot, recording the self-vote.
    /// The self-vote records whatever digest actually goes out, so a
    /// wrong-hash node votes for its own corruption.
    fn emit_prepare(&mut self, sequence: SequenceNumber, digest: Hash, actions: &mut Vec<Action>) {
        let digest = self.vote_digest(digest);
        self.log.record_prepare(sequence, digest, self.node_id.clone());
        self.broadcast(
            ConsensusMessage::Prepare(PrepareMsg {
                view: self.view,
                sequence,
                digest,
                sender: self.node_id.clone(),
            }),
            actions,
        );
    }

    /// Broadcast our commit vote for a slot, recording the self-vote.
    fn emit_commit(&mut self, sequence: SequenceNumber, digest: Hash, actions: &mut Vec<Action>) {
        let digest = self.vote_digest(digest);
        self.log.record_commit(sequence, digest, self.node_id.clone());
        self.broadcast(
            ConsensusMessage::Commit(CommitMsg {
                view: self.view,
                sequence,
                digest,
                sender: self.node_id.clone(),
            }),
            actions,
        );
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Helpers
    // ═══════════════════════════════════════════════════════════════════════

    /// The block a proposal at `sequence` must extend: the applied tip, or
    /// the in-flight block at `sequence - 1` when the primary pipelines
    /// ahead of the commit point.
    fn projected_tip(&self, sequence: SequenceNumber) -> &Block {
        match sequence.prev() {
            Some(prev) if prev > self.last_applied => self
                .pending
                .get(&prev)
                .or_else(|| self.parked.get(&prev))
                .unwrap_or_else(|| self.chain.tip()),
            _ => self.chain.tip(),
        }
    }

    /// The digest this node puts in outbound votes. Honest nodes vote the
    /// true digest; a wrong-hash node votes a deterministic corruption.
    fn vote_digest(&self, digest: Hash) -> Hash {
        match self.malicious {
            MaliciousMode::WrongHash => Hash::from_parts(&[b"corrupted", digest.as_bytes()]),
            _ => digest,
        }
    }

    /// Queue a broadcast unless this node is in silent mode. The decision
    /// happens here, inside the state machine, so the guards and the
    /// suppression are taken under the same single-writer discipline.
    fn broadcast(&self, message: ConsensusMessage, actions: &mut Vec<Action>) {
        if self.malicious.is_silent() {
            debug!(
                node = %self.node_id,
                msg = message.type_name(),
                "silent mode: dropping outbound message"
            );
            return;
        }
        actions.push(Action::Broadcast { message });
    }
}

impl StateMachine for ReplicaState {
    fn handle(&mut self, event: Event) -> Vec<Action> {
        match event {
            Event::ClientSubmit { data } => self.on_client_submit(data),
            Event::PrePrepareReceived { message } => self.on_pre_prepare(message),
            Event::PrepareReceived { vote } => self.on_prepare(vote),
            Event::CommitReceived { vote } => self.on_commit(vote),
            Event::SetMaliciousMode { mode } => self.on_set_malicious(mode),
        }
    }

    fn set_time(&mut self, now: Duration) {
        self.now = now;
    }

    fn now(&self) -> Duration {
        self.now
    }
}
