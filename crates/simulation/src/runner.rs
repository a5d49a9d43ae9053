//! Deterministic simulation runner.

use crate::{EventKey, NodeIndex};
use pbft_consensus::ReplicaState;
use pbft_core::{Action, Event, MaliciousMode, StateMachine};
use pbft_network_memory::{Delivery, NetworkConfig, SimulatedNetwork};
use pbft_types::{Block, NodeId, ReplicaSet};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, trace};

/// Configuration for a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Number of replicas. `3f + 1` for tolerance of `f` faults.
    pub num_nodes: usize,
    /// Network behavior.
    pub network: NetworkConfig,
    /// RNG seed. Same seed, same inputs — same run.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_nodes: 5,
            network: NetworkConfig::default(),
            seed: 42,
        }
    }
}

/// Statistics collected during simulation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SimulationStats {
    /// Total events processed.
    pub events_processed: u64,
    /// Messages scheduled for delivery.
    pub messages_sent: u64,
    /// Messages dropped due to a partition.
    pub messages_dropped_partition: u64,
    /// Messages dropped due to packet loss.
    pub messages_dropped_loss: u64,
    /// Blocks applied across all nodes.
    pub blocks_committed: u64,
}

impl SimulationStats {
    /// Total messages dropped for any reason.
    pub fn messages_dropped(&self) -> u64 {
        self.messages_dropped_partition + self.messages_dropped_loss
    }
}

/// Deterministic simulation runner.
///
/// Owns one [`ReplicaState`] per node and a global event queue ordered by
/// [`EventKey`]. Nodes are named `node1` through `nodeN`; `node1` is the
/// primary, matching the reference deployment.
pub struct SimulationRunner {
    /// Per-node state machines. Index corresponds to [`NodeIndex`].
    nodes: Vec<ReplicaState>,

    /// Node ids, parallel to `nodes`.
    ids: Vec<NodeId>,

    /// Global event queue, ordered deterministically.
    queue: BTreeMap<EventKey, Event>,

    /// Insertion counter for FIFO tie-breaking.
    sequence: u64,

    /// Current simulation time.
    now: Duration,

    /// Network simulator (latency, partitions, packet loss).
    network: SimulatedNetwork,

    /// RNG for network conditions (seeded for determinism).
    rng: ChaCha8Rng,

    /// Run statistics.
    stats: SimulationStats,
}

impl SimulationRunner {
    /// Create a runner with `config.num_nodes` replicas at genesis.
    pub fn new(config: SimulationConfig) -> Self {
        let ids: Vec<NodeId> = (1..=config.num_nodes)
            .map(|i| NodeId(format!("node{i}")))
            .collect();
        let replica_set = ReplicaSet::new(ids.clone(), ids[0].clone());

        let nodes = ids
            .iter()
            .map(|id| ReplicaState::new(id.clone(), replica_set.clone()))
            .collect();

        Self {
            nodes,
            ids,
            queue: BTreeMap::new(),
            sequence: 0,
            now: Duration::ZERO,
            network: SimulatedNetwork::new(config.network),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            stats: SimulationStats::default(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Inputs
    // ═══════════════════════════════════════════════════════════════════════

    /// Submit a client payload at `node`, at the current simulation time.
    pub fn submit(&mut self, node: NodeIndex, data: &str) {
        self.schedule(
            self.now,
            node,
            Event::ClientSubmit {
                data: data.to_string(),
            },
        );
    }

    /// Toggle a node's fault-injection mode.
    pub fn set_malicious(&mut self, node: NodeIndex, mode: MaliciousMode) {
        self.schedule(self.now, node, Event::SetMaliciousMode { mode });
    }

    /// Deliver an arbitrary event to a node, bypassing the network. Used by
    /// tests that need to inject forged traffic.
    pub fn inject(&mut self, node: NodeIndex, event: Event) {
        self.schedule(self.now, node, event);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Execution
    // ═══════════════════════════════════════════════════════════════════════

    /// Process the next queued event. Returns `false` when the queue is
    /// empty.
    pub fn step(&mut self) -> bool {
        let Some((key, event)) = self.queue.pop_first() else {
            return false;
        };
        self.now = self.now.max(key.time);
        self.stats.events_processed += 1;

        trace!(
            node = %self.ids[key.node],
            event = event.type_name(),
            at = ?self.now,
            "processing event"
        );

        let state = &mut self.nodes[key.node];
        state.set_time(self.now);
        let actions = state.handle(event);

        for action in actions {
            self.execute(key.node, action);
        }
        true
    }

    /// Run until no events remain.
    pub fn run_until_idle(&mut self) {
        while self.step() {}
    }

    fn execute(&mut self, from: NodeIndex, action: Action) {
        trace!(node = %self.ids[from], action = action.type_name(), "executing action");
        match action {
            Action::Broadcast { message } => {
                let from_id = self.ids[from].clone();
                for to in 0..self.nodes.len() {
                    if to == from {
                        continue;
                    }
                    match self.network.route(&from_id, &self.ids[to], &mut self.rng) {
                        Delivery::Deliver { latency } => {
                            self.stats.messages_sent += 1;
                            self.schedule(self.now + latency, to, Event::from(message.clone()));
                        }
                        Delivery::DroppedPartition => {
                            self.stats.messages_dropped_partition += 1;
                        }
                        Delivery::DroppedLoss => {
                            self.stats.messages_dropped_loss += 1;
                        }
                    }
                }
            }
            Action::BlockCommitted { block } => {
                self.stats.blocks_committed += 1;
                debug!(
                    node = %self.ids[from],
                    height = %block.height,
                    "simulated node committed block"
                );
            }
        }
    }

    fn schedule(&mut self, time: Duration, node: NodeIndex, event: Event) {
        let key = EventKey {
            time,
            priority: event.priority(),
            node,
            sequence: self.sequence,
        };
        self.sequence += 1;
        self.queue.insert(key, event);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════════════

    /// Number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// A node's state machine.
    pub fn node(&self, node: NodeIndex) -> &ReplicaState {
        &self.nodes[node]
    }

    /// A node's committed chain, genesis first.
    pub fn chain(&self, node: NodeIndex) -> &[Block] {
        self.nodes[node].chain().blocks()
    }

    /// A node's chain height (0 = genesis only).
    pub fn chain_height(&self, node: NodeIndex) -> u64 {
        self.nodes[node].chain().height().0
    }

    /// Run statistics.
    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    /// The network simulator, for partition control.
    pub fn network_mut(&mut self) -> &mut SimulatedNetwork {
        &mut self.network
    }

    /// All node ids, in index order.
    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }
}
