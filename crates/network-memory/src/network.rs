//! Simulated network with deterministic latency, packet loss, and partitions.

use pbft_types::NodeId;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use std::time::Duration;

/// Configuration for the simulated network.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Base one-way latency.
    pub base_latency: Duration,
    /// Jitter as a fraction of base latency (0.0 - 1.0).
    pub jitter_fraction: f64,
    /// Packet loss rate (0.0 - 1.0). Messages are dropped with this probability.
    pub packet_loss_rate: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            base_latency: Duration::from_millis(50),
            jitter_fraction: 0.1,
            packet_loss_rate: 0.0,
        }
    }
}

/// Routing decision for a single message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Deliver after the sampled one-way latency.
    Deliver {
        /// Sampled latency for this delivery.
        latency: Duration,
    },
    /// Dropped because sender and receiver are partitioned.
    DroppedPartition,
    /// Dropped by probabilistic packet loss.
    DroppedLoss,
}

/// Simulated network for deterministic message delivery.
///
/// Supports configurable latency with jitter, probabilistic packet loss,
/// and directional partitions. The caller owns the RNG so that identical
/// seeds replay identical network weather.
#[derive(Debug)]
pub struct SimulatedNetwork {
    config: NetworkConfig,
    /// Partitioned node pairs. If `(a, b)` is present, messages from `a`
    /// to `b` are dropped. Directional; both directions are inserted for a
    /// bidirectional cut.
    partitions: HashSet<(NodeId, NodeId)>,
}

impl SimulatedNetwork {
    /// Create a simulated network.
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            config,
            partitions: HashSet::new(),
        }
    }

    /// Decide the fate of one message from `from` to `to`.
    pub fn route(&self, from: &NodeId, to: &NodeId, rng: &mut ChaCha8Rng) -> Delivery {
        if self.is_partitioned(from, to) {
            return Delivery::DroppedPartition;
        }
        if self.config.packet_loss_rate > 0.0 && rng.gen::<f64>() < self.config.packet_loss_rate {
            return Delivery::DroppedLoss;
        }
        Delivery::Deliver {
            latency: self.sample_latency(rng),
        }
    }

    /// Sample a one-way latency: base plus uniform jitter.
    fn sample_latency(&self, rng: &mut ChaCha8Rng) -> Duration {
        let base = self.config.base_latency;
        if self.config.jitter_fraction <= 0.0 {
            return base;
        }
        let jitter = base.mul_f64(self.config.jitter_fraction * rng.gen::<f64>());
        base + jitter
    }

    // ─── Partition Management ───

    /// Whether messages from `from` to `to` are currently cut.
    pub fn is_partitioned(&self, from: &NodeId, to: &NodeId) -> bool {
        self.partitions.contains(&(from.clone(), to.clone()))
    }

    /// Cut both directions between two nodes.
    pub fn partition_bidirectional(&mut self, a: &NodeId, b: &NodeId) {
        self.partitions.insert((a.clone(), b.clone()));
        self.partitions.insert((b.clone(), a.clone()));
    }

    /// Cut all links between two groups, both directions.
    pub fn partition_groups(&mut self, group_a: &[NodeId], group_b: &[NodeId]) {
        for a in group_a {
            for b in group_b {
                self.partition_bidirectional(a, b);
            }
        }
    }

    /// Isolate one node from every other member.
    pub fn isolate_node(&mut self, node: &NodeId, all: &[NodeId]) {
        for other in all {
            if other != node {
                self.partition_bidirectional(node, other);
            }
        }
    }

    /// Restore full connectivity.
    pub fn heal_all(&mut self) {
        self.partitions.clear();
    }

    /// Number of active directional cuts.
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Change the packet loss rate at runtime.
    pub fn set_packet_loss_rate(&mut self, rate: f64) {
        self.config.packet_loss_rate = rate.clamp(0.0, 1.0);
    }
}
