//! Deterministic multi-node simulation.
//!
//! Runs N replica state machines against a single ordered event queue and a
//! [`pbft_network_memory::SimulatedNetwork`]. Given the same seed and the
//! same inputs, every run produces identical chains on every node, which is
//! what the Byzantine scenario tests build on.

mod event_queue;
mod runner;

pub use event_queue::EventKey;
pub use runner::{SimulationConfig, SimulationRunner, SimulationStats};

/// Index of a node in the simulation. Node `i` has id `node{i+1}`.
pub type NodeIndex = usize;
