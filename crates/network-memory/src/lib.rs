//! In-memory simulated network.
//!
//! Models the abstract peer transport contract: delivery is at most once,
//! with arbitrary (configurable) delay, and may silently drop. The
//! simulation runner asks this module for a routing decision per message
//! and schedules deliveries itself, which keeps the whole simulation
//! deterministic for a fixed seed.

mod network;

pub use network::{Delivery, NetworkConfig, SimulatedNetwork};
