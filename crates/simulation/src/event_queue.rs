//! Event queue key with deterministic ordering.

use crate::NodeIndex;
use pbft_core::EventPriority;
use std::cmp::Ordering;
use std::time::Duration;

/// Key for ordering events in the simulation queue.
///
/// Events are ordered by:
/// 1. Time (earlier first)
/// 2. Priority (network traffic before new client inputs)
/// 3. Node index (deterministic ordering)
/// 4. Sequence number (FIFO for same time/priority/node)
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct EventKey {
    /// When this event should be processed.
    pub time: Duration,
    /// Priority for ordering at the same time.
    pub priority: EventPriority,
    /// Which node receives this event.
    pub node: NodeIndex,
    /// Insertion counter for deterministic FIFO ordering.
    pub sequence: u64,
}

impl Ord for EventKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .cmp(&other.time)
            .then(self.priority.cmp(&other.priority))
            .then(self.node.cmp(&other.node))
            .then(self.sequence.cmp(&other.sequence))
    }
}

impl PartialOrd for EventKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_dominates() {
        let earlier = EventKey {
            time: Duration::from_secs(1),
            priority: EventPriority::Client,
            node: 9,
            sequence: 9,
        };
        let later = EventKey {
            time: Duration::from_secs(2),
            priority: EventPriority::Network,
            node: 0,
            sequence: 0,
        };
        assert!(earlier < later);
    }

    #[test]
    fn test_network_before_client_at_same_time() {
        let network = EventKey {
            time: Duration::from_secs(1),
            priority: EventPriority::Network,
            node: 1,
            sequence: 5,
        };
        let client = EventKey {
            time: Duration::from_secs(1),
            priority: EventPriority::Client,
            node: 0,
            sequence: 1,
        };
        assert!(network < client);
    }

    #[test]
    fn test_fifo_within_node() {
        let first = EventKey {
            time: Duration::from_secs(1),
            priority: EventPriority::Network,
            node: 0,
            sequence: 1,
        };
        let second = EventKey {
            time: Duration::from_secs(1),
            priority: EventPriority::Network,
            node: 0,
            sequence: 2,
        };
        assert!(first < second);
    }
}
