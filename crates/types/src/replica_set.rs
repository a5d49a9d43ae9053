//! Fixed replica membership and quorum math.

use crate::NodeId;
use sbor::prelude::*;

/// The fixed set of replicas forming the group, with its designated primary.
///
/// Membership never changes during the life of the process. With `n`
/// members the group tolerates `f = (n - 1) / 3` Byzantine replicas and
/// every quorum is `2f + 1`.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct ReplicaSet {
    /// All member ids, ordered.
    members: Vec<NodeId>,

    /// The statically designated primary.
    primary: NodeId,
}

impl ReplicaSet {
    /// Create a replica set. Members are sorted and deduplicated; the
    /// primary must be a member.
    ///
    /// # Panics
    ///
    /// Panics if `members` is empty or `primary` is not a member. Both are
    /// startup configuration errors with no sensible recovery.
    pub fn new(mut members: Vec<NodeId>, primary: NodeId) -> Self {
        assert!(!members.is_empty(), "replica set must not be empty");
        members.sort();
        members.dedup();
        assert!(
            members.contains(&primary),
            "primary {primary} is not a member of the replica set"
        );
        Self { members, primary }
    }

    /// Number of replicas in the group.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the set is empty. Never true for a constructed set.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Maximum number of Byzantine replicas the group tolerates.
    pub fn max_faulty(&self) -> usize {
        (self.members.len() - 1) / 3
    }

    /// Quorum size: `2f + 1`.
    pub fn quorum(&self) -> usize {
        2 * self.max_faulty() + 1
    }

    /// Whether `id` is a member of the group.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.members.binary_search(id).is_ok()
    }

    /// The designated primary.
    pub fn primary(&self) -> &NodeId {
        &self.primary
    }

    /// Whether `id` is the primary.
    pub fn is_primary(&self, id: &NodeId) -> bool {
        *id == self.primary
    }

    /// All member ids, ordered.
    pub fn members(&self) -> &[NodeId] {
        &self.members
    }

    /// All members except `id`. The broadcast fan-out set.
    pub fn peers_of<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a NodeId> {
        self.members.iter().filter(move |m| *m != id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<NodeId> {
        names.iter().map(|n| NodeId::from(*n)).collect()
    }

    #[test]
    fn test_quorum_math_reference_config() {
        // N = 5 tolerates f = 1 with quorum 3.
        let set = ReplicaSet::new(
            ids(&["node1", "node2", "node3", "node4", "node5"]),
            NodeId::from("node1"),
        );
        assert_eq!(set.len(), 5);
        assert_eq!(set.max_faulty(), 1);
        assert_eq!(set.quorum(), 3);
    }

    #[test]
    fn test_quorum_math_other_sizes() {
        let four = ReplicaSet::new(ids(&["a", "b", "c", "d"]), NodeId::from("a"));
        assert_eq!(four.max_faulty(), 1);
        assert_eq!(four.quorum(), 3);

        let seven = ReplicaSet::new(
            ids(&["a", "b", "c", "d", "e", "f", "g"]),
            NodeId::from("a"),
        );
        assert_eq!(seven.max_faulty(), 2);
        assert_eq!(seven.quorum(), 5);
    }

    #[test]
    fn test_membership_and_primary() {
        let set = ReplicaSet::new(ids(&["node2", "node1", "node3"]), NodeId::from("node2"));
        assert!(set.contains(&NodeId::from("node1")));
        assert!(!set.contains(&NodeId::from("node9")));
        assert!(set.is_primary(&NodeId::from("node2")));
        assert!(!set.is_primary(&NodeId::from("node1")));
        // Sorted regardless of construction order.
        assert_eq!(set.members()[0], NodeId::from("node1"));
    }

    #[test]
    fn test_peers_of_excludes_self() {
        let set = ReplicaSet::new(ids(&["a", "b", "c", "d"]), NodeId::from("a"));
        let peers: Vec<_> = set.peers_of(&NodeId::from("b")).cloned().collect();
        assert_eq!(peers, ids(&["a", "c", "d"]));
    }

    #[test]
    #[should_panic(expected = "not a member")]
    fn test_primary_must_be_member() {
        ReplicaSet::new(ids(&["a", "b"]), NodeId::from("z"));
    }
}
