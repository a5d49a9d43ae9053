//! Identifier newtypes.

use sbor::prelude::*;
use std::fmt;

/// Identity of a replica in the group.
///
/// The sender id on every consensus message. There are no cryptographic
/// signatures in this protocol variant; the id is trusted as identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, BasicSbor)]
#[sbor(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// View number: the epoch in which a specific node is primary.
///
/// Carried on every message and block. View change is unimplemented, so
/// honest nodes stay in view 0 for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, BasicSbor)]
#[sbor(transparent)]
pub struct ViewNumber(pub u64);

impl fmt::Display for ViewNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic slot index assigned by the primary to each proposed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, BasicSbor)]
#[sbor(transparent)]
pub struct SequenceNumber(pub u64);

impl SequenceNumber {
    /// The slot after this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// The slot before this one, or `None` at slot zero.
    pub fn prev(self) -> Option<Self> {
        self.0.checked_sub(1).map(Self)
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of a block in the chain. Genesis is height 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, BasicSbor)]
#[sbor(transparent)]
pub struct BlockHeight(pub u64);

impl BlockHeight {
    /// The height directly above this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_arithmetic() {
        assert_eq!(SequenceNumber(0).next(), SequenceNumber(1));
        assert_eq!(SequenceNumber(1).prev(), Some(SequenceNumber(0)));
        assert_eq!(SequenceNumber(0).prev(), None);
    }

    #[test]
    fn test_node_id_display() {
        let id = NodeId::from("node1");
        assert_eq!(id.to_string(), "node1");
        assert_eq!(id.as_str(), "node1");
    }
}
