//! Block type and digest rules.

use crate::{BlockHeight, Hash, SequenceNumber, ViewNumber};
use sbor::prelude::*;

/// Payload of the genesis block. Identical on every node.
pub const GENESIS_DATA: &str = "genesis";

/// The unit of replication.
///
/// `block_hash` is a pure function of `data`, `previous_hash` and `height`;
/// [`Block::digest_matches`] recomputes it. The view and sequence record the
/// consensus slot the block was proposed under and do not feed the digest.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct Block {
    /// Position in the chain; strictly increases by 1.
    pub height: BlockHeight,

    /// Digest of the parent block. `Hash::ZERO` for genesis.
    pub previous_hash: Hash,

    /// Digest of this block.
    pub block_hash: Hash,

    /// Producer's wall clock in milliseconds. Informational only.
    pub timestamp: u64,

    /// Opaque payload.
    pub data: String,

    /// View under which this block was proposed.
    pub view: ViewNumber,

    /// Slot assigned by the primary.
    pub sequence: SequenceNumber,
}

impl Block {
    /// Compute the canonical block digest.
    ///
    /// The preimage is the exact concatenation
    /// `data ‖ previous_hash ‖ decimal(height)` with no separators. Every
    /// node must compute this identically; agreement depends on it.
    pub fn compute_digest(data: &str, previous_hash: &Hash, height: BlockHeight) -> Hash {
        Hash::from_parts(&[
            data.as_bytes(),
            previous_hash.as_bytes(),
            height.0.to_string().as_bytes(),
        ])
    }

    /// Build a block, filling in its digest.
    pub fn new(
        data: String,
        previous_hash: Hash,
        height: BlockHeight,
        view: ViewNumber,
        sequence: SequenceNumber,
        timestamp: u64,
    ) -> Self {
        let block_hash = Self::compute_digest(&data, &previous_hash, height);
        Self {
            height,
            previous_hash,
            block_hash,
            timestamp,
            data,
            view,
            sequence,
        }
    }

    /// The genesis block. Every node constructs an identical one at startup.
    pub fn genesis() -> Self {
        Self::new(
            GENESIS_DATA.to_string(),
            Hash::ZERO,
            BlockHeight(0),
            ViewNumber(0),
            SequenceNumber(0),
            0,
        )
    }

    /// Check that `block_hash` matches a recomputation from the block's own
    /// fields. Catches corrupted or forged digests; chain placement is
    /// checked separately against the tip.
    pub fn digest_matches(&self) -> bool {
        self.block_hash == Self::compute_digest(&self.data, &self.previous_hash, self.height)
    }

    /// Check that this block directly extends `parent`.
    pub fn extends(&self, parent: &Block) -> bool {
        self.previous_hash == parent.block_hash && self.height == parent.height.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_is_identical_everywhere() {
        let a = Block::genesis();
        let b = Block::genesis();
        assert_eq!(a, b);
        assert_eq!(a.height, BlockHeight(0));
        assert_eq!(a.previous_hash, Hash::ZERO);
        assert_eq!(a.data, GENESIS_DATA);
        assert!(a.digest_matches());
    }

    #[test]
    fn test_digest_is_pure_function_of_inputs() {
        let h1 = Block::compute_digest("hello", &Hash::ZERO, BlockHeight(1));
        let h2 = Block::compute_digest("hello", &Hash::ZERO, BlockHeight(1));
        assert_eq!(h1, h2);

        assert_ne!(h1, Block::compute_digest("hellx", &Hash::ZERO, BlockHeight(1)));
        assert_ne!(h1, Block::compute_digest("hello", &Hash::ZERO, BlockHeight(2)));
        assert_ne!(
            h1,
            Block::compute_digest("hello", &Hash::from_bytes(b"x"), BlockHeight(1))
        );
    }

    #[test]
    fn test_tampered_block_fails_digest_check() {
        let genesis = Block::genesis();
        let mut block = Block::new(
            "payload".to_string(),
            genesis.block_hash,
            BlockHeight(1),
            ViewNumber(0),
            SequenceNumber(1),
            42,
        );
        assert!(block.digest_matches());

        block.data = "tampered".to_string();
        assert!(!block.digest_matches());
    }

    #[test]
    fn test_extends() {
        let genesis = Block::genesis();
        let child = Block::new(
            "a".to_string(),
            genesis.block_hash,
            BlockHeight(1),
            ViewNumber(0),
            SequenceNumber(1),
            0,
        );
        assert!(child.extends(&genesis));
        assert!(!genesis.extends(&child));

        let skipped = Block::new(
            "b".to_string(),
            genesis.block_hash,
            BlockHeight(2),
            ViewNumber(0),
            SequenceNumber(2),
            0,
        );
        assert!(!skipped.extends(&genesis));
    }
}
