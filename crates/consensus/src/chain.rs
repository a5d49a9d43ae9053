//! In-memory append-only blockchain store.

use pbft_types::{Block, BlockHeight, Hash};
use thiserror::Error;

/// Errors from appending a block to the chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// The block's digest does not recompute from its own fields.
    #[error("block digest does not match its contents")]
    DigestMismatch,

    /// The block's parent digest is not the current tip.
    #[error("block parent {actual} does not match chain tip {expected}")]
    WrongParent {
        /// Digest of the current tip.
        expected: Hash,
        /// Parent digest the block claims.
        actual: Hash,
    },

    /// The block's height is not tip height + 1.
    #[error("block height {actual} is not contiguous with tip height {tip}")]
    NonContiguousHeight {
        /// Height of the current tip.
        tip: BlockHeight,
        /// Height the block claims.
        actual: BlockHeight,
    },
}

/// The per-node replicated log of committed blocks.
///
/// Starts at genesis and only ever grows; blocks once appended are
/// immutable. `blocks[k].height == k` holds for every index.
#[derive(Debug, Clone)]
pub struct Blockchain {
    blocks: Vec<Block>,
}

impl Blockchain {
    /// Create a chain containing only the genesis block.
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::genesis()],
        }
    }

    /// The most recently appended block.
    pub fn tip(&self) -> &Block {
        self.blocks
            .last()
            .unwrap_or_else(|| unreachable!("chain always contains genesis"))
    }

    /// Height of the tip. Zero for a fresh chain.
    pub fn height(&self) -> BlockHeight {
        self.tip().height
    }

    /// Number of blocks, genesis included.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the chain is empty. Never true; genesis is always present.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// All blocks in order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// The block at `height`, if the chain has grown that far.
    pub fn get(&self, height: BlockHeight) -> Option<&Block> {
        self.blocks.get(height.0 as usize)
    }

    /// Append a block, validating that it extends the tip.
    pub fn append(&mut self, block: Block) -> Result<(), ChainError> {
        if !block.digest_matches() {
            return Err(ChainError::DigestMismatch);
        }

        let tip = self.tip();
        if block.height != tip.height.next() {
            return Err(ChainError::NonContiguousHeight {
                tip: tip.height,
                actual: block.height,
            });
        }
        if block.previous_hash != tip.block_hash {
            return Err(ChainError::WrongParent {
                expected: tip.block_hash,
                actual: block.previous_hash,
            });
        }

        self.blocks.push(block);
        Ok(())
    }
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbft_types::{SequenceNumber, ViewNumber};

    fn child_of(parent: &Block, data: &str, seq: u64) -> Block {
        Block::new(
            data.to_string(),
            parent.block_hash,
            parent.height.next(),
            ViewNumber(0),
            SequenceNumber(seq),
            0,
        )
    }

    #[test]
    fn test_fresh_chain_is_genesis_only() {
        let chain = Blockchain::new();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.height(), BlockHeight(0));
        assert_eq!(chain.tip(), &Block::genesis());
    }

    #[test]
    fn test_append_extends_chain() {
        let mut chain = Blockchain::new();
        let block = child_of(chain.tip(), "hello", 1);
        chain.append(block.clone()).unwrap();

        assert_eq!(chain.height(), BlockHeight(1));
        assert_eq!(chain.tip(), &block);
        assert_eq!(chain.get(BlockHeight(1)), Some(&block));
        assert_eq!(chain.get(BlockHeight(2)), None);
    }

    #[test]
    fn test_heights_match_indices() {
        let mut chain = Blockchain::new();
        for i in 1..=3u64 {
            let block = child_of(chain.tip(), &format!("b{i}"), i);
            chain.append(block).unwrap();
        }
        for (k, block) in chain.blocks().iter().enumerate() {
            assert_eq!(block.height, BlockHeight(k as u64));
        }
    }

    #[test]
    fn test_reject_wrong_parent() {
        let mut chain = Blockchain::new();
        let stranger = Block::new(
            "x".to_string(),
            Hash::from_bytes(b"not the tip"),
            BlockHeight(1),
            ViewNumber(0),
            SequenceNumber(1),
            0,
        );
        assert!(matches!(
            chain.append(stranger),
            Err(ChainError::WrongParent { .. })
        ));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_reject_non_contiguous_height() {
        let mut chain = Blockchain::new();
        let skipping = Block::new(
            "x".to_string(),
            chain.tip().block_hash,
            BlockHeight(5),
            ViewNumber(0),
            SequenceNumber(1),
            0,
        );
        assert!(matches!(
            chain.append(skipping),
            Err(ChainError::NonContiguousHeight { .. })
        ));
    }

    #[test]
    fn test_reject_bad_digest() {
        let mut chain = Blockchain::new();
        let mut block = child_of(chain.tip(), "x", 1);
        block.data = "tampered".to_string();
        assert_eq!(chain.append(block), Err(ChainError::DigestMismatch));
    }
}
