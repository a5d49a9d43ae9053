//! Core types for the pBFT replica group.
//!
//! This crate provides the foundational types used throughout the consensus
//! implementation:
//!
//! - **Primitives**: the [`Hash`] digest
//! - **Identifiers**: [`NodeId`], [`ViewNumber`], [`SequenceNumber`], [`BlockHeight`]
//! - **Consensus types**: [`Block`], [`ReplicaSet`]
//! - **Wire messages**: [`PrePrepareMsg`], [`PrepareMsg`], [`CommitMsg`]
//!
//! # Design Philosophy
//!
//! This crate is self-contained with minimal dependencies. It does not depend
//! on any other workspace crates, making it the foundation layer.

mod block;
mod hash;
mod identifiers;
mod message;
mod replica_set;

pub use block::{Block, GENESIS_DATA};
pub use hash::{Hash, HexError};
pub use identifiers::{BlockHeight, NodeId, SequenceNumber, ViewNumber};
pub use message::{CommitMsg, ConsensusMessage, PrePrepareMsg, PrepareMsg};
pub use replica_set::ReplicaSet;
