//! Production runner with async I/O.
//!
//! Wraps the deterministic consensus state machine with real I/O:
//!
//! - Peer messages over length-prefixed TCP frames
//! - Client traffic over an axum JSON RPC facade
//! - A single tokio task owning the state machine
//!
//! # Architecture
//!
//! Uses the event aggregator pattern: one task owns the state machine and
//! receives events via an mpsc channel, giving every mutation a
//! single-writer discipline without a mutex. The RPC handlers and the peer
//! listener only ever enqueue events; broadcasts returned by the state
//! machine are executed outside its critical path by the transport's
//! per-peer writer tasks.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        pBFT node                             │
//! │                                                              │
//! │  peer listener ──┐                          ┌─► peer writers │
//! │                  ├─► event channel ─► node loop              │
//! │  RPC handlers ───┘                          └─► RPC snapshots│
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod codec;
mod node_loop;
pub mod rpc;
pub mod telemetry;
mod transport;

pub use codec::{decode_message, encode_message, CodecError, MAX_FRAME_BYTES, WIRE_VERSION};
pub use node_loop::spawn_node_loop;
pub use transport::{spawn_peer_listener, PeerTransport, TransportConfig};
