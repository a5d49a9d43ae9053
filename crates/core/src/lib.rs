//! Event/action contract for the pBFT consensus architecture.
//!
//! This crate defines the sans-io boundary of the node:
//!
//! - [`Event`]: all possible inputs to the state machine
//! - [`Action`]: all possible outputs from the state machine
//! - [`EventPriority`]: ordering priority for events at the same timestamp
//! - [`StateMachine`]: the trait the consensus engine implements
//!
//! # Architecture
//!
//! ```text
//! Events → StateMachine::handle() → Actions
//! ```
//!
//! The state machine is:
//! - **Synchronous**: no async, no `.await`
//! - **Deterministic**: same state + event = same actions
//! - **Pure-ish**: mutates self, but performs no I/O
//!
//! All I/O is handled by a runner (simulation or production) which delivers
//! events, executes the returned actions, and feeds delivered messages back
//! in as events. Because one runner task owns the state machine and events
//! arrive over a channel, every mutation happens under a single-writer
//! discipline; broadcasts are performed outside that region while the
//! decision to broadcast is taken inside `handle()`.

mod action;
mod event;
mod malicious;
mod traits;

pub use action::Action;
pub use event::{Event, EventPriority};
pub use malicious::{MaliciousMode, ParseMaliciousModeError};
pub use traits::StateMachine;
