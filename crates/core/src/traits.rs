//! Core trait for state machines.

use crate::{Action, Event};
use std::time::Duration;

/// A state machine that processes events.
///
/// This is the core abstraction of the consensus architecture. All protocol
/// logic lives behind this trait:
///
/// - **Synchronous**: `handle` never blocks or awaits
/// - **Deterministic**: same state + event = same actions
/// - **No I/O**: all I/O is performed by the runner via the returned actions
pub trait StateMachine {
    /// Process an event, returning actions for the runner to execute.
    fn handle(&mut self, event: Event) -> Vec<Action>;

    /// Set the current time.
    ///
    /// Called by the runner before each `handle()` call to provide the
    /// current simulation or wall-clock time. The engine uses it only to
    /// stamp proposed blocks; nothing in the protocol waits on time.
    fn set_time(&mut self, now: Duration);

    /// The time last set via `set_time()`.
    fn now(&self) -> Duration;
}
