//! Shared mutable context threaded through every FSM action.
//!
//! The tap's only mutable resource besides its state is the pour
//! simulator, so the context is small: the simulator plus the time at
//! which the current trigger is being processed.

use crate::pour::PourSimulator;

pub struct TapContext {
    /// The pour simulator the state actions arm, abort, and clear.
    pub sim: PourSimulator,
    /// Time (ms) of the trigger currently being processed.
    pub now_ms: u64,
}

impl TapContext {
    pub fn new(sim: PourSimulator) -> Self {
        Self { sim, now_ms: 0 }
    }
}
