//! Concrete state handler functions and table builder.
//!
//! ```text
//!  IDLE ──[start]──▶ POURING ──[sequence exhausted]──▶ STOPPED
//!   ▲                   │                                 │
//!   │                 [done]                            [done]
//!   │                   ▼                                 │
//!   │                  DONE ◀─────────────────────────────┘
//!   │
//!   └──[reset]── any state
//! ```
//!
//! `done` is also accepted in `Idle` and `Done`; `reset` in `Idle`.

use super::context::TapContext;
use super::{StateDescriptor, TapState, Trigger};
use log::info;

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; TapState::COUNT] {
    [
        // Index 0: Idle
        StateDescriptor {
            id: TapState::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_trigger: idle_trigger,
        },
        // Index 1: Pouring
        StateDescriptor {
            id: TapState::Pouring,
            name: "Pouring",
            on_enter: Some(pouring_enter),
            on_exit: Some(pouring_exit),
            on_trigger: pouring_trigger,
        },
        // Index 2: Stopped
        StateDescriptor {
            id: TapState::Stopped,
            name: "Stopped",
            on_enter: Some(stopped_enter),
            on_exit: None,
            on_trigger: settled_trigger,
        },
        // Index 3: Done
        StateDescriptor {
            id: TapState::Done,
            name: "Done",
            on_enter: Some(done_enter),
            on_exit: None,
            on_trigger: settled_trigger,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut TapContext) {
    ctx.sim.clear();
    info!("IDLE: tap ready");
}

fn idle_trigger(trigger: Trigger) -> Option<TapState> {
    match trigger {
        Trigger::Start => Some(TapState::Pouring),
        Trigger::Done => Some(TapState::Done),
        Trigger::Reset => Some(TapState::Idle),
        Trigger::SequenceExhausted => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  POURING: the simulator is armed for exactly as long as we stay here
// ═══════════════════════════════════════════════════════════════════════════

fn pouring_enter(ctx: &mut TapContext) {
    ctx.sim.arm(ctx.now_ms);
    info!(
        "POURING: {} increments every {} ms",
        ctx.sim.profile().len(),
        ctx.sim.interval_ms()
    );
}

fn pouring_exit(ctx: &mut TapContext) {
    ctx.sim.abort();
}

fn pouring_trigger(trigger: Trigger) -> Option<TapState> {
    match trigger {
        // A second start never re-arms a pour in flight.
        Trigger::Start => None,
        Trigger::SequenceExhausted => Some(TapState::Stopped),
        Trigger::Done => Some(TapState::Done),
        Trigger::Reset => Some(TapState::Idle),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  STOPPED / DONE: terminal until an explicit command
// ═══════════════════════════════════════════════════════════════════════════

fn stopped_enter(ctx: &mut TapContext) {
    info!("STOPPED: pour complete at {:.2} g", ctx.sim.total());
}

fn done_enter(ctx: &mut TapContext) {
    ctx.sim.clear();
    info!("DONE: pour closed by command");
}

fn settled_trigger(trigger: Trigger) -> Option<TapState> {
    match trigger {
        Trigger::Done => Some(TapState::Done),
        Trigger::Reset => Some(TapState::Idle),
        Trigger::Start | Trigger::SequenceExhausted => None,
    }
}
