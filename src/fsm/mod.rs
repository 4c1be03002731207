//! Function-pointer finite state machine engine for the tap.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  StateTable                                                │
//! │  ┌─────────┬───────────┬──────────┬─────────────────────┐  │
//! │  │ TapState│ on_enter  │ on_exit  │ on_trigger          │  │
//! │  ├─────────┼───────────┼──────────┼─────────────────────┤  │
//! │  │ Idle    │ fn(ctx)   │    -     │ fn(t)->Option<next> │  │
//! │  │ Pouring │ fn(ctx)   │ fn(ctx)  │ fn(t)->Option<next> │  │
//! │  │ Stopped │ fn(ctx)   │    -     │ fn(t)->Option<next> │  │
//! │  │ Done    │ fn(ctx)   │    -     │ fn(t)->Option<next> │  │
//! │  └─────────┴───────────┴──────────┴─────────────────────┘  │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Unlike a ticked controller, the tap only moves on discrete
//! [`Trigger`]s: the three external commands and natural exhaustion of
//! the pour profile.  `on_trigger` for the current state decides the
//! next state; `None` means the trigger is not accepted here and the
//! machine is left untouched.  Accepted triggers always run
//! `on_exit` → `on_enter`, including self-transitions (`reset` while
//! `Idle`, `done` while `Done`).

pub mod context;
pub mod states;

use core::fmt;

use context::TapContext;
use log::info;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// The single tap's current mode.
/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TapState {
    Idle = 0,
    Pouring = 1,
    Stopped = 2,
    Done = 3,
}

impl TapState {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 4;

    pub const ALL: [TapState; Self::COUNT] = [Self::Idle, Self::Pouring, Self::Stopped, Self::Done];

    /// Convert an index back to `TapState`.  Panics on out-of-range in
    /// debug builds; returns `Idle` in release.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Idle,
            1 => Self::Pouring,
            2 => Self::Stopped,
            3 => Self::Done,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Idle
            }
        }
    }

    /// Wire name published on the status topic.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pouring => "pouring",
            Self::Stopped => "stopped",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for TapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Triggers
// ---------------------------------------------------------------------------

/// Everything that can move the tap between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// `start` command.
    Start,
    /// The pour simulator emitted its final increment.
    SequenceExhausted,
    /// `done` command.
    Done,
    /// `reset` command.
    Reset,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Start => "start",
            Self::SequenceExhausted => "sequence-exhausted",
            Self::Done => "done",
            Self::Reset => "reset",
        })
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut TapContext);

/// Decides where a trigger leads from a given state.
pub type StateTriggerFn = fn(Trigger) -> Option<TapState>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

pub struct StateDescriptor {
    pub id: TapState,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_trigger: StateTriggerFn,
}

/// A transition that was actually taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: TapState,
    pub to: TapState,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

pub struct Fsm {
    /// Fixed-size table indexed by `TapState as usize`.
    table: [StateDescriptor; TapState::COUNT],
    current: usize,
    transition_count: u64,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; TapState::COUNT], initial: TapState) -> Self {
        Self {
            table,
            current: initial as usize,
            transition_count: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `fire()`.
    pub fn start(&mut self, ctx: &mut TapContext) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Offer `trigger` to the current state.  Returns the transition
    /// taken, or `None` if the current state does not accept it.
    pub fn fire(&mut self, trigger: Trigger, ctx: &mut TapContext) -> Option<Transition> {
        let next = (self.table[self.current].on_trigger)(trigger)?;
        let from = self.current_state();
        self.transition(next, ctx);
        Some(Transition { from, to: next })
    }

    pub fn current_state(&self) -> TapState {
        TapState::from_index(self.current)
    }

    /// Number of transitions taken since construction.
    pub fn transition_count(&self) -> u64 {
        self.transition_count
    }

    fn transition(&mut self, next_id: TapState, ctx: &mut TapContext) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        self.transition_count += 1;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
