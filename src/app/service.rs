//! Tap service, the hexagonal core.
//!
//! [`TapService`] is the single owner of the tap's mutable state: the
//! state machine and the pour simulator.  It exposes the command
//! interpreter ([`handle_command`](TapService::handle_command)) and the
//! cooperative pour step ([`advance`](TapService::advance)).  Neither
//! blocks and neither performs I/O; every observable effect leaves as a
//! [`TapEvent`] through the injected [`EventSink`].
//!
//! ```text
//!  TapCommand ──▶ ┌───────────────────────────┐ ──▶ EventSink
//!                 │        TapService         │
//!  advance(now) ─▶│  FSM · PourSimulator      │
//!                 └───────────────────────────┘
//! ```

use log::info;

use crate::config::TapConfig;
use crate::fsm::context::TapContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, TapState, Transition, Trigger};
use crate::pour::{PourProfile, PourSimulator};

use super::commands::TapCommand;
use super::events::TapEvent;
use super::ports::EventSink;

/// The tap service orchestrates all domain logic.
pub struct TapService {
    fsm: Fsm,
    ctx: TapContext,
    current_user: Option<String>,
    commands_handled: u64,
    increments_emitted: u64,
}

impl TapService {
    /// Construct the service around a pour profile and pacing interval.
    ///
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(profile: PourProfile, interval_ms: u64) -> Self {
        Self {
            fsm: Fsm::new(build_state_table(), TapState::Idle),
            ctx: TapContext::new(PourSimulator::new(profile, interval_ms)),
            current_user: None,
            commands_handled: 0,
            increments_emitted: 0,
        }
    }

    pub fn from_config(config: &TapConfig) -> Self {
        Self::new(config.pour_profile.clone(), u64::from(config.pour_interval_ms))
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start the FSM in its initial state (Idle).
    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx);
        sink.emit(&TapEvent::Started(self.fsm.current_state()));
        info!("TapService started in {}", self.fsm.current_state());
    }

    // ── Command handling ──────────────────────────────────────

    /// Interpret one inbound command received at `now_ms`.
    ///
    /// `start` outside `Idle` is dropped silently (reported only as
    /// [`TapEvent::CommandIgnored`]); `done` and `reset` always succeed.
    pub fn handle_command(&mut self, cmd: TapCommand, now_ms: u64, sink: &mut impl EventSink) {
        self.commands_handled += 1;

        if let Some(trigger) = cmd.trigger() {
            self.ctx.now_ms = now_ms;
            match self.fsm.fire(trigger, &mut self.ctx) {
                Some(transition) => self.announce(transition, sink),
                None => sink.emit(&TapEvent::CommandIgnored {
                    trigger,
                    state: self.fsm.current_state(),
                }),
            }
            return;
        }

        match cmd {
            TapCommand::Display(text) => sink.emit(&TapEvent::DisplayRequested(text)),
            TapCommand::Unknown(raw) => sink.emit(&TapEvent::UnknownCommand(raw)),
            TapCommand::Start | TapCommand::Done | TapCommand::Reset => {}
        }
    }

    /// Record the user currently at the head of the tap's queue.
    /// An empty id clears it.  Never changes state.
    pub fn set_current_user(&mut self, user: &str, sink: &mut impl EventSink) {
        self.current_user = (!user.is_empty()).then(|| user.to_owned());
        sink.emit(&TapEvent::CurrentUserChanged(user.to_owned()));
    }

    // ── Cooperative pour step ─────────────────────────────────

    /// Emit at most one increment if a pour is active and its interval
    /// has elapsed.  Returns `true` if an increment was emitted.
    ///
    /// After the final increment the tap moves to `Stopped` in the same
    /// call.  Any other call is a cheap no-op.
    pub fn advance(&mut self, now_ms: u64, sink: &mut impl EventSink) -> bool {
        let Some(reading) = self.ctx.sim.advance(now_ms) else {
            return false;
        };
        self.increments_emitted += 1;
        sink.emit(&TapEvent::AmountReported(reading));

        if reading.finished {
            self.ctx.now_ms = now_ms;
            if let Some(transition) = self.fsm.fire(Trigger::SequenceExhausted, &mut self.ctx) {
                self.announce(transition, sink);
            }
        }
        true
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> TapState {
        self.fsm.current_state()
    }

    /// Running total of the current or most recent pour (0 after
    /// `done`/`reset`).
    pub fn total(&self) -> f64 {
        self.ctx.sim.total()
    }

    /// True while the simulator is producing increments.
    pub fn is_pouring(&self) -> bool {
        self.ctx.sim.is_active()
    }

    pub fn current_user(&self) -> Option<&str> {
        self.current_user.as_deref()
    }

    pub fn commands_handled(&self) -> u64 {
        self.commands_handled
    }

    pub fn increments_emitted(&self) -> u64 {
        self.increments_emitted
    }

    pub fn simulator(&self) -> &PourSimulator {
        &self.ctx.sim
    }

    // ── Internal ──────────────────────────────────────────────

    fn announce(&self, transition: Transition, sink: &mut impl EventSink) {
        sink.emit(&TapEvent::StateChanged {
            from: transition.from,
            to: transition.to,
        });
        if matches!(transition.to, TapState::Idle | TapState::Done) {
            sink.emit(&TapEvent::AmountCleared);
        }
    }
}
