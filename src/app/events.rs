//! Outbound application events.
//!
//! The [`TapService`](super::service::TapService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: publish on the status/amount topics,
//! hand text to the display, or just log.

use crate::fsm::{TapState, Trigger};
use crate::pour::PourReading;

/// Structured events emitted by the tap core.
#[derive(Debug, Clone, PartialEq)]
pub enum TapEvent {
    /// The service has started (carries initial state).
    Started(TapState),

    /// The tap entered `to`.  Emitted for self-transitions as well, so
    /// repeated `reset`/`done` re-announce their state.
    StateChanged { from: TapState, to: TapState },

    /// One increment was poured; carries the running total.
    AmountReported(PourReading),

    /// The poured amount was zeroed by `done` or `reset`.
    AmountCleared,

    /// Text to pass through to the display, uninterpreted.
    DisplayRequested(String),

    /// The user at the head of the tap's queue changed (empty = nobody).
    CurrentUserChanged(String),

    /// A state command arrived that the current state does not accept.
    CommandIgnored { trigger: Trigger, state: TapState },

    /// A payload on the command topic matched no command.
    UnknownCommand(String),
}
