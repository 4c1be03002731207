//! Inbound commands to the tap service.
//!
//! Commands arrive as UTF-8 payloads on the tap's command topic.  Matching
//! is exact and case-sensitive; anything that is not a known command or a
//! `display:` instruction is carried through as [`TapCommand::Unknown`] so
//! it can be reported without ever failing.

use crate::fsm::Trigger;

/// Payload prefix for display pass-through instructions.
pub const DISPLAY_PREFIX: &str = "display:";

/// Commands that external adapters can send into the tap service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapCommand {
    /// Begin a pour (only honoured while idle).
    Start,

    /// Close the pour by operator request, whatever the current state.
    Done,

    /// Return to idle, whatever the current state.
    Reset,

    /// Text for the display collaborator (everything after `display:`).
    Display(String),

    /// Unrecognised payload, kept verbatim for diagnostics.
    Unknown(String),
}

impl TapCommand {
    /// Interpret a decoded command payload.
    pub fn parse(payload: &str) -> Self {
        match payload {
            "start" => Self::Start,
            "done" => Self::Done,
            "reset" => Self::Reset,
            other => match other.strip_prefix(DISPLAY_PREFIX) {
                Some(text) => Self::Display(text.to_owned()),
                None => Self::Unknown(other.to_owned()),
            },
        }
    }

    /// Interpret a raw payload.  Invalid UTF-8 is decoded lossily.
    pub fn from_payload(payload: &[u8]) -> Self {
        Self::parse(&String::from_utf8_lossy(payload))
    }

    /// The state-machine trigger this command fires, if any.
    pub fn trigger(&self) -> Option<Trigger> {
        match self {
            Self::Start => Some(Trigger::Start),
            Self::Done => Some(Trigger::Done),
            Self::Reset => Some(Trigger::Reset),
            Self::Display(_) | Self::Unknown(_) => None,
        }
    }
}
