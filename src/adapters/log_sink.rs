//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing tap events to the process log
//! (stderr, see the binary's subscriber setup).  The
//! [`TopicPublisher`](super::publisher::TopicPublisher) implements the
//! same trait for the wire.

use log::{debug, info, warn};

use crate::app::events::TapEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`TapEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &TapEvent) {
        match event {
            TapEvent::Started(state) => {
                info!("START | state={}", state);
            }
            TapEvent::StateChanged { from, to } => {
                info!("STATE | {} -> {}", from, to);
            }
            TapEvent::AmountReported(r) => {
                info!(
                    "Poured: {:.2} g | step={} +{:.2}{}",
                    r.total,
                    r.index + 1,
                    r.increment,
                    if r.finished { " (last)" } else { "" },
                );
            }
            TapEvent::AmountCleared => {
                info!("AMOUNT | cleared");
            }
            TapEvent::DisplayRequested(text) => {
                debug!("DISPLAY | {:?}", text);
            }
            TapEvent::CurrentUserChanged(user) => {
                info!("USER | current={:?}", user);
            }
            TapEvent::CommandIgnored { trigger, state } => {
                debug!("CMD | {} ignored in {}", trigger, state);
            }
            TapEvent::UnknownCommand(raw) => {
                warn!("Unknown command: {}", raw);
            }
        }
    }
}
