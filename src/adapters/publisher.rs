//! Topic publisher adapter.
//!
//! Implements [`EventSink`] by turning tap events into publications on
//! the status and amount topics, and by handing display text to the
//! [`DisplayPort`].  Publish failures are logged and counted, never
//! retried.

use log::warn;

use crate::app::events::TapEvent;
use crate::app::ports::{DisplayPort, EventSink, MessageBus};
use crate::topics::TapTopics;

/// Amount payload published when a pour is cleared.
pub const CLEARED_AMOUNT: &str = "0";

/// Adapter that maps [`TapEvent`]s onto the tap's outbound topics.
pub struct TopicPublisher<'a, B: ?Sized, D: ?Sized> {
    topics: &'a TapTopics,
    bus: &'a mut B,
    display: &'a mut D,
    failures: u32,
}

impl<'a, B, D> TopicPublisher<'a, B, D>
where
    B: MessageBus + ?Sized,
    D: DisplayPort + ?Sized,
{
    pub fn new(topics: &'a TapTopics, bus: &'a mut B, display: &'a mut D) -> Self {
        Self {
            topics,
            bus,
            display,
            failures: 0,
        }
    }

    /// Publications that failed since this publisher was created.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    fn publish(&mut self, topic: &str, payload: &str) {
        if let Err(e) = self.bus.publish(topic, payload) {
            self.failures += 1;
            warn!("PUBLISH | {} <- {:?} failed: {}", topic, payload, e);
        }
    }
}

/// Full-precision decimal rendering of a running total.
pub fn amount_payload(total: f64) -> String {
    format!("{total}")
}

impl<B, D> EventSink for TopicPublisher<'_, B, D>
where
    B: MessageBus + ?Sized,
    D: DisplayPort + ?Sized,
{
    fn emit(&mut self, event: &TapEvent) {
        let topics = self.topics;
        match event {
            TapEvent::StateChanged { to, .. } => self.publish(topics.status(), to.as_str()),
            TapEvent::AmountReported(reading) => {
                self.publish(topics.amount(), &amount_payload(reading.total));
            }
            TapEvent::AmountCleared => self.publish(topics.amount(), CLEARED_AMOUNT),
            TapEvent::DisplayRequested(text) => self.display.show(text),
            TapEvent::CurrentUserChanged(user) => self.display.show(&format!("user:{user}")),
            TapEvent::Started(_)
            | TapEvent::CommandIgnored { .. }
            | TapEvent::UnknownCommand(_) => {}
        }
    }
}
