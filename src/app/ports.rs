//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ TapService (domain)
//! ```
//!
//! The messaging transport, the display, the clock, and configuration
//! storage are all driven adapters.  The core only ever sees these traits,
//! so the broker connection (address, credentials, TLS) stays entirely on
//! the adapter side.

use core::fmt;
use core::time::Duration;

use crate::config::TapConfig;

/// Maximum topic length carried by an [`InboundMessage`].
pub const TOPIC_CAPACITY: usize = 96;

/// Maximum payload length carried by an [`InboundMessage`].
pub const PAYLOAD_CAPACITY: usize = 256;

pub type Topic = heapless::String<TOPIC_CAPACITY>;

// ───────────────────────────────────────────────────────────────
// Message bus port (driven adapter: domain ↔ publish/subscribe)
// ───────────────────────────────────────────────────────────────

/// A message delivered on a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: Topic,
    pub payload: heapless::Vec<u8, PAYLOAD_CAPACITY>,
}

impl InboundMessage {
    pub fn new(topic: &str, payload: &[u8]) -> Result<Self, TransportError> {
        let mut t = Topic::new();
        t.push_str(topic).map_err(|_| TransportError::TopicTooLong)?;
        let payload =
            heapless::Vec::from_slice(payload).map_err(|_| TransportError::PayloadTooLarge)?;
        Ok(Self { topic: t, payload })
    }
}

/// Publish/subscribe capability the tap needs from its transport.
///
/// Delivery is at-most-once and in order.  Implementations own
/// reconnection and retry policy; the core never retries.
pub trait MessageBus {
    /// Register interest in an exact topic.
    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError>;

    /// Publish a UTF-8 payload.
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), TransportError>;

    /// Wait up to `timeout` for the next inbound message.
    /// `Ok(None)` means nothing arrived in time.
    fn poll(&mut self, timeout: Duration) -> Result<Option<InboundMessage>, TransportError>;
}

impl<T: MessageBus + ?Sized> MessageBus for &mut T {
    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        (**self).subscribe(topic)
    }

    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), TransportError> {
        (**self).publish(topic, payload)
    }

    fn poll(&mut self, timeout: Duration) -> Result<Option<InboundMessage>, TransportError> {
        (**self).poll(timeout)
    }
}

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → display device)
// ───────────────────────────────────────────────────────────────

/// Whatever renders text for the person at the tap.
pub trait DisplayPort {
    fn show(&mut self, text: &str);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → publications / logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`TapEvent`](super::events::TapEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::TapEvent);
}

impl<T: EventSink + ?Sized> EventSink for &mut T {
    fn emit(&mut self, event: &super::events::TapEvent) {
        (**self).emit(event);
    }
}

/// Fan an event out to two sinks, left first.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: &super::events::TapEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock used to pace the pour.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Configuration port
// ───────────────────────────────────────────────────────────────

/// Loads the tap configuration.
///
/// Implementations MUST return only validated configuration
/// (see [`TapConfig::validate`]).
pub trait ConfigPort {
    fn load(&self) -> Result<TapConfig, ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations and config validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No stored configuration exists.
    NotFound,
    /// Stored configuration could not be parsed.
    Corrupted,
    /// A field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors surfaced by a [`MessageBus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// No connection to the broker.
    NotConnected,
    /// The transport refused or failed a publish.
    PublishFailed,
    /// The transport refused a subscription.
    SubscribeFailed,
    /// Topic longer than [`TOPIC_CAPACITY`].
    TopicTooLong,
    /// Payload longer than [`PAYLOAD_CAPACITY`].
    PayloadTooLarge,
    /// The transport has shut down for good; no more messages will arrive.
    Closed,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "not connected"),
            Self::PublishFailed => write!(f, "publish failed"),
            Self::SubscribeFailed => write!(f, "subscribe failed"),
            Self::TopicTooLong => write!(f, "topic too long"),
            Self::PayloadTooLarge => write!(f, "payload too large"),
            Self::Closed => write!(f, "transport closed"),
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for TransportError {}
