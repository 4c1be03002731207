//! Cooperative event loop.
//!
//! Each cycle drains pending inbound messages (bounded), routes them to
//! the [`TapService`], then advances the pour once.  Between cycles the
//! loop sleeps briefly so a single thread serves both the transport and
//! the pour pacing.
//!
//! ```text
//!  ┌─ cycle ───────────────────────────────────────────────┐
//!  │ poll(timeout) ─▶ route ─▶ handle_command / user       │
//!  │ poll(0) ... up to max_drain                           │
//!  │ advance(now)  ─▶ at most one increment                │
//!  └──────────────────────────────────────── sleep(idle) ──┘
//! ```

use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;

use log::{debug, info, warn};

use crate::adapters::log_sink::LogEventSink;
use crate::adapters::publisher::TopicPublisher;
use crate::app::commands::TapCommand;
use crate::app::ports::{Clock, DisplayPort, InboundMessage, MessageBus, TransportError};
use crate::app::service::TapService;
use crate::config::TapConfig;
use crate::error::Error;
use crate::topics::{InboundRoute, TapTopics};

/// What happened during one [`TapRuntime::run_once`] cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Inbound messages taken off the bus.
    pub messages: u16,
    /// Whether the pour emitted an increment.
    pub advanced: bool,
    /// Publications the bus rejected.
    pub publish_failures: u32,
}

pub struct TapRuntime {
    service: TapService,
    topics: TapTopics,
    poll_timeout: Duration,
    idle_sleep: Duration,
    max_drain: u16,
}

impl TapRuntime {
    pub fn new(config: &TapConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            service: TapService::from_config(config),
            topics: TapTopics::from_config(config)?,
            poll_timeout: Duration::from_millis(u64::from(config.poll_timeout_ms)),
            idle_sleep: Duration::from_millis(u64::from(config.idle_sleep_ms)),
            max_drain: config.max_drain_per_cycle,
        })
    }

    /// Subscribe to the tap's inbound topics.
    pub fn subscribe<B: MessageBus + ?Sized>(&self, bus: &mut B) -> Result<(), TransportError> {
        bus.subscribe(self.topics.cmd())?;
        bus.subscribe(self.topics.current_user())?;
        info!(
            "Subscribed to {} and {}",
            self.topics.cmd(),
            self.topics.current_user()
        );
        Ok(())
    }

    /// Start the service.  Publishes nothing: the tap is silently idle.
    pub fn start<B, D>(&mut self, bus: &mut B, display: &mut D)
    where
        B: MessageBus + ?Sized,
        D: DisplayPort + ?Sized,
    {
        let mut sink = (
            TopicPublisher::new(&self.topics, &mut *bus, &mut *display),
            LogEventSink::new(),
        );
        self.service.start(&mut sink);
    }

    /// Run one cycle.  A poll error ends the drain early; the pour is
    /// still advanced before the error is returned.
    pub fn run_once<B, C, D>(
        &mut self,
        bus: &mut B,
        clock: &C,
        display: &mut D,
    ) -> Result<CycleReport, TransportError>
    where
        B: MessageBus + ?Sized,
        C: Clock + ?Sized,
        D: DisplayPort + ?Sized,
    {
        let mut report = CycleReport::default();
        let mut poll_error = None;
        let mut timeout = self.poll_timeout;

        while report.messages < self.max_drain {
            let msg = match bus.poll(timeout) {
                Ok(Some(msg)) => msg,
                Ok(None) => break,
                Err(e) => {
                    poll_error = Some(e);
                    break;
                }
            };
            timeout = Duration::ZERO;
            report.messages += 1;
            report.publish_failures += self.dispatch(&msg, clock.now_ms(), bus, display);
        }

        let mut sink = (
            TopicPublisher::new(&self.topics, &mut *bus, &mut *display),
            LogEventSink::new(),
        );
        report.advanced = self.service.advance(clock.now_ms(), &mut sink);
        report.publish_failures += sink.0.failures();

        match poll_error {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }

    /// Drive cycles until `shutdown` is set, or until the transport has
    /// closed and no pour is in flight.  A pour that is running when the
    /// input ends still runs to completion.
    pub fn run<B, C, D>(
        &mut self,
        bus: &mut B,
        clock: &C,
        display: &mut D,
        shutdown: &AtomicBool,
    ) -> Result<(), Error>
    where
        B: MessageBus + ?Sized,
        C: Clock + ?Sized,
        D: DisplayPort + ?Sized,
    {
        self.subscribe(bus)?;
        self.start(bus, display);

        let mut closed = false;
        while !shutdown.load(Ordering::Acquire) {
            match self.run_once(bus, clock, display) {
                Ok(_) => {}
                Err(TransportError::Closed) => {
                    if !closed {
                        info!("Transport closed");
                        closed = true;
                    }
                    if !self.service.is_pouring() {
                        break;
                    }
                }
                Err(e) => warn!("Poll failed: {}", e),
            }
            if !self.idle_sleep.is_zero() {
                std::thread::sleep(self.idle_sleep);
            }
        }

        info!(
            "Stopped in {} after {} commands, {} increments",
            self.service.state(),
            self.service.commands_handled(),
            self.service.increments_emitted()
        );
        Ok(())
    }

    pub fn service(&self) -> &TapService {
        &self.service
    }

    pub fn topics(&self) -> &TapTopics {
        &self.topics
    }

    /// Route one inbound message.  Returns the number of failed publications.
    fn dispatch<B, D>(&mut self, msg: &InboundMessage, now_ms: u64, bus: &mut B, display: &mut D) -> u32
    where
        B: MessageBus + ?Sized,
        D: DisplayPort + ?Sized,
    {
        let mut sink = (
            TopicPublisher::new(&self.topics, &mut *bus, &mut *display),
            LogEventSink::new(),
        );
        match self.topics.route(&msg.topic) {
            InboundRoute::Command => {
                let cmd = TapCommand::from_payload(&msg.payload);
                self.service.handle_command(cmd, now_ms, &mut sink);
            }
            InboundRoute::CurrentUser => {
                let user = String::from_utf8_lossy(&msg.payload);
                self.service.set_current_user(user.trim(), &mut sink);
            }
            InboundRoute::Other => debug!("Ignoring message on {}", msg.topic),
        }
        sink.0.failures()
    }
}
