//! Console message bus adapter.
//!
//! Lets the simulator run without a broker: a reader thread turns input
//! lines into [`InboundMessage`]s and hands them to the event loop over
//! a bounded `embassy-sync` channel; publications are written to the
//! output as `topic payload` lines.
//!
//! ```text
//! ┌──────────────┐  InboundMessage  ┌──────────────┐
//! │ console-io   │────────────────▶│  Event loop  │──▶ stdout
//! │ (stdin read) │   Channel<_, 8>  │  (sync)      │
//! └──────────────┘                  └──────────────┘
//! ```
//!
//! Input format: a bare line is a payload for the tap's `cmd` topic;
//! `@<topic> <payload>` targets an explicit topic (e.g. `currentUser`).

use std::io::{self, BufRead, BufReader, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use log::{debug, warn};

use crate::app::ports::{InboundMessage, MessageBus, TransportError};

/// Inbound channel depth.
const INBOUND_DEPTH: usize = 8;

/// Back-off while the event loop drains a full channel, and the poll
/// granularity of [`ConsoleBus::poll`].
const BACKOFF: Duration = Duration::from_millis(10);
const POLL_STEP: Duration = Duration::from_millis(1);

type Inbound = Channel<CriticalSectionRawMutex, InboundMessage, INBOUND_DEPTH>;

/// [`MessageBus`] over line-oriented text streams.
pub struct ConsoleBus {
    inbound: Arc<Inbound>,
    closed: Arc<AtomicBool>,
    out: Box<dyn Write + Send>,
    subscriptions: Vec<String>,
}

impl ConsoleBus {
    /// Read commands from stdin and publish to stdout.
    pub fn spawn(cmd_topic: &str) -> io::Result<Self> {
        Self::from_streams(BufReader::new(io::stdin()), io::stdout(), cmd_topic)
    }

    /// Start the reader thread over arbitrary streams.
    pub fn from_streams<R, W>(reader: R, out: W, cmd_topic: &str) -> io::Result<Self>
    where
        R: BufRead + Send + 'static,
        W: Write + Send + 'static,
    {
        let inbound: Arc<Inbound> = Arc::new(Channel::new());
        let closed = Arc::new(AtomicBool::new(false));

        let tx = Arc::clone(&inbound);
        let eof = Arc::clone(&closed);
        let cmd_topic = cmd_topic.to_owned();
        thread::Builder::new()
            .name("console-io".into())
            .spawn(move || read_lines(reader, &cmd_topic, &tx, &eof))?;

        Ok(Self {
            inbound,
            closed,
            out: Box::new(out),
            subscriptions: Vec::new(),
        })
    }

    fn is_subscribed(&self, topic: &str) -> bool {
        self.subscriptions.iter().any(|s| s == topic)
    }
}

fn read_lines<R: BufRead>(reader: R, cmd_topic: &str, tx: &Inbound, eof: &AtomicBool) {
    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!("CONSOLE | read failed: {}", e);
                break;
            }
        };
        let Some(mut msg) = parse_line(&line, cmd_topic) else {
            continue;
        };
        loop {
            match tx.try_send(msg) {
                Ok(()) => break,
                Err(TrySendError::Full(m)) => {
                    msg = m;
                    thread::sleep(BACKOFF);
                }
            }
        }
    }
    debug!("CONSOLE | input closed");
    eof.store(true, Ordering::Release);
}

/// Turn one input line into a message.  Blank and oversized lines
/// yield `None`.
pub fn parse_line(line: &str, cmd_topic: &str) -> Option<InboundMessage> {
    // Only the terminator is stripped; payload whitespace is significant.
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return None;
    }
    let (topic, payload) = match line.strip_prefix('@') {
        Some(rest) => rest.split_once(' ').unwrap_or((rest, "")),
        None => (cmd_topic, line),
    };
    match InboundMessage::new(topic, payload.as_bytes()) {
        Ok(msg) => Some(msg),
        Err(e) => {
            warn!("CONSOLE | dropped line: {}", e);
            None
        }
    }
}

impl MessageBus for ConsoleBus {
    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        if !self.is_subscribed(topic) {
            self.subscriptions.push(topic.to_owned());
        }
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), TransportError> {
        writeln!(self.out, "{topic} {payload}")
            .and_then(|()| self.out.flush())
            .map_err(|_| TransportError::PublishFailed)
    }

    fn poll(&mut self, timeout: Duration) -> Result<Option<InboundMessage>, TransportError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.inbound.try_receive() {
                Ok(msg) if self.is_subscribed(&msg.topic) => return Ok(Some(msg)),
                Ok(msg) => {
                    debug!("CONSOLE | no subscriber for {}", msg.topic);
                    continue;
                }
                Err(_) => {}
            }
            // The flag is set only after the reader's last send.
            if self.closed.load(Ordering::Acquire) && self.inbound.is_empty() {
                return Err(TransportError::Closed);
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            thread::sleep(POLL_STEP);
        }
    }
}
