//! Integration tests for the cooperative loop: bus → runtime → service →
//! publications, with a manual clock.

use super::mock_bus::{ManualClock, MockBus, MockDisplay, SteppingClock};

use std::io::{self, Cursor, Write};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use tapsim::adapters::console::ConsoleBus;
use tapsim::adapters::time::SystemClock;
use tapsim::app::ports::{Clock, TransportError};
use tapsim::config::TapConfig;
use tapsim::fsm::TapState;
use tapsim::runtime::TapRuntime;

const CMD: &str = "tap/1/cmd";
const USER: &str = "tap/1/currentUser";
const STATUS: &str = "tap/1/status";
const AMOUNT: &str = "tap/1/amount";

struct Rig {
    rt: TapRuntime,
    bus: MockBus,
    clock: ManualClock,
    display: MockDisplay,
}

impl Rig {
    fn new(config: TapConfig) -> Self {
        let mut rig = Self {
            rt: TapRuntime::new(&config).unwrap(),
            bus: MockBus::new(),
            clock: ManualClock::new(),
            display: MockDisplay::default(),
        };
        rig.rt.subscribe(&mut rig.bus).unwrap();
        rig.rt.start(&mut rig.bus, &mut rig.display);
        rig
    }

    fn cycle(&mut self) {
        self.rt
            .run_once(&mut self.bus, &self.clock, &mut self.display)
            .unwrap();
    }

    /// Run cycles every `step` ms until `until` (inclusive).
    fn run_until(&mut self, until: u64, step: u64) {
        while self.clock.now_ms() < until {
            self.clock.tick(step);
            self.cycle();
        }
    }
}

#[test]
fn start_is_silent_until_first_command() {
    let rig = Rig::new(TapConfig::default());
    assert!(rig.bus.published.is_empty());
    assert_eq!(rig.bus.subscriptions, vec![CMD, USER]);
}

#[test]
fn full_pour_over_the_wire() {
    let mut rig = Rig::new(TapConfig::default());
    rig.bus.push(CMD, "start");
    rig.cycle();
    assert_eq!(rig.bus.on(STATUS), vec!["pouring"]);

    rig.run_until(5_000, 50);

    let amounts: Vec<f64> = rig.bus.on(AMOUNT).iter().map(|a| a.parse().unwrap()).collect();
    let expected = [2.3, 5.4, 6.6, 11.3];
    assert_eq!(amounts.len(), 4);
    for (got, want) in amounts.iter().zip(expected) {
        assert!((got - want).abs() < 1e-9);
    }
    assert_eq!(rig.bus.on(STATUS), vec!["pouring", "stopped"]);
    assert_eq!(rig.rt.service().state(), TapState::Stopped);
}

#[test]
fn increments_are_paced_by_the_interval() {
    let mut rig = Rig::new(TapConfig::default());
    rig.bus.push(CMD, "start");
    rig.cycle();

    rig.run_until(450, 50);
    assert!(rig.bus.on(AMOUNT).is_empty());
    rig.run_until(500, 50);
    assert_eq!(rig.bus.on(AMOUNT), vec!["2.3"]);
    rig.run_until(950, 50);
    assert_eq!(rig.bus.on(AMOUNT).len(), 1);
}

#[test]
fn done_mid_pour_publishes_done_and_zero() {
    let mut rig = Rig::new(TapConfig::default());
    rig.bus.push(CMD, "start");
    rig.cycle();
    rig.run_until(1_000, 100);
    assert_eq!(rig.bus.on(AMOUNT), vec!["2.3", "5.4"]);
    rig.bus.clear();

    rig.bus.push(CMD, "done");
    rig.cycle();
    assert_eq!(
        rig.bus.published,
        vec![
            (STATUS.to_string(), "done".to_string()),
            (AMOUNT.to_string(), "0".to_string()),
        ]
    );

    rig.bus.clear();
    rig.run_until(5_000, 100);
    assert!(rig.bus.published.is_empty());
}

#[test]
fn commands_are_handled_while_pouring() {
    let mut rig = Rig::new(TapConfig::default());
    rig.bus.push(CMD, "start");
    rig.cycle();
    rig.clock.set(250);
    rig.bus.push(CMD, "display:Enjoy");
    rig.bus.push(USER, "ada");
    rig.cycle();

    assert_eq!(rig.display.shown, vec!["Enjoy", "user:ada"]);
    assert_eq!(rig.rt.service().state(), TapState::Pouring);
    assert_eq!(rig.rt.service().current_user(), Some("ada"));
}

#[test]
fn current_user_never_changes_state() {
    let mut rig = Rig::new(TapConfig::default());
    for user in ["ada", "", "grace"] {
        rig.bus.push(USER, user);
        rig.cycle();
        assert_eq!(rig.rt.service().state(), TapState::Idle);
    }
    assert!(rig.bus.on(STATUS).is_empty());
    assert_eq!(rig.rt.service().current_user(), Some("grace"));
}

#[test]
fn unknown_and_invalid_payloads_are_tolerated() {
    let mut rig = Rig::new(TapConfig::default());
    rig.bus.push(CMD, "Start");
    rig.bus.push(CMD, " start");
    rig.bus.push_raw(CMD, &[0xff, 0xfe, b's']);
    rig.cycle();
    assert_eq!(rig.rt.service().state(), TapState::Idle);
    assert!(rig.bus.published.is_empty());
    assert_eq!(rig.rt.service().commands_handled(), 3);
}

#[test]
fn repeated_reset_republishes_idle_and_zero() {
    let mut rig = Rig::new(TapConfig::default());
    rig.bus.push(CMD, "reset");
    rig.bus.push(CMD, "reset");
    rig.cycle();
    assert_eq!(rig.bus.on(STATUS), vec!["idle", "idle"]);
    assert_eq!(rig.bus.on(AMOUNT), vec!["0", "0"]);
}

#[test]
fn drain_limit_defers_excess_messages() {
    let mut rig = Rig::new(TapConfig {
        max_drain_per_cycle: 3,
        ..TapConfig::default()
    });
    for _ in 0..7 {
        rig.bus.push(CMD, "reset");
    }
    let report = rig
        .rt
        .run_once(&mut rig.bus, &rig.clock, &mut rig.display)
        .unwrap();
    assert_eq!(report.messages, 3);
    assert_eq!(rig.bus.inbound.len(), 4);
}

#[test]
fn publish_failures_do_not_change_state() {
    let mut rig = Rig::new(TapConfig::default());
    rig.bus.fail_publish = true;
    rig.bus.push(CMD, "start");
    let report = rig
        .rt
        .run_once(&mut rig.bus, &rig.clock, &mut rig.display)
        .unwrap();
    assert_eq!(report.publish_failures, 1);
    assert_eq!(rig.rt.service().state(), TapState::Pouring);

    rig.clock.set(500);
    let report = rig
        .rt
        .run_once(&mut rig.bus, &rig.clock, &mut rig.display)
        .unwrap();
    assert!(report.advanced);
    assert_eq!(report.publish_failures, 1);
}

#[test]
fn custom_prefix_and_id_scope_topics() {
    let mut rig = Rig::new(TapConfig {
        tap_id: "7".into(),
        topic_prefix: "beer/tap".into(),
        ..TapConfig::default()
    });
    rig.bus.push(CMD, "start");
    rig.bus.push("beer/tap/7/cmd", "done");
    rig.cycle();
    assert_eq!(rig.bus.on("beer/tap/7/status"), vec!["done"]);
    assert!(rig.bus.on(STATUS).is_empty());
}

#[test]
fn run_returns_when_transport_closes() {
    let config = TapConfig {
        idle_sleep_ms: 0,
        ..TapConfig::default()
    };
    let mut rt = TapRuntime::new(&config).unwrap();
    let mut bus = MockBus::new();
    let clock = ManualClock::new();
    let mut display = MockDisplay::default();
    bus.push(CMD, "start");
    bus.push_error(TransportError::NotConnected);
    bus.push(CMD, "reset");
    bus.push_error(TransportError::Closed);

    rt.run(&mut bus, &clock, &mut display, &AtomicBool::new(false))
        .unwrap();
    assert_eq!(rt.service().state(), TapState::Idle);
    assert_eq!(bus.on(STATUS), vec!["pouring", "idle"]);
}

#[test]
fn run_honours_shutdown_flag() {
    let mut rt = TapRuntime::new(&TapConfig::default()).unwrap();
    let mut bus = MockBus::new();
    rt.run(&mut bus, &ManualClock::new(), &mut MockDisplay::default(), &AtomicBool::new(true))
        .unwrap();
    assert_eq!(bus.polls, 0);
    assert_eq!(bus.subscriptions.len(), 2);
}

#[test]
fn invalid_config_is_rejected() {
    let config = TapConfig {
        tap_id: String::new(),
        ..TapConfig::default()
    };
    assert!(TapRuntime::new(&config).is_err());
}

#[test]
fn closed_transport_mid_pour_still_completes_the_pour() {
    let config = TapConfig {
        idle_sleep_ms: 0,
        ..TapConfig::default()
    };
    let mut rt = TapRuntime::new(&config).unwrap();
    let mut bus = MockBus::new();
    bus.push(CMD, "start");
    bus.push_error(TransportError::Closed);

    rt.run(&mut bus, &SteppingClock::new(50), &mut MockDisplay::default(), &AtomicBool::new(false))
        .unwrap();
    assert_eq!(rt.service().state(), TapState::Stopped);
    assert_eq!(bus.on(STATUS), vec!["pouring", "stopped"]);
    assert_eq!(bus.on(AMOUNT).len(), 4);
}

#[test]
fn closed_transport_stops_an_idle_tap() {
    let mut rt = TapRuntime::new(&TapConfig::default()).unwrap();
    let mut bus = MockBus::new();
    bus.push_error(TransportError::Closed);
    rt.run(&mut bus, &SteppingClock::new(50), &mut MockDisplay::default(), &AtomicBool::new(false))
        .unwrap();
    assert_eq!(rt.service().state(), TapState::Idle);
    assert_eq!(bus.polls, 1);
}

#[derive(Clone, Default)]
struct SharedOut(Arc<Mutex<Vec<u8>>>);

impl Write for SharedOut {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn piped_start_pours_to_completion_on_the_console() {
    let config = TapConfig {
        pour_interval_ms: 5,
        poll_timeout_ms: 1,
        idle_sleep_ms: 1,
        ..TapConfig::default()
    };
    let mut rt = TapRuntime::new(&config).unwrap();
    let out = SharedOut::default();
    let mut bus = ConsoleBus::from_streams(Cursor::new("start\n"), out.clone(), CMD).unwrap();

    rt.run(&mut bus, &SystemClock::new(), &mut MockDisplay::default(), &AtomicBool::new(false))
        .unwrap();

    assert_eq!(rt.service().state(), TapState::Stopped);
    assert_eq!(rt.service().increments_emitted(), 4);
    let text = String::from_utf8(out.0.lock().unwrap().clone()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.first(), Some(&"tap/1/status pouring"));
    assert_eq!(lines.last(), Some(&"tap/1/status stopped"));
    assert_eq!(lines.iter().filter(|l| l.starts_with("tap/1/amount ")).count(), 4);
}
