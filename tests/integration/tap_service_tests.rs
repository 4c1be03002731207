//! Integration tests for the TapService → FSM → pour simulator pipeline.
//!
//! Drive the service directly with commands and a manual time base and
//! check the full event stream it produces.

use super::mock_bus::VecSink;

use tapsim::app::commands::TapCommand;
use tapsim::app::events::TapEvent;
use tapsim::app::service::TapService;
use tapsim::fsm::{TapState, Trigger};
use tapsim::pour::PourProfile;

const INTERVAL: u64 = 500;

fn make_service() -> (TapService, VecSink) {
    let mut svc = TapService::new(PourProfile::default(), INTERVAL);
    let mut sink = VecSink::new();
    svc.start(&mut sink);
    sink.events.clear();
    (svc, sink)
}

/// Start a pour at t=0 and emit `n` increments.
fn pour_steps(svc: &mut TapService, sink: &mut VecSink, n: u64) {
    svc.handle_command(TapCommand::Start, 0, sink);
    for i in 1..=n {
        assert!(svc.advance(i * INTERVAL, sink), "step {i} should emit");
    }
}

// ── Commands while idle ───────────────────────────────────────

#[test]
fn only_start_leaves_idle_for_pouring() {
    let (mut svc, mut sink) = make_service();
    for cmd in [
        TapCommand::Display("hello".into()),
        TapCommand::Unknown("pour".into()),
        TapCommand::Unknown("START".into()),
        TapCommand::Reset,
    ] {
        svc.handle_command(cmd, 0, &mut sink);
        assert_eq!(svc.state(), TapState::Idle);
    }
    svc.handle_command(TapCommand::Start, 0, &mut sink);
    assert_eq!(svc.state(), TapState::Pouring);
}

#[test]
fn done_and_reset_succeed_from_every_state() {
    for target in [TapCommand::Done, TapCommand::Reset] {
        for steps in [None, Some(0), Some(2), Some(4)] {
            let (mut svc, mut sink) = make_service();
            if let Some(n) = steps {
                pour_steps(&mut svc, &mut sink, n);
            }
            sink.events.clear();

            let expected = if target == TapCommand::Done { TapState::Done } else { TapState::Idle };
            svc.handle_command(target.clone(), 10_000, &mut sink);
            assert_eq!(svc.state(), expected);
            assert_eq!(svc.total(), 0.0);
            assert!(!svc.is_pouring());
            assert!(matches!(sink.events[0], TapEvent::StateChanged { to, .. } if to == expected));
            assert_eq!(sink.events[1], TapEvent::AmountCleared);
        }
    }
}

// ── Full pour ─────────────────────────────────────────────────

#[test]
fn natural_pour_reports_running_totals_then_stops() {
    let (mut svc, mut sink) = make_service();
    pour_steps(&mut svc, &mut sink, 4);

    let totals = sink.totals();
    let expected = [2.3, 5.4, 6.6, 11.3];
    assert_eq!(totals.len(), expected.len());
    for (got, want) in totals.iter().zip(expected) {
        assert!((got - want).abs() < 1e-9, "{got} != {want}");
    }
    let shown: Vec<String> = totals.iter().map(|t| format!("{t:.2}")).collect();
    assert_eq!(shown, ["2.30", "5.40", "6.60", "11.30"]);

    assert_eq!(svc.state(), TapState::Stopped);
    assert_eq!(
        sink.events.last(),
        Some(&TapEvent::StateChanged { from: TapState::Pouring, to: TapState::Stopped })
    );
    // Stopped keeps the poured total.
    assert!((svc.total() - 11.3).abs() < 1e-9);
}

#[test]
fn totals_are_exact_left_to_right_sums() {
    let (mut svc, mut sink) = make_service();
    pour_steps(&mut svc, &mut sink, 4);
    let mut acc = 0.0f64;
    for (total, inc) in sink.totals().iter().zip(PourProfile::default().as_slice()) {
        acc += inc;
        assert_eq!(total.to_string(), acc.to_string());
    }
}

#[test]
fn advance_after_exhaustion_is_a_noop_until_next_start() {
    let (mut svc, mut sink) = make_service();
    pour_steps(&mut svc, &mut sink, 4);
    sink.events.clear();

    for t in [2_500, 3_000, 60_000] {
        assert!(!svc.advance(t, &mut sink));
    }
    assert!(sink.events.is_empty());

    svc.handle_command(TapCommand::Reset, 61_000, &mut sink);
    svc.handle_command(TapCommand::Start, 61_000, &mut sink);
    assert!(svc.advance(61_500, &mut sink));
    assert_eq!(sink.totals(), vec![2.3]);
}

// ── Interruptions ─────────────────────────────────────────────

#[test]
fn done_mid_pour_stops_increments() {
    let (mut svc, mut sink) = make_service();
    pour_steps(&mut svc, &mut sink, 2);
    sink.events.clear();

    svc.handle_command(TapCommand::Done, 1_100, &mut sink);
    assert_eq!(
        sink.events,
        vec![
            TapEvent::StateChanged { from: TapState::Pouring, to: TapState::Done },
            TapEvent::AmountCleared,
        ]
    );
    sink.events.clear();
    for t in (1_500..=10_000).step_by(250) {
        assert!(!svc.advance(t, &mut sink));
    }
    assert!(sink.events.is_empty());
    assert_eq!(svc.increments_emitted(), 2);
}

#[test]
fn reset_then_start_pours_from_zero() {
    let (mut svc, mut sink) = make_service();
    pour_steps(&mut svc, &mut sink, 3);
    svc.handle_command(TapCommand::Reset, 1_600, &mut sink);
    assert_eq!(svc.total(), 0.0);
    sink.events.clear();

    svc.handle_command(TapCommand::Start, 2_000, &mut sink);
    assert!(!svc.advance(2_499, &mut sink));
    assert!(svc.advance(2_500, &mut sink));
    assert_eq!(sink.totals(), vec![2.3]);
}

#[test]
fn second_start_does_not_rearm() {
    let (mut svc, mut sink) = make_service();
    pour_steps(&mut svc, &mut sink, 1);
    sink.events.clear();

    svc.handle_command(TapCommand::Start, 600, &mut sink);
    assert_eq!(
        sink.events,
        vec![TapEvent::CommandIgnored { trigger: Trigger::Start, state: TapState::Pouring }]
    );
    // The next increment is still paced from the last emission at 500.
    assert!(svc.advance(1_000, &mut sink));
    assert!((svc.total() - 5.4).abs() < 1e-9);
}

#[test]
fn start_is_ignored_after_natural_completion() {
    let (mut svc, mut sink) = make_service();
    pour_steps(&mut svc, &mut sink, 4);
    svc.handle_command(TapCommand::Start, 3_000, &mut sink);
    assert_eq!(svc.state(), TapState::Stopped);
    assert!(!svc.advance(3_500, &mut sink));
}

// ── Pacing ────────────────────────────────────────────────────

#[test]
fn advancing_faster_than_interval_never_emits() {
    let (mut svc, mut sink) = make_service();
    svc.handle_command(TapCommand::Start, 0, &mut sink);
    for t in (0..INTERVAL).step_by(7) {
        assert!(!svc.advance(t, &mut sink));
    }
    assert!(svc.advance(INTERVAL, &mut sink));
    // Immediately after an emission the interval restarts.
    assert!(!svc.advance(INTERVAL + 1, &mut sink));
    assert!(!svc.advance(2 * INTERVAL - 1, &mut sink));
    assert!(svc.advance(2 * INTERVAL, &mut sink));
}

#[test]
fn a_long_gap_emits_only_one_increment() {
    let (mut svc, mut sink) = make_service();
    svc.handle_command(TapCommand::Start, 0, &mut sink);
    assert!(svc.advance(10_000, &mut sink));
    assert!(!svc.advance(10_000, &mut sink));
    assert_eq!(sink.totals(), vec![2.3]);
}

// ── Idempotence ───────────────────────────────────────────────

#[test]
fn repeated_reset_repeats_identical_events() {
    let (mut svc, mut sink) = make_service();
    for _ in 0..3 {
        svc.handle_command(TapCommand::Reset, 0, &mut sink);
    }
    let once = [
        TapEvent::StateChanged { from: TapState::Idle, to: TapState::Idle },
        TapEvent::AmountCleared,
    ];
    let expected: Vec<TapEvent> = once.iter().cycle().take(6).cloned().collect();
    assert_eq!(sink.events, expected);
    assert_eq!(svc.state(), TapState::Idle);
}

#[test]
fn custom_profile_is_honoured() {
    let profile = PourProfile::new(&[10.0, 0.5]).unwrap();
    let mut svc = TapService::new(profile, 100);
    let mut sink = VecSink::new();
    svc.start(&mut sink);
    svc.handle_command(TapCommand::Start, 0, &mut sink);
    assert!(svc.advance(100, &mut sink));
    assert!(svc.advance(200, &mut sink));
    assert_eq!(sink.totals(), vec![10.0, 10.5]);
    assert_eq!(svc.state(), TapState::Stopped);
}
