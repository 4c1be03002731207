//! Fuzz target: command payloads through `TapService`
//!
//! Splits the input on newlines, feeds each chunk as a command payload,
//! and advances the pour between commands.  The service must never panic
//! and must keep `Pouring` in step with the simulator.
//!
//! cargo fuzz run fuzz_command_payload

#![no_main]

use libfuzzer_sys::fuzz_target;
use tapsim::adapters::log_sink::LogEventSink;
use tapsim::app::commands::TapCommand;
use tapsim::app::service::TapService;
use tapsim::fsm::TapState;
use tapsim::pour::PourProfile;

fuzz_target!(|data: &[u8]| {
    let mut svc = TapService::new(PourProfile::default(), 500);
    let mut sink = LogEventSink::new();
    svc.start(&mut sink);

    let mut now = 0u64;
    for chunk in data.split(|b| *b == b'\n') {
        svc.handle_command(TapCommand::from_payload(chunk), now, &mut sink);
        now += 250 * u64::from(chunk.len() as u8 % 4);
        svc.advance(now, &mut sink);
        assert_eq!(svc.state() == TapState::Pouring, svc.is_pouring());
        assert!(svc.total() >= 0.0);
    }
});
