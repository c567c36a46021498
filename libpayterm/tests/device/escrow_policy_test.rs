// Escrow decision ladder, end to end: CCNET frames in, Stack/Return
// frames out, events observed on the channel.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use crate::common::fixtures::{SharedTransport, push, sent};

use libpayterm::device::{SessionTiming, ValidatorConfig, ValidatorSession};
use libpayterm::polling::{
    DeviceEvent, PollTiming, PollingEngine, SessionLimits, event_channel, spawn,
};
use libpayterm::protocol::ccnet::states::BillTable;
use libpayterm::test_support::{ccnet_identification, ccnet_poll_answer};
use libpayterm::Nominal;

/// Small table for the policy scenarios: type 0 is a 150 note, type 1
/// a 50 note.
fn policy_bills() -> BillTable {
    let mut values = [0u32; 24];
    values[0] = 150;
    values[1] = 50;
    BillTable::new(values)
}

fn config() -> ValidatorConfig {
    ValidatorConfig {
        bills: policy_bills(),
        timing: SessionTiming::fast(),
        ..ValidatorConfig::ccnet()
    }
}

fn probed_session(inner: &std::sync::Arc<std::sync::Mutex<libpayterm::MockTransport>>, shared: &SharedTransport) -> ValidatorSession {
    push(inner, ccnet_poll_answer(0x14, None));
    push(inner, ccnet_identification("SM-2419", "1021"));
    ValidatorSession::probe(shared.boxed(), config()).unwrap()
}

/// Command byte of every request frame written so far (offset 3).
fn commands_sent(inner: &std::sync::Arc<std::sync::Mutex<libpayterm::MockTransport>>) -> Vec<u8> {
    sent(inner)
        .iter()
        .filter(|f| f.len() > 3)
        .map(|f| f[3])
        .collect()
}

#[test]
fn over_limit_escrow_returns_the_note() {
    let (shared, inner) = SharedTransport::new();
    let session = probed_session(&inner, &shared);

    // SetEnabled answer, escrow of the 150 note, Return ack, Returned.
    push(&inner, ccnet_poll_answer(0x14, None));
    push(&inner, ccnet_poll_answer(0x80, Some(0)));
    push(&inner, ccnet_poll_answer(0x14, None));
    push(&inner, ccnet_poll_answer(0x82, None));

    let (tx, rx) = event_channel();
    let engine = PollingEngine::new(
        session,
        SessionLimits::new(100, true),
        PollTiming::immediate(),
        tx,
        Arc::new(AtomicBool::new(false)),
    );

    let handle = spawn(engine).unwrap();
    let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(event, DeviceEvent::NominalReturned(Nominal::new(150)));
    handle.stop().unwrap();

    let commands = commands_sent(&inner);
    assert!(commands.contains(&0x36), "Return must go on the wire");
    assert!(!commands.contains(&0x35), "Stack must never be sent");
}

#[test]
fn within_limit_escrow_stacks_the_note() {
    let (shared, inner) = SharedTransport::new();
    let session = probed_session(&inner, &shared);

    // SetEnabled answer, escrow of the 50 note, Stack ack, Stacked.
    push(&inner, ccnet_poll_answer(0x14, None));
    push(&inner, ccnet_poll_answer(0x80, Some(1)));
    push(&inner, ccnet_poll_answer(0x14, None));
    push(&inner, ccnet_poll_answer(0x81, Some(1)));

    let (tx, rx) = event_channel();
    let engine = PollingEngine::new(
        session,
        SessionLimits::new(100, true),
        PollTiming::immediate(),
        tx,
        Arc::new(AtomicBool::new(false)),
    );

    let handle = spawn(engine).unwrap();
    let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(event, DeviceEvent::NominalAccepted(Nominal::new(50)));
    handle.stop().unwrap();

    let commands = commands_sent(&inner);
    assert!(commands.contains(&0x35), "Stack must go on the wire");
    assert!(!commands.contains(&0x36), "Return must not be sent");
}

#[test]
fn db_error_outranks_an_acceptable_note() {
    let (shared, inner) = SharedTransport::new();
    let session = probed_session(&inner, &shared);

    push(&inner, ccnet_poll_answer(0x14, None));
    push(&inner, ccnet_poll_answer(0x80, Some(1))); // 50, well within limits
    push(&inner, ccnet_poll_answer(0x14, None));
    push(&inner, ccnet_poll_answer(0x82, None));

    let (tx, rx) = event_channel();
    let engine = PollingEngine::new(
        session,
        SessionLimits::new(100, true),
        PollTiming::immediate(),
        tx,
        Arc::new(AtomicBool::new(true)), // upstream DB failure
    );

    let handle = spawn(engine).unwrap();
    let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(event, DeviceEvent::NominalReturned(Nominal::new(50)));
    handle.stop().unwrap();

    let commands = commands_sent(&inner);
    assert!(commands.contains(&0x36));
    assert!(!commands.contains(&0x35));
}
