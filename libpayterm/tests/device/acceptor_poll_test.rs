// Coin acceptor polling end to end: credits come straight from the
// buffered event queue, no escrow phase.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use crate::common::fixtures::{SharedTransport, push};

use libpayterm::Nominal;
use libpayterm::device::{AcceptorConfig, AcceptorSession, SessionTiming};
use libpayterm::polling::{
    DeviceEvent, PollDevice, PollState, PollTiming, PollingEngine, SessionLimits, event_channel,
    spawn,
};
use libpayterm::protocol::cctalk::CoinValueMap;
use libpayterm::test_support::{cctalk_answer, cctalk_credit_answer};

fn config() -> AcceptorConfig {
    AcceptorConfig {
        values: CoinValueMap::tajik(),
        timing: SessionTiming::fast(),
    }
}

fn queue_identity(inner: &std::sync::Arc<std::sync::Mutex<libpayterm::MockTransport>>) {
    push(inner, cctalk_answer(&[]));
    push(inner, cctalk_answer(b"NRI"));
    push(inner, cctalk_answer(b"G13"));
    push(inner, cctalk_answer(&[0x45, 0x23, 0x01]));
}

fn queue_init(inner: &std::sync::Arc<std::sync::Mutex<libpayterm::MockTransport>>) {
    for _ in 0..5 {
        push(inner, cctalk_answer(&[]));
    }
    push(inner, cctalk_answer(b"TJ100A"));
    for _ in 2..=16 {
        push(inner, cctalk_answer(b"......"));
    }
}

#[test]
fn coin_credit_becomes_a_nominal_event() {
    let (shared, inner) = SharedTransport::new();
    queue_identity(&inner);
    queue_init(&inner);

    // Enable answer, then one poll with a slot-1 credit.
    push(&inner, cctalk_answer(&[]));
    push(&inner, cctalk_credit_answer(1, &[(1, 1)]));

    let mut session = AcceptorSession::probe(shared.boxed(), config()).unwrap();
    session.init().unwrap();

    let (tx, rx) = event_channel();
    let engine = PollingEngine::new(
        session,
        SessionLimits::unlimited(),
        PollTiming::immediate(),
        tx,
        Arc::new(AtomicBool::new(false)),
    );

    let handle = spawn(engine).unwrap();
    let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(event, DeviceEvent::NominalAccepted(Nominal::new(100)));
    handle.stop().unwrap();
}

#[test]
fn burst_of_credits_queues_each_event() {
    let (shared, inner) = SharedTransport::new();
    queue_identity(&inner);
    queue_init(&inner);

    let mut session = AcceptorSession::probe(shared.boxed(), config()).unwrap();
    session.init().unwrap();

    // Two credits buffered in one answer surface as two poll states;
    // the engine's duplicate filter decides what they count for.
    push(&inner, cctalk_credit_answer(2, &[(1, 1), (1, 1)]));

    assert_eq!(session.poll().unwrap(), PollState::Stacked(Nominal::new(100)));
    assert_eq!(session.poll().unwrap(), PollState::Stacked(Nominal::new(100)));
}

#[test]
fn fault_pair_is_surfaced_not_counted() {
    let (shared, inner) = SharedTransport::new();
    queue_identity(&inner);
    queue_init(&inner);

    let mut session = AcceptorSession::probe(shared.boxed(), config()).unwrap();
    session.init().unwrap();

    push(&inner, cctalk_credit_answer(1, &[(0, 0x01)]));
    match session.poll().unwrap() {
        PollState::CoinFault(_) => {}
        other => panic!("expected CoinFault, got {:?}", other),
    }
}
