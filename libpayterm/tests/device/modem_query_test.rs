// Modem probe and USSD decode chain against scripted answers.

use crate::common::fixtures::{SharedTransport, is_open, push};

use libpayterm::device::{ModemConfig, ModemSession};
use libpayterm::protocol::at::gsm;
use libpayterm::test_support::at_answer;

type Inner = std::sync::Arc<std::sync::Mutex<libpayterm::MockTransport>>;

fn queue_probe(inner: &Inner) {
    push(inner, at_answer("OK")); // ATZ
    push(inner, at_answer("OK")); // ATE0
    push(inner, at_answer("+CPIN: READY\r\n\r\nOK"));
    push(inner, at_answer("+CSQ: 21,0\r\n\r\nOK"));
    push(inner, at_answer("E173\r\n\r\nOK"));
    push(inner, at_answer("+COPS: 0,0,\"Megafon\",2\r\n\r\nOK"));
}

#[test]
fn probe_reports_sim_operator_and_quality() {
    let (shared, inner) = SharedTransport::new();
    queue_probe(&inner);

    let (_session, info) = ModemSession::probe(shared.boxed(), ModemConfig::fast()).unwrap();
    assert!(info.sim_present);
    assert_eq!(info.signal_quality, "21");
    assert_eq!(info.operator, "Megafon");
    assert_eq!(info.comment(), "(E173 ( Megafon ))");
}

#[test]
fn failed_probe_closes_the_port() {
    let (shared, inner) = SharedTransport::new();
    assert!(ModemSession::probe(shared.boxed(), ModemConfig::fast()).is_err());
    assert!(!is_open(&inner));
}

#[test]
fn balance_decode_chain_prefers_earlier_stages() {
    // Plain-text answer: the regex matches directly, no decoding runs.
    let (shared, inner) = SharedTransport::new();
    queue_probe(&inner);
    push(&inner, at_answer("+CUSD: 0,\"Balans: 45.10 TJS\",15\r\n\r\nOK"));

    let (mut session, _) = ModemSession::probe(shared.boxed(), ModemConfig::fast()).unwrap();
    assert_eq!(session.balance().unwrap(), "45.10");
}

#[test]
fn balance_gsm7_stage_runs_when_plain_fails() {
    let (shared, inner) = SharedTransport::new();
    queue_probe(&inner);
    let envelope = gsm::encode_gsm7("Balans: 45.10 TJS");
    push(
        &inner,
        at_answer(&format!("+CUSD: 0,\"{}\",15\r\n\r\nOK", envelope)),
    );

    let (mut session, _) = ModemSession::probe(shared.boxed(), ModemConfig::fast()).unwrap();
    assert_eq!(session.balance().unwrap(), "45.10");
}

#[test]
fn balance_ucs2_stage_is_the_last_resort() {
    let (shared, inner) = SharedTransport::new();
    queue_probe(&inner);
    // UCS-2 hex of "-6.10"; neither the plain text nor the GSM 7-bit
    // unpacking of these bytes contains an amount.
    push(
        &inner,
        at_answer("+CUSD: 0,\"002D0036002E00310030\",15\r\n\r\nOK"),
    );

    let (mut session, _) = ModemSession::probe(shared.boxed(), ModemConfig::fast()).unwrap();
    assert_eq!(session.balance().unwrap(), "-6.10");
}

#[test]
fn balance_exhausted_chain_yields_empty() {
    let (shared, inner) = SharedTransport::new();
    queue_probe(&inner);
    push(&inner, at_answer("+CUSD: 0,\"####\",15\r\n\r\nOK"));

    let (mut session, _) = ModemSession::probe(shared.boxed(), ModemConfig::fast()).unwrap();
    assert_eq!(session.balance().unwrap(), "");
}
