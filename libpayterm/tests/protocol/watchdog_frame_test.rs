use libpayterm::protocol::watchdog::{Command, is_identity_reply};

#[test]
fn commands_are_prefix_plus_id() {
    assert_eq!(Command::Identify.encode(), b"OSP\x01");
    assert_eq!(Command::ResetModem.encode(), b"OSP\x02");
    assert_eq!(Command::StartTimer.encode(), b"OSP\x03");
    assert_eq!(Command::StopTimer.encode(), b"OSP\x04");
    assert_eq!(Command::Ping.encode(), b"OSP\x05");
    assert_eq!(Command::RebootPc.encode(), b"OSP\xAE");
}

#[test]
fn identity_requires_both_signature_parts() {
    assert!(is_identity_reply(b"WDT OSMP v1.00"));
    assert!(!is_identity_reply(b"WDT without version"));
    assert!(!is_identity_reply(b"v1.00 without name"));
}
