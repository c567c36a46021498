// End-to-end probe scenarios over an inspectable transport.

use crate::common::fixtures::{SharedTransport, is_open, push, sent};

use libpayterm::device::{AcceptorConfig, AcceptorSession, SessionTiming};
use libpayterm::discovery::probers::AcceptorProber;
use libpayterm::discovery::{DeviceProber, TransportFactory};
use libpayterm::protocol::cctalk::CoinValueMap;
use libpayterm::test_support::cctalk_answer;
use libpayterm::transport::Transport;

fn fast_acceptor_config() -> AcceptorConfig {
    AcceptorConfig {
        values: CoinValueMap::tajik(),
        timing: SessionTiming::fast(),
    }
}

/// Queue the full identity conversation: simple-poll ACK (the `01 00 02`
/// signature), manufacturer id, product code, serial number.
fn queue_identity(inner: &std::sync::Arc<std::sync::Mutex<libpayterm::MockTransport>>) {
    push(inner, cctalk_answer(&[])); // 01 00 02 00 <crc>
    push(inner, cctalk_answer(b"NRI"));
    push(inner, cctalk_answer(b"G13"));
    push(inner, cctalk_answer(&[0x45, 0x23, 0x01]));
}

#[test]
fn cctalk_probe_yields_identity_from_part_and_serial() {
    let (shared, inner) = SharedTransport::new();
    queue_identity(&inner);

    let session = AcceptorSession::probe(shared.boxed(), fast_acceptor_config()).unwrap();
    let identity = session.identity();

    assert_eq!(identity.model, "ccTalk Coin Acceptor");
    assert_eq!(identity.part_number, "NRI G13");
    assert_eq!(identity.serial_number, "74565");

    // Four requests went out: simple poll + three identity commands.
    assert_eq!(sent(&inner).len(), 4);
}

#[test]
fn cctalk_probe_failure_closes_the_port() {
    let (shared, inner) = SharedTransport::new();
    // Silence: not this device on this port.
    let result = AcceptorSession::probe(shared.boxed(), fast_acceptor_config());
    assert!(result.is_err());
    assert!(!is_open(&inner));
}

#[test]
fn prober_closes_the_port_even_on_success() {
    // The discovery prober collects the identity and releases the port;
    // binding for polling re-probes later.
    let (shared, inner) = SharedTransport::new();
    queue_identity(&inner);

    let shared_for_factory = shared.clone();
    let factory: TransportFactory = Box::new(move |_port, _line| {
        Ok(Box::new(shared_for_factory.clone()) as Box<dyn Transport>)
    });

    let mut prober = AcceptorProber::new(factory, fast_acceptor_config());
    let identity = prober.probe("COM4").unwrap();

    assert_eq!(identity.part_number, "NRI G13");
    assert!(!is_open(&inner), "prober must release the port");
}
