// Full search over mock ports: real probers, fake wires.

use libpayterm::MockTransport;
use libpayterm::device::{AcceptorConfig, ModemConfig, SessionTiming, ValidatorConfig};
use libpayterm::discovery::probers::{
    AcceptorProber, ModemProber, TransportFactory, ValidatorProber, WatchdogProber,
};
use libpayterm::discovery::{
    DeviceRegistry, MemoryRegistry, SearchCoordinator, StaticPorts,
};
use libpayterm::protocol::cctalk::CoinValueMap;
use libpayterm::test_support::{
    at_answer, ccnet_identification, ccnet_poll_answer, cctalk_answer,
};
use libpayterm::transport::Transport;
use libpayterm::types::DeviceClass;

/// A little switchboard: each port answers as exactly one device.
fn factory() -> TransportFactory {
    Box::new(|port, _line| {
        let mut mock = MockTransport::new();
        match port {
            "COM1" => {
                // CCNET validator.
                mock.push_response(ccnet_poll_answer(0x14, None));
                mock.push_response(ccnet_identification("SM-2419-RU", "1021000345"));
            }
            "COM2" => {
                // ccTalk coin acceptor.
                mock.push_response(cctalk_answer(&[]));
                mock.push_response(cctalk_answer(b"NRI"));
                mock.push_response(cctalk_answer(b"G13"));
                mock.push_response(cctalk_answer(&[0x45, 0x23, 0x01]));
            }
            "COM3" => {
                // OSMP watchdog.
                mock.push_response(b"WDT OSMP v1.00".to_vec());
            }
            "COM4" => {
                // AT modem.
                mock.push_response(at_answer("OK"));
                mock.push_response(at_answer("OK"));
                mock.push_response(at_answer("+CPIN: READY\r\n\r\nOK"));
                mock.push_response(at_answer("+CSQ: 17,0\r\n\r\nOK"));
                mock.push_response(at_answer("E173\r\n\r\nOK"));
                mock.push_response(at_answer("+COPS: 0,0,\"Tcell\",2\r\n\r\nOK"));
            }
            _ => {}
        }
        Ok(Box::new(mock) as Box<dyn Transport>)
    })
}

fn fast_validator() -> ValidatorConfig {
    ValidatorConfig {
        timing: SessionTiming::fast(),
        ..ValidatorConfig::ccnet()
    }
}

fn fast_acceptor() -> AcceptorConfig {
    AcceptorConfig {
        values: CoinValueMap::tajik(),
        timing: SessionTiming::fast(),
    }
}

#[test]
fn full_search_binds_every_class_to_its_port() {
    let ports = StaticPorts(vec![
        "COM1".into(),
        "COM2".into(),
        "COM3".into(),
        "COM4".into(),
    ]);
    let mut registry = MemoryRegistry::new();

    let mut coordinator = SearchCoordinator::new(vec![
        Box::new(ValidatorProber::new(factory(), fast_validator())),
        Box::new(AcceptorProber::new(factory(), fast_acceptor())),
        Box::new(WatchdogProber::new(factory(), SessionTiming::fast())),
        Box::new(ModemProber::new(factory(), ModemConfig::fast())),
    ])
    .with_modem_wait(0);

    let outcomes = coordinator.run(&ports, &mut registry);

    assert!(outcomes.iter().all(|o| o.found), "all devices present");
    assert_eq!(outcomes[0].port.as_deref(), Some("COM1"));
    assert_eq!(outcomes[1].port.as_deref(), Some("COM2"));
    assert_eq!(outcomes[2].port.as_deref(), Some("COM3"));
    assert_eq!(outcomes[3].port.as_deref(), Some("COM4"));

    let validator = registry.get(DeviceClass::Validator).unwrap();
    assert!(validator.present);
    assert_eq!(validator.port, "COM1");
    assert_eq!(validator.name, "CashCode CCNET");

    let modem = registry.get(DeviceClass::Modem).unwrap();
    assert!(modem.present);
    assert!(modem.comment.contains("Tcell"));
}

#[test]
fn absent_class_does_not_steal_ports() {
    // No watchdog anywhere; everything else present.
    let ports = StaticPorts(vec!["COM1".into(), "COM4".into()]);
    let mut registry = MemoryRegistry::new();

    let mut coordinator = SearchCoordinator::new(vec![
        Box::new(WatchdogProber::new(factory(), SessionTiming::fast())),
        Box::new(ValidatorProber::new(factory(), fast_validator())),
    ])
    .with_modem_wait(0);

    let outcomes = coordinator.run(&ports, &mut registry);

    assert!(!outcomes[0].found);
    assert!(outcomes[1].found);
    assert_eq!(outcomes[1].port.as_deref(), Some("COM1"));

    let watchdog = registry.get(DeviceClass::Watchdog).unwrap();
    assert!(!watchdog.present);
    assert!(watchdog.port.is_empty());
}
