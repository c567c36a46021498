//! Probe every serial port for the devices a terminal knows about and
//! print what was found.
//!
//! Usage:
//!   cargo run -p libpayterm --example probe_ports --features serial

use libpayterm::device::{AcceptorConfig, ModemConfig, SessionTiming, ValidatorConfig};
use libpayterm::discovery::probers::{
    AcceptorProber, ModemProber, ValidatorProber, WatchdogProber, serial_factory,
};
use libpayterm::discovery::{MemoryRegistry, SearchCoordinator, SystemPorts};

fn main() {
    env_logger::init();

    let mut registry = MemoryRegistry::new();
    let mut coordinator = SearchCoordinator::new(vec![
        Box::new(ValidatorProber::new(
            serial_factory(),
            ValidatorConfig::ccnet(),
        )),
        Box::new(AcceptorProber::new(serial_factory(), AcceptorConfig::tajik())),
        Box::new(WatchdogProber::new(
            serial_factory(),
            SessionTiming::watchdog(),
        )),
        Box::new(ModemProber::new(serial_factory(), ModemConfig::default())),
    ])
    // Skip the modem power-up wait when running interactively.
    .with_modem_wait(0);

    for outcome in coordinator.run(&SystemPorts, &mut registry) {
        match (&outcome.port, &outcome.identity) {
            (Some(port), Some(identity)) => {
                println!(
                    "{}: {} on {} (pn: {}, sn: {})",
                    outcome.class, identity.model, port, identity.part_number,
                    identity.serial_number
                );
            }
            _ => println!("{}: not found", outcome.class),
        }
    }
}
