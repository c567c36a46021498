#![cfg(feature = "serial")]

use libpayterm::Result;
use libpayterm::device::{SessionTiming, WatchdogSession};
use libpayterm::discovery::{PortEnumerator, SystemPorts};
use libpayterm::transport::SerialTransport;
use serial_test::serial;

// Requires a real OSMP watchdog. Run manually with:
//
// cargo test -p libpayterm --test hardware --features serial -- --ignored

#[test]
#[ignore]
#[serial]
fn probe_watchdog_and_ping() -> Result<()> {
    for port in SystemPorts.ports() {
        let transport = match SerialTransport::open(&port, &WatchdogSession::line()) {
            Ok(t) => t,
            Err(_) => continue,
        };
        if let Ok(mut session) =
            WatchdogSession::probe(Box::new(transport), SessionTiming::watchdog())
        {
            session.ping()?;
            return Ok(());
        }
    }
    Ok(())
}
