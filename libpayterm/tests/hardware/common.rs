#![cfg(feature = "serial")]

//! Helpers for tests that talk to real hardware.
//!
//! These compile only with `--features serial`. Probing walks every
//! enumerated port; machines without the device (CI) get `Ok(None)` so
//! the ignored tests stay green when run by hand anyway.

use libpayterm::device::{ValidatorConfig, ValidatorSession};
use libpayterm::discovery::{PortEnumerator, SystemPorts};
use libpayterm::transport::SerialTransport;
use libpayterm::{Error, Result};

/// Probe every system port for a CCNET validator.
///
/// - `Ok(Some(session))` : found and identified
/// - `Ok(None)` : no validator on this machine (acceptable in CI)
/// - `Err(e)` : a real failure worth seeing
pub fn find_ccnet_validator() -> Result<Option<ValidatorSession>> {
    let config = ValidatorConfig::ccnet();
    for port in SystemPorts.ports() {
        let transport = match SerialTransport::open(&port, &config.line()) {
            Ok(t) => t,
            Err(_) => continue,
        };
        match ValidatorSession::probe(Box::new(transport), config.clone()) {
            Ok(session) => return Ok(Some(session)),
            Err(Error::DeviceNotFound) => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(None)
}
