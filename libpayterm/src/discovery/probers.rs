// libpayterm/src/discovery/probers.rs

//! Concrete probers for the device classes this crate drives.
//!
//! Each prober opens a fresh transport per attempt through an injected
//! factory - the production factory opens real serial ports, tests hand
//! out mocks keyed by port name. Probe sessions are dropped immediately;
//! binding for polling re-probes on the claimed port.

use crate::device::{
    AcceptorConfig, AcceptorSession, ModemConfig, ModemSession, SessionTiming, ValidatorConfig,
    ValidatorSession, WatchdogSession,
};
use crate::discovery::DeviceProber;
use crate::transport::Transport;
use crate::types::{DeviceClass, DeviceIdentity, LineSettings};
use crate::Result;

/// Opens a transport for a port at the protocol's line settings.
pub type TransportFactory =
    Box<dyn FnMut(&str, &LineSettings) -> Result<Box<dyn Transport>> + Send>;

/// Production factory over the serial backend.
#[cfg(feature = "serial")]
pub fn serial_factory() -> TransportFactory {
    Box::new(|port, line| {
        Ok(Box::new(crate::transport::SerialTransport::open(port, line)?) as Box<dyn Transport>)
    })
}

/// Bill validator prober; the protocol variant comes from the config.
pub struct ValidatorProber {
    factory: TransportFactory,
    config: ValidatorConfig,
}

impl ValidatorProber {
    pub fn new(factory: TransportFactory, config: ValidatorConfig) -> Self {
        Self { factory, config }
    }
}

impl DeviceProber for ValidatorProber {
    fn class(&self) -> DeviceClass {
        DeviceClass::Validator
    }

    fn model(&self) -> String {
        self.config.protocol.model_name().to_string()
    }

    fn probe(&mut self, port: &str) -> Result<DeviceIdentity> {
        let transport = (self.factory)(port, &self.config.line())?;
        let mut session = ValidatorSession::probe(transport, self.config.clone())?;
        let identity = session.identity().clone();
        session.close();
        Ok(identity)
    }
}

/// ccTalk coin acceptor prober.
pub struct AcceptorProber {
    factory: TransportFactory,
    config: AcceptorConfig,
}

impl AcceptorProber {
    pub fn new(factory: TransportFactory, config: AcceptorConfig) -> Self {
        Self { factory, config }
    }
}

impl DeviceProber for AcceptorProber {
    fn class(&self) -> DeviceClass {
        DeviceClass::CoinAcceptor
    }

    fn model(&self) -> String {
        "ccTalk Coin Acceptor".to_string()
    }

    fn probe(&mut self, port: &str) -> Result<DeviceIdentity> {
        let transport = (self.factory)(port, &self.config.line())?;
        let mut session = AcceptorSession::probe(transport, self.config.clone())?;
        let identity = session.identity().clone();
        session.close();
        Ok(identity)
    }
}

/// AT modem prober. The coordinator applies the power-up wait before
/// this prober runs.
pub struct ModemProber {
    factory: TransportFactory,
    config: ModemConfig,
}

impl ModemProber {
    pub fn new(factory: TransportFactory, config: ModemConfig) -> Self {
        Self { factory, config }
    }
}

impl DeviceProber for ModemProber {
    fn class(&self) -> DeviceClass {
        DeviceClass::Modem
    }

    fn model(&self) -> String {
        "AT-Modem".to_string()
    }

    fn probe(&mut self, port: &str) -> Result<DeviceIdentity> {
        let transport = (self.factory)(port, &self.config.line())?;
        let (mut session, info) = ModemSession::probe(transport, self.config.clone())?;
        session.close();
        Ok(DeviceIdentity::new("AT-Modem", info.comment(), String::new()))
    }
}

/// OSMP watchdog prober.
pub struct WatchdogProber {
    factory: TransportFactory,
    timing: SessionTiming,
}

impl WatchdogProber {
    pub fn new(factory: TransportFactory, timing: SessionTiming) -> Self {
        Self { factory, timing }
    }
}

impl DeviceProber for WatchdogProber {
    fn class(&self) -> DeviceClass {
        DeviceClass::Watchdog
    }

    fn model(&self) -> String {
        "OSMP Watchdog".to_string()
    }

    fn probe(&mut self, port: &str) -> Result<DeviceIdentity> {
        let transport = (self.factory)(port, &WatchdogSession::line())?;
        let mut session = WatchdogSession::probe(transport, self.timing.clone())?;
        let identity = session.identity().clone();
        session.close();
        Ok(identity)
    }
}
