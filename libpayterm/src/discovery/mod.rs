// libpayterm/src/discovery/mod.rs

//! Device discovery: walk the candidate serial ports per device class,
//! probe, claim, persist.
//!
//! The registry's previously stored port is tried first (fast path); a
//! successful probe removes the port from the candidate pool so later
//! device classes cannot re-claim it. Probing is strictly sequential -
//! two probers poking the same port would corrupt each other's answers.

pub mod probers;

pub use probers::{
    AcceptorProber, ModemProber, TransportFactory, ValidatorProber, WatchdogProber,
};

use std::collections::HashMap;

use crate::types::{DeviceClass, DeviceIdentity};
use crate::{Result, constants};

/// One persisted registry row per device class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegistryEntry {
    pub name: String,
    pub port: String,
    pub comment: String,
    /// Whether the device was present at the last search.
    pub present: bool,
}

/// External device registry (the terminal database in production).
pub trait DeviceRegistry {
    fn get(&self, class: DeviceClass) -> Option<RegistryEntry>;
    fn set(&mut self, class: DeviceClass, entry: &RegistryEntry) -> Result<()>;
}

/// In-memory registry for tests and first-run defaults.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    entries: HashMap<u8, RegistryEntry>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeviceRegistry for MemoryRegistry {
    fn get(&self, class: DeviceClass) -> Option<RegistryEntry> {
        self.entries.get(&class.registry_slot()).cloned()
    }

    fn set(&mut self, class: DeviceClass, entry: &RegistryEntry) -> Result<()> {
        self.entries.insert(class.registry_slot(), entry.clone());
        Ok(())
    }
}

/// Source of candidate serial port names.
pub trait PortEnumerator {
    fn ports(&self) -> Vec<String>;
}

/// Fixed port list (tests, manual configuration).
#[derive(Debug, Clone)]
pub struct StaticPorts(pub Vec<String>);

impl PortEnumerator for StaticPorts {
    fn ports(&self) -> Vec<String> {
        self.0.clone()
    }
}

/// The OS port list via the serial backend.
#[cfg(feature = "serial")]
#[derive(Debug, Default)]
pub struct SystemPorts;

#[cfg(feature = "serial")]
impl PortEnumerator for SystemPorts {
    fn ports(&self) -> Vec<String> {
        match serialport::available_ports() {
            Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
            Err(e) => {
                log::warn!("enumerating serial ports failed: {}", e);
                Vec::new()
            }
        }
    }
}

/// One class-specific prober; opens its own transport per attempt and
/// closes it before returning.
pub trait DeviceProber {
    fn class(&self) -> DeviceClass;

    /// Model name persisted into the registry on success.
    fn model(&self) -> String;

    fn probe(&mut self, port: &str) -> Result<DeviceIdentity>;
}

/// Outcome of one class search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub class: DeviceClass,
    pub found: bool,
    pub port: Option<String>,
    pub identity: Option<DeviceIdentity>,
}

/// Walks device classes over the shrinking candidate pool.
pub struct SearchCoordinator {
    probers: Vec<Box<dyn DeviceProber>>,
    modem_wait_ms: u64,
}

impl SearchCoordinator {
    /// Probers run in the order given; the conventional order is
    /// validator, coin acceptor, watchdog, modem (the modem last because
    /// of its power-up wait).
    pub fn new(probers: Vec<Box<dyn DeviceProber>>) -> Self {
        Self {
            probers,
            modem_wait_ms: constants::MODEM_POWER_UP_WAIT_MS,
        }
    }

    /// Override the modem power-up wait (zero for tests).
    pub fn with_modem_wait(mut self, wait_ms: u64) -> Self {
        self.modem_wait_ms = wait_ms;
        self
    }

    /// Run the full search. Every class gets a registry write: the bound
    /// port on success, a cleared `present` flag on failure.
    pub fn run(
        &mut self,
        ports: &dyn PortEnumerator,
        registry: &mut dyn DeviceRegistry,
    ) -> Vec<SearchOutcome> {
        let mut candidates = ports.ports();
        let mut outcomes = Vec::with_capacity(self.probers.len());

        for prober in &mut self.probers {
            let class = prober.class();

            if class == DeviceClass::Modem && self.modem_wait_ms > 0 {
                // Give the modem time to finish powering up before the
                // first AT command; answering too early wedges some units.
                std::thread::sleep(std::time::Duration::from_millis(self.modem_wait_ms));
            }

            let order = probe_order(registry.get(class), &candidates);

            let mut bound: Option<(String, DeviceIdentity)> = None;
            for port in order {
                match prober.probe(&port) {
                    Ok(identity) => {
                        bound = Some((port, identity));
                        break;
                    }
                    Err(e) => {
                        log::debug!("{} not on {}: {}", class, port, e);
                    }
                }
            }

            let outcome = match bound {
                Some((port, identity)) => {
                    candidates.retain(|p| p != &port);
                    let entry = RegistryEntry {
                        name: prober.model(),
                        port: port.clone(),
                        comment: identity.part_number.clone(),
                        present: true,
                    };
                    if let Err(e) = registry.set(class, &entry) {
                        log::warn!("persisting {} failed: {}", class, e);
                    }
                    SearchOutcome {
                        class,
                        found: true,
                        port: Some(port),
                        identity: Some(identity),
                    }
                }
                None => {
                    let entry = RegistryEntry {
                        name: prober.model(),
                        port: String::new(),
                        comment: String::new(),
                        present: false,
                    };
                    if let Err(e) = registry.set(class, &entry) {
                        log::warn!("persisting {} failed: {}", class, e);
                    }
                    SearchOutcome {
                        class,
                        found: false,
                        port: None,
                        identity: None,
                    }
                }
            };
            outcomes.push(outcome);
        }

        outcomes
    }
}

/// Registered port first (when still unclaimed), then the remaining
/// candidates in enumeration order.
fn probe_order(registered: Option<RegistryEntry>, candidates: &[String]) -> Vec<String> {
    let mut order = Vec::with_capacity(candidates.len());
    if let Some(entry) = registered {
        if !entry.port.is_empty() && candidates.contains(&entry.port) {
            order.push(entry.port);
        }
    }
    for port in candidates {
        if !order.contains(port) {
            order.push(port.clone());
        }
    }
    order
}
