// libpayterm/src/prelude.rs

pub use crate::device::{
    AcceptorConfig, AcceptorSession, ModemConfig, ModemInfo, ModemSession, SessionTiming,
    ValidatorConfig, ValidatorProtocol, ValidatorSession, WatchdogSession,
};
pub use crate::discovery::{
    DeviceProber, DeviceRegistry, MemoryRegistry, PortEnumerator, RegistryEntry,
    SearchCoordinator, SearchOutcome, StaticPorts,
};
pub use crate::polling::{
    DeviceEvent, DeviceStatus, DuplicateFilter, EventChannel, FirmwareState, PollDevice,
    PollHandle, PollState, PollTiming, PollingEngine, SessionLimits, event_channel, spawn,
};
pub use crate::transport::{MockTransport, Transport};
pub use crate::{DeviceClass, DeviceIdentity, Error, LineSettings, Nominal, Result};

// Re-export small utilities for convenience
pub use crate::utils::{bytes_to_hex, bytes_to_hex_spaced, default_read_timeout, ms, parse_hex};
