// libpayterm/src/polling/mod.rs

pub mod duplicate;
pub mod engine;
pub mod events;
pub mod limits;
pub mod state;
pub mod worker;

pub use duplicate::{DuplicateFilter, NominalClass};
pub use engine::{PollDevice, PollTiming, PollingEngine};
pub use events::{DeviceEvent, DeviceStatus, EventChannel, FirmwareState, event_channel};
pub use limits::SessionLimits;
pub use state::{AcceptorFault, FaultCode, JamLocation, PollState, RejectReason};
pub use worker::{PollHandle, spawn};
