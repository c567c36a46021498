// libpayterm/src/polling/events.rs

//! Typed events published by the device sessions.
//!
//! Device threads never call back into the orchestrator; everything
//! crosses thread boundaries through a queued channel. A disconnected
//! receiver downgrades sends to a logged warning so a device thread can
//! never panic because the consumer went away.

use std::sync::mpsc::{Receiver, Sender, channel};

use crate::polling::state::{AcceptorFault, FaultCode, JamLocation, PollState, RejectReason};
use crate::types::Nominal;

/// Condensed device condition carried by `StatusChanged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    Ok,
    Rejected(RejectReason),
    Jammed(JamLocation),
    CassetteFull,
    CassetteOpen,
    Fault(FaultCode),
    /// Coin acceptor sorter/error report.
    CoinFault(AcceptorFault),
    Cheated,
    Paused,
    Calibration,
    /// The port died or the device stopped answering; the session is
    /// torn down and must be re-probed.
    Unavailable,
}

/// Firmware-update lifecycle reported during the exclusive update mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirmwareState {
    Started,
    Success,
    Cancelled,
    Failed,
}

/// Events emitted by a device session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// A note/coin was physically committed; emitted exactly once per
    /// credit that passes the duplicate filter.
    NominalAccepted(Nominal),
    /// A credit suppressed by the duplicate heuristic.
    NominalDuplicate(Nominal),
    /// An escrowed note was sent back (DB error or max-sum policy).
    NominalReturned(Nominal),
    StatusChanged {
        status: DeviceStatus,
        comment: String,
    },
    FirmwareProgress {
        percent: u8,
    },
    FirmwareResult(FirmwareState),
}

/// Sender half handed to a device session.
#[derive(Debug, Clone)]
pub struct EventChannel {
    tx: Sender<DeviceEvent>,
}

impl EventChannel {
    pub fn send(&self, event: DeviceEvent) {
        if self.tx.send(event).is_err() {
            log::warn!("event receiver disconnected; dropping device event");
        }
    }

    pub fn status(&self, status: DeviceStatus, comment: &str) {
        self.send(DeviceEvent::StatusChanged {
            status,
            comment: comment.to_string(),
        });
    }
}

/// Create the event channel pair for one device session.
pub fn event_channel() -> (EventChannel, Receiver<DeviceEvent>) {
    let (tx, rx) = channel();
    (EventChannel { tx }, rx)
}

/// Derive the condensed status (and its log comment) for a poll state.
/// Movement states map to `Ok`; the exceptional states carry their
/// reason. `None` means "nothing worth reporting".
pub fn status_of(state: &PollState) -> Option<(DeviceStatus, &'static str)> {
    match state {
        PollState::Idling
        | PollState::Accepting
        | PollState::Stacking
        | PollState::Returning
        | PollState::Returned
        | PollState::Holding
        | PollState::Disabled
        | PollState::Initialize
        | PollState::PowerUp => Some((DeviceStatus::Ok, "ok")),
        PollState::Rejecting(reason) => Some((DeviceStatus::Rejected(*reason), reason.describe())),
        PollState::Jammed(location) => Some((DeviceStatus::Jammed(*location), location.describe())),
        PollState::CassetteFull => Some((DeviceStatus::CassetteFull, "cassette full, collect cash")),
        PollState::CassetteOpen => Some((DeviceStatus::CassetteOpen, "cassette open or removed")),
        PollState::Cheated => Some((DeviceStatus::Cheated, "cheat attempt detected")),
        PollState::Pause => Some((DeviceStatus::Paused, "second note inserted too early")),
        PollState::Calibration => Some((DeviceStatus::Calibration, "calibration in progress")),
        PollState::CoinFault(fault) => Some((DeviceStatus::CoinFault(*fault), fault.describe())),
        PollState::Error(code) => Some((DeviceStatus::Fault(*code), code.describe())),
        _ => None,
    }
}
