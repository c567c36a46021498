// libpayterm/src/protocol/ccnet/states.rs

//! CCNET poll interpretation and identification parsing.

use crate::polling::state::{FaultCode, JamLocation, PollState, RejectReason};
use crate::types::Nominal;
use crate::{Result, protocol::parser};

/// Generic states.
pub mod state {
    pub const POWER_UP: u8 = 0x10;
    pub const POWER_UP_IN_VALIDATOR: u8 = 0x11;
    pub const POWER_UP_IN_STACKER: u8 = 0x12;
    pub const INITIALIZE: u8 = 0x13;
    pub const IDLING: u8 = 0x14;
    pub const ACCEPTING: u8 = 0x15;
    pub const STACKING: u8 = 0x17;
    pub const RETURNING: u8 = 0x18;
    pub const DISABLED: u8 = 0x19;
    pub const HOLDING: u8 = 0x1A;
    pub const DEVICE_BUSY: u8 = 0x1B;
    pub const REJECTING: u8 = 0x1C;
    pub const ESCROW: u8 = 0x80;
    pub const STACKED: u8 = 0x81;
    pub const RETURNED: u8 = 0x82;
}

/// Error states carrying a second reason byte where noted.
pub mod error {
    pub const STACKER_FULL: u8 = 0x41;
    pub const BAD_STACKER_POSITION: u8 = 0x42;
    pub const VALIDATOR_JAMMED: u8 = 0x43;
    pub const STACKER_JAMMED: u8 = 0x44;
    pub const CHEATED: u8 = 0x45;
    pub const PAUSE: u8 = 0x46;
    pub const FAILURE: u8 = 0x47;
    pub const BILL_JAMMED: u8 = 0x48;
}

fn reject_reason(code: u8) -> RejectReason {
    match code {
        0x60 => RejectReason::Insertion,
        0x61 => RejectReason::Dielectric,
        0x62 => RejectReason::PreviousBillInHead,
        0x63 => RejectReason::Compensation,
        0x64 => RejectReason::BillTransport,
        0x65 => RejectReason::Identification,
        0x66 => RejectReason::Verification,
        0x67 => RejectReason::Optical,
        0x68 => RejectReason::Inhibit,
        0x69 => RejectReason::Capacitance,
        0x6A => RejectReason::Operation,
        0x6C => RejectReason::Length,
        0x6D => RejectReason::Uv,
        0x92 => RejectReason::Unrecognised,
        0x93 => RejectReason::IncorrectBarcode,
        0x94 => RejectReason::UnknownBarcode,
        0x95 => RejectReason::CorruptedTrailingData,
        other => RejectReason::Other(other),
    }
}

fn fault_code(code: u8) -> FaultCode {
    match code {
        0x50 => FaultCode::StackerMotor,
        0x51 => FaultCode::TransportMotorSpeed,
        0x52 => FaultCode::TransportMotor,
        0x53 => FaultCode::AligningMotor,
        0x54 => FaultCode::InitialCassetteStatus,
        0x55 => FaultCode::Optical,
        0x56 => FaultCode::Inductive,
        0x57 => FaultCode::Cassette1Motor,
        0x58 => FaultCode::Cassette2Motor,
        0x59 => FaultCode::Cassette3Motor,
        0x5A => FaultCode::BillToBillTransport,
        0x5B => FaultCode::SwitchMotor1,
        0x5C => FaultCode::SwitchMotor2,
        0x5D => FaultCode::DispenserMotor1,
        0x5E => FaultCode::DispenserMotor2,
        0x5F => FaultCode::Capacitance,
        other => FaultCode::Other(other),
    }
}

fn jam_location(code: u8) -> JamLocation {
    match code {
        0x70 => JamLocation::Cassette1,
        0x71 => JamLocation::Cassette2,
        0x72 => JamLocation::Cassette3,
        0x73 => JamLocation::TransportPath,
        0x74 => JamLocation::Switch,
        _ => JamLocation::Dispenser,
    }
}

/// Bill type (0..=23) to face value mapping, fixed by the firmware's
/// currency set and configured once at startup.
#[derive(Debug, Clone)]
pub struct BillTable {
    values: [u32; 24],
}

impl BillTable {
    pub fn new(values: [u32; 24]) -> Self {
        Self { values }
    }

    /// The Tajik somoni set the terminals ship with.
    pub fn tajik() -> Self {
        let mut values = [0u32; 24];
        values[..9].copy_from_slice(&[1, 3, 5, 10, 20, 50, 100, 200, 500]);
        Self::new(values)
    }

    /// Unknown index resolves to zero: unrecognized, never stacked as a
    /// positive event.
    pub fn value(&self, bill_type: u8) -> Nominal {
        Nominal::new(
            self.values
                .get(bill_type as usize)
                .copied()
                .unwrap_or(0),
        )
    }
}

/// Interpret one poll answer's data section.
pub fn decode_poll(data: &[u8], bills: &BillTable) -> PollState {
    let Some(&code) = data.first() else {
        return PollState::Unknown(0);
    };
    let param = data.get(1).copied().unwrap_or(0);

    match code {
        state::POWER_UP | state::POWER_UP_IN_VALIDATOR | state::POWER_UP_IN_STACKER => {
            PollState::PowerUp
        }
        state::INITIALIZE => PollState::Initialize,
        state::IDLING => PollState::Idling,
        state::ACCEPTING => PollState::Accepting,
        state::STACKING => PollState::Stacking,
        state::RETURNING => PollState::Returning,
        state::DISABLED => PollState::Disabled,
        state::HOLDING => PollState::Holding,
        state::DEVICE_BUSY => PollState::Busy(param),
        state::REJECTING => PollState::Rejecting(reject_reason(param)),
        state::ESCROW => PollState::Escrow(bills.value(param)),
        state::STACKED => PollState::Stacked(bills.value(param)),
        state::RETURNED => PollState::Returned,
        error::STACKER_FULL => PollState::CassetteFull,
        error::BAD_STACKER_POSITION => PollState::CassetteOpen,
        error::VALIDATOR_JAMMED => PollState::Jammed(JamLocation::Validator),
        error::STACKER_JAMMED => PollState::Jammed(JamLocation::Cassette),
        error::CHEATED => PollState::Cheated,
        error::PAUSE => PollState::Pause,
        error::FAILURE => PollState::Error(fault_code(param)),
        error::BILL_JAMMED => PollState::Jammed(jam_location(param)),
        other => PollState::Unknown(other),
    }
}

/// Parse an identification answer into (part number, serial number).
///
/// Part number is 15 ASCII bytes, serial the following 12. "C100" heads
/// splice the serial into the part number, as the vendor tooling expects.
pub fn parse_identification(data: &[u8]) -> Result<(String, String)> {
    let part = parser::ascii_at(data, 0, 15)?;
    let serial = parser::ascii_at(data, 15, 12)?;

    let part = if part.starts_with("C100") {
        let head: String = part.chars().take(5).collect();
        format!("{}{}", head, serial)
    } else {
        part
    };

    Ok((part, serial))
}
