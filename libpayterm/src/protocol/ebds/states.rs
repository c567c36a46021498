// libpayterm/src/protocol/ebds/states.rs

//! EBDS poll interpretation: one bit per state across four status bytes,
//! plus the extended note-value block.

use crate::polling::state::{FaultCode, JamLocation, PollState, RejectReason};
use crate::types::Nominal;

/// Status byte 0 bits.
pub mod status0 {
    pub const IDLING: u8 = 0;
    pub const ACCEPTING: u8 = 1;
    pub const ESCROWED: u8 = 2;
    pub const STACKING: u8 = 3;
    pub const STACKED: u8 = 4;
    pub const RETURNING: u8 = 5;
    pub const RETURNED: u8 = 6;
}

/// Status byte 1 bits.
pub mod status1 {
    pub const CHEATED: u8 = 0;
    pub const REJECTED: u8 = 1;
    pub const JAMMED: u8 = 2;
    pub const CASSETTE_FULL: u8 = 3;
    pub const LRC_PRESENT: u8 = 4;
    pub const PAUSED: u8 = 5;
    pub const CALIBRATION: u8 = 6;
}

/// Status byte 2 bits.
pub mod status2 {
    pub const POWER_UP: u8 = 0;
    pub const INVALID_COMMAND: u8 = 1;
    pub const FAILURE: u8 = 2;
}

/// Status byte 3 bits.
pub mod status3 {
    pub const NO_PUSH_MODE: u8 = 0;
    pub const FLASH_DOWNLOAD: u8 = 1;
    pub const PRE_STACK: u8 = 2;
}

/// Test bit `n` of `byte`.
pub fn bit(byte: u8, n: u8) -> bool {
    n < 8 && byte & (1 << n) != 0
}

/// Which notes count: currency prefix plus a sane value range, fixed at
/// configuration time.
#[derive(Debug, Clone)]
pub struct NoteFilter {
    pub currency_prefix: String,
    pub min: u32,
    pub max: u32,
}

impl NoteFilter {
    pub fn new(currency_prefix: &str, min: u32, max: u32) -> Self {
        Self {
            currency_prefix: currency_prefix.to_string(),
            min,
            max,
        }
    }

    /// The Uzbek so'm set the EBDS heads ship with.
    pub fn uzbek() -> Self {
        Self::new("UZ", 1000, 200_000)
    }

    pub fn accepts(&self, currency: &str, value: u32) -> bool {
        value >= self.min
            && value <= self.max
            && currency
                .to_ascii_uppercase()
                .starts_with(&self.currency_prefix.to_ascii_uppercase())
    }
}

/// Extract (currency, value) from the extended note block: three ASCII
/// currency characters at offset 7, three ASCII value digits at offset
/// 10, three ASCII exponent digits at offset 13.
pub fn parse_note_value(data: &[u8]) -> Option<(String, u32)> {
    if data.len() < 16 {
        return None;
    }
    let currency = String::from_utf8_lossy(&data[7..10]).to_string();
    let base: u32 = String::from_utf8_lossy(&data[10..13])
        .trim()
        .parse()
        .ok()?;
    let exponent: u32 = String::from_utf8_lossy(&data[13..16])
        .trim()
        .parse()
        .ok()?;
    Some((currency, base.checked_mul(10u32.checked_pow(exponent)?)?))
}

fn note_value(data: &[u8], filter: &NoteFilter) -> Nominal {
    match parse_note_value(data) {
        Some((currency, value)) if filter.accepts(&currency, value) => Nominal::new(value),
        _ => Nominal::ZERO,
    }
}

/// Interpret one unwrapped poll answer.
///
/// Bit priority follows the device manual: the note-movement bits of
/// byte 0 first, then the exception bits of bytes 1..3. The escrow and
/// stacked states resolve the note value through `filter`; a value
/// outside the filter reads as zero (unrecognized).
pub fn decode_poll(data: &[u8], filter: &NoteFilter) -> PollState {
    let Some(&byte0) = data.first() else {
        return PollState::Unknown(0);
    };
    let byte1 = data.get(1).copied().unwrap_or(0);
    let byte2 = data.get(2).copied().unwrap_or(0);
    let byte3 = data.get(3).copied().unwrap_or(0);

    if bit(byte0, status0::ESCROWED) {
        return PollState::Escrow(note_value(data, filter));
    }
    if bit(byte0, status0::STACKED) {
        return PollState::Stacked(note_value(data, filter));
    }
    if byte0 == 1 << status0::IDLING {
        // Idle answers double as the cassette-presence report.
        return if bit(byte1, status1::LRC_PRESENT) {
            PollState::Idling
        } else {
            PollState::CassetteOpen
        };
    }
    if bit(byte0, status0::ACCEPTING) {
        return PollState::Accepting;
    }
    if bit(byte0, status0::STACKING) {
        return PollState::Stacking;
    }
    if bit(byte0, status0::RETURNING) {
        return PollState::Returning;
    }
    if bit(byte0, status0::RETURNED) {
        return PollState::Returned;
    }

    if bit(byte1, status1::CHEATED) {
        return PollState::Cheated;
    }
    if bit(byte1, status1::REJECTED) {
        return PollState::Rejecting(RejectReason::Other(0));
    }
    if bit(byte1, status1::JAMMED) {
        return PollState::Jammed(JamLocation::Validator);
    }
    if bit(byte1, status1::CASSETTE_FULL) {
        return PollState::CassetteFull;
    }
    if bit(byte1, status1::PAUSED) {
        return PollState::Pause;
    }
    if bit(byte1, status1::CALIBRATION) {
        return PollState::Calibration;
    }

    if bit(byte2, status2::POWER_UP) {
        return PollState::PowerUp;
    }
    if bit(byte2, status2::INVALID_COMMAND) {
        return PollState::InvalidCommand;
    }
    if bit(byte2, status2::FAILURE) {
        return PollState::Error(FaultCode::Generic);
    }

    if bit(byte3, status3::NO_PUSH_MODE) {
        return PollState::NoPushMode;
    }
    if bit(byte3, status3::FLASH_DOWNLOAD) {
        return PollState::FlashDownload;
    }
    if bit(byte3, status3::PRE_STACK) {
        return PollState::PreStack;
    }

    PollState::Unknown(byte0)
}
