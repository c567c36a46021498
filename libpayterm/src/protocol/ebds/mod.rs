// libpayterm/src/protocol/ebds/mod.rs

//! EBDS framing for MEI-style bill validators.
//!
//! Wire format: `[PREFIX=0x02][length][msgtype|ack][data...][POSTFIX=0x03]
//! [crc]` where `length` counts the whole frame, the CRC is the XOR of
//! every byte from the length through the postfix, and the low nibble of
//! the message-type byte carries an alternating ACK bit that must match
//! between request and response. An extended marker (0x70) at the front of
//! the unwrapped data means one extra sub-type byte to strip.

pub mod states;

pub use states::{NoteFilter, decode_poll, parse_note_value};

use crate::types::{DataBits, FlowControl, LineSettings, Parity, StopBits};
use crate::{Error, Result, protocol::parser};

/// Frame prefix.
pub const PREFIX: u8 = 0x02;

/// Frame postfix (before the CRC byte).
pub const POSTFIX: u8 = 0x03;

/// Mask of the alternating ACK bit inside the message-type byte.
pub const ACK_MASK: u8 = 0x0F;

/// Extended message-set marker.
pub const EXTENDED: u8 = 0x70;

/// prefix + len + msgtype + postfix + crc
pub const MIN_FRAME_LEN: usize = 5;

/// Window for collecting one answer, [ms].
pub const ANSWER_TIMEOUT_MS: u64 = 500;

/// Fixed line parameters: 9600 7E1.
pub const LINE: LineSettings = LineSettings::new(
    9600,
    DataBits::Seven,
    Parity::Even,
    StopBits::One,
    FlowControl::None,
);

/// Standard host-to-acceptor message type.
pub const MSG_HOST_TO_VALIDATOR: u8 = 0x10;

/// Control message type (reset, type/serial queries).
pub const MSG_CONTROL: u8 = 0x60;

/// Poll byte 1: accept any orientation, escrow enabled.
pub const ORIENTATION: u8 = 0x0C;
pub const ESCROW_ENABLE: u8 = 0x10;
pub const BYTE1: u8 = ORIENTATION | ESCROW_ENABLE;

/// Poll byte 2: extended note reporting, push mode.
pub const BYTE2: u8 = 0x10;

/// Action bits OR-ed into poll byte 1.
pub const STACK: u8 = 0x20;
pub const RETURN: u8 = 0x40;

/// Control command bodies.
pub const RESET: [u8; 4] = [0x60, 0x7F, 0x7F, 0x7F];
pub const GET_TYPE: [u8; 4] = [0x60, 0x00, 0x00, 0x04];
pub const GET_SERIAL_NUMBER: [u8; 4] = [0x60, 0x00, 0x00, 0x05];
pub const GET_VARIANT_NAME: [u8; 4] = [0x60, 0x00, 0x00, 0x08];
pub const GET_VARIANT_VERSION: [u8; 4] = [0x60, 0x00, 0x00, 0x09];

/// XOR checksum over bytes 1..end of the unterminated frame (length
/// through postfix).
pub fn xor_crc(frame_without_crc: &[u8]) -> u8 {
    frame_without_crc[1..]
        .iter()
        .fold(0u8, |acc, &b| acc ^ b)
}

/// Build a poll body: message type, enable mask, action bits.
pub fn poll_body(enabled: bool, action: u8) -> Vec<u8> {
    vec![
        MSG_HOST_TO_VALIDATOR,
        if enabled { 0x7F } else { 0x00 },
        BYTE1 | action,
        BYTE2,
    ]
}

/// Stateless framing; the session owns the alternating ACK bit.
pub fn encode(command_data: &[u8], ack: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(command_data.len() + MIN_FRAME_LEN - 1);
    out.push(PREFIX);
    out.push((4 + command_data.len()) as u8);
    out.push(command_data[0] | u8::from(ack));
    out.extend_from_slice(&command_data[1..]);
    out.push(POSTFIX);
    let crc = xor_crc(&out);
    out.push(crc);
    out
}

/// Validate a response against the request it answers and unwrap the data
/// section (framing stripped, ACK masked off, message-type byte(s)
/// removed).
pub fn decode(request: &[u8], response: &[u8]) -> Result<Vec<u8>> {
    parser::ensure_len(response, MIN_FRAME_LEN)?;

    if response[0] != PREFIX {
        return Err(Error::FrameFormat(format!(
            "ebds: invalid prefix {:#04x}",
            response[0]
        )));
    }
    if response[response.len() - 2] != POSTFIX {
        return Err(Error::FrameFormat(format!(
            "ebds: invalid postfix {:#04x}",
            response[response.len() - 2]
        )));
    }

    let declared = response[1] as usize;
    if declared != response.len() {
        return Err(Error::InvalidLength {
            expected: declared,
            actual: response.len(),
        });
    }

    let expected = xor_crc(&response[..response.len() - 1]);
    let actual = response[response.len() - 1];
    if expected != actual {
        return Err(Error::ChecksumMismatch {
            expected: expected as u16,
            actual: actual as u16,
        });
    }

    let request_ack = parser::byte_at(request, 2)? & ACK_MASK;
    let response_ack = response[2] & ACK_MASK;
    if request_ack != response_ack {
        return Err(Error::AckMismatch {
            request: request_ack,
            response: response_ack,
        });
    }

    // Strip [prefix, len] head and [postfix, crc] tail, mask the ACK.
    let mut data = response[2..response.len() - 2].to_vec();
    data[0] &= !ACK_MASK;

    // Drop the message-type byte; extended answers carry a sub-type too.
    let skip = if data.first() == Some(&EXTENDED) { 2 } else { 1 };
    if data.len() < skip {
        return Err(Error::InvalidLength {
            expected: skip,
            actual: data.len(),
        });
    }
    Ok(data[skip..].to_vec())
}

/// True when the buffer holds a complete frame per its length byte.
pub fn answer_complete(buffer: &[u8]) -> bool {
    if buffer.len() < 2 {
        return false;
    }
    let declared = buffer[1] as usize;
    declared >= MIN_FRAME_LEN && buffer.len() >= declared
}
