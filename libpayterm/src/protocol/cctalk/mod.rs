// libpayterm/src/protocol/cctalk/mod.rs

//! ccTalk framing for the coin acceptor.
//!
//! Wire format: `[dest][len][src][header][data...][crc8]` where `len` is
//! the data length and CRC8 is the two's complement of the sum of all
//! preceding bytes. The host is address 1, the coin acceptor address 2.
//! NAK (0x05) and BUSY (0x06) arrive as bare single-byte answers and are
//! transport-level conditions, not protocol errors.

pub mod commands;
pub mod events;
pub mod table;

pub use commands::Command;
pub use events::{CoinEvent, decode_credit_poll};
pub use table::{CoinTable, CoinValueMap};

use crate::types::LineSettings;
use crate::{Error, Result, protocol::parser};

/// Host (controller) ccTalk address.
pub const HOST_ADDRESS: u8 = 0x01;

/// Coin acceptor ccTalk address.
pub const ACCEPTOR_ADDRESS: u8 = 0x02;

/// Bare negative acknowledge.
pub const NAK: u8 = 0x05;

/// Bare busy marker.
pub const BUSY: u8 = 0x06;

/// dest + len + src + header + crc
pub const MIN_FRAME_LEN: usize = 5;

/// Maximum NAK/BUSY repeats before the exchange gives up.
pub const MAX_NAK_RETRIES: usize = 3;

/// Pause before repeating a command after NAK/BUSY, [ms].
pub const NAK_RETRY_PAUSE_MS: u64 = 1000;

/// Default window for collecting one answer, [ms].
pub const READ_TIMEOUT_MS: u64 = 500;

/// Fixed line parameters for ccTalk coin acceptors.
pub const LINE: LineSettings = LineSettings::eight_n_one(9600);

/// CRC8 = two's complement of the byte sum.
pub fn crc8(data: &[u8]) -> u8 {
    let sum = data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    0u8.wrapping_sub(sum)
}

/// One decoded ccTalk answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub destination: u8,
    pub source: u8,
    pub header: u8,
    pub data: Vec<u8>,
}

impl Frame {
    /// Encode a request to the coin acceptor.
    pub fn encode_request(command: u8, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(MIN_FRAME_LEN + data.len());
        out.push(ACCEPTOR_ADDRESS);
        out.push(data.len() as u8);
        out.push(HOST_ADDRESS);
        out.push(command);
        out.extend_from_slice(data);
        out.push(crc8(&out));
        out
    }

    /// Decode and validate an answer addressed to the host.
    pub fn decode_response(raw: &[u8]) -> Result<Frame> {
        parser::ensure_len(raw, MIN_FRAME_LEN)?;

        let destination = raw[0];
        if destination != HOST_ADDRESS {
            return Err(Error::AddressMismatch {
                expected: HOST_ADDRESS,
                actual: destination,
            });
        }

        let declared = raw[1] as usize;
        let actual = raw.len() - MIN_FRAME_LEN;
        if declared != actual {
            return Err(Error::InvalidLength {
                expected: declared,
                actual,
            });
        }

        // Replies carry header 0; a framed NAK keeps its marker there.
        let header = raw[3];
        if header != 0 && header != NAK {
            return Err(Error::FrameFormat(format!(
                "cctalk: unexpected reply header {:#04x}",
                header
            )));
        }

        let expected = crc8(&raw[..raw.len() - 1]);
        let actual_crc = raw[raw.len() - 1];
        if expected != actual_crc {
            return Err(Error::ChecksumMismatch {
                expected: expected as u16,
                actual: actual_crc as u16,
            });
        }

        Ok(Frame {
            destination,
            source: raw[2],
            header,
            data: raw[4..raw.len() - 1].to_vec(),
        })
    }
}

/// Bare one-byte NAK answer.
pub fn is_nak(raw: &[u8]) -> bool {
    raw.len() == 1 && raw[0] == NAK
}

/// Bare one-byte BUSY answer.
pub fn is_busy(raw: &[u8]) -> bool {
    raw.len() == 1 && raw[0] == BUSY
}

/// True when the buffer holds a complete answer: either a bare NAK/BUSY
/// byte or a frame whose declared length is fully present.
pub fn answer_complete(buffer: &[u8]) -> bool {
    if is_nak(buffer) || is_busy(buffer) {
        return true;
    }
    if buffer.len() < 2 {
        return false;
    }
    buffer.len() >= buffer[1] as usize + MIN_FRAME_LEN
}

/// The simple-poll identity signature: an empty ACK frame from the
/// acceptor starts `01 00 02`.
pub fn is_identity_ack(raw: &[u8]) -> bool {
    raw.len() >= 3 && raw[0] == 0x01 && raw[1] == 0x00 && raw[2] == 0x02
}
