// libpayterm/src/protocol/watchdog.rs

//! Fixed-header protocol for the OSMP watchdog timer.
//!
//! Every command is the four bytes `"OSP"` + command id. Only the
//! identification (and PC reboot) commands answer; identity is accepted
//! when the reply carries the `WDT`/`v1` signature.

use crate::types::LineSettings;

/// Command prefix.
pub const PREFIX: [u8; 3] = *b"OSP";

/// Fixed line parameters: 9600 8N1.
pub const LINE: LineSettings = LineSettings::eight_n_one(9600);

/// Window for the identification reply, [ms].
pub const REPLY_TIMEOUT_MS: u64 = 300;

/// Device name fragment expected in the identification reply.
pub const IDENTITY_SIGNATURE: &str = "WDT";

/// Firmware line expected in the identification reply.
pub const IDENTITY_VERSION: &str = "v1";

/// Watchdog command set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Identify,
    ResetModem,
    StartTimer,
    StopTimer,
    Ping,
    RebootPc,
}

impl Command {
    pub fn code(&self) -> u8 {
        match self {
            Self::Identify => 0x01,
            Self::ResetModem => 0x02,
            Self::StartTimer => 0x03,
            Self::StopTimer => 0x04,
            Self::Ping => 0x05,
            Self::RebootPc => 0xAE,
        }
    }

    /// Whether the device answers this command at all.
    pub fn expects_reply(&self) -> bool {
        matches!(self, Self::Identify | Self::RebootPc)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = PREFIX.to_vec();
        out.push(self.code());
        out
    }
}

/// Check an identification reply for the device signature.
pub fn is_identity_reply(raw: &[u8]) -> bool {
    let text = String::from_utf8_lossy(raw);
    text.contains(IDENTITY_SIGNATURE) && text.contains(IDENTITY_VERSION)
}
