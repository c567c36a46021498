// libpayterm/src/error.rs

use thiserror::Error;

/// Crate-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("device not found")]
    DeviceNotFound,

    /// The OS port could not be opened or configured. Fatal to the
    /// session that owns it; never retried inside the core.
    #[error("port not available: {0}")]
    PortNotAvailable(String),

    // serialport 実装を後から有効化できるように optional dependency にしている
    #[cfg(feature = "serial")]
    #[error("serial error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid frame length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("checksum mismatch: expected {expected:#06x}, got {actual:#06x}")]
    ChecksumMismatch { expected: u16, actual: u16 },

    #[error("frame format error: {0}")]
    FrameFormat(String),

    #[error("wrong destination address: expected {expected:#04x}, got {actual:#04x}")]
    AddressMismatch { expected: u8, actual: u8 },

    #[error("ACK bit mismatch: request {request:#04x}, response {response:#04x}")]
    AckMismatch { request: u8, response: u8 },

    #[error("unexpected response code: expected {expected:#04x}, got {actual:#04x}")]
    UnexpectedResponse { expected: u8, actual: u8 },

    #[error("empty answer from device")]
    NoAnswer,

    #[error("operation timed out")]
    Timeout,

    #[error("NAK/BUSY retries exhausted after {attempts} attempts")]
    RetriesExhausted { attempts: usize },

    #[error("modem terminal response: {0}")]
    ModemTerminal(String),

    #[error("firmware image rejected: {0}")]
    FirmwareFormat(String),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
}

impl Error {
    /// Port-class errors tear the owning session down; never retried at
    /// this layer. Everything else may be retried at the next poll cycle.
    pub fn is_port_error(&self) -> bool {
        match self {
            Error::PortNotAvailable(_) | Error::Io(_) => true,
            #[cfg(feature = "serial")]
            Error::Serial(_) => true,
            _ => false,
        }
    }

    /// Checksum/format/length class errors; retried a bounded number of
    /// times within one exchange before surfacing.
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidLength { .. }
                | Error::ChecksumMismatch { .. }
                | Error::FrameFormat(_)
                | Error::AddressMismatch { .. }
                | Error::AckMismatch { .. }
                | Error::UnexpectedResponse { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
