// libpayterm/src/protocol/at/mod.rs

//! AT command protocol for the GSM modem.
//!
//! Requests are ASCII command strings terminated by CR. Answers are the
//! bytes between the first and last CRLF pair, classified against the
//! fixed set of terminal result strings. USSD replies need additional
//! decoding (`gsm` module) because carriers disagree about encodings.

pub mod gsm;

use crate::types::{DataBits, FlowControl, LineSettings, Parity, StopBits};
use crate::{Error, Result};

/// Command terminator.
pub const CR: u8 = 0x0D;
pub const LF: u8 = 0x0A;

/// SMS text terminator.
pub const CTRL_Z: u8 = 0x1A;

/// Minimum bytes a classifiable answer needs.
pub const MIN_ANSWER_LEN: usize = 4;

/// Fixed line parameters: 115200 8N1 with hardware flow control.
pub const LINE: LineSettings = LineSettings::new(
    115_200,
    DataBits::Eight,
    Parity::None,
    StopBits::One,
    FlowControl::Hardware,
);

/// Command strings.
pub const RESET_SETTINGS: &str = "ATZ";
pub const OFF_ECHO: &str = "ATE0";
pub const IS_PIN: &str = "AT+CPIN?";
pub const SIGNAL_QUALITY: &str = "AT+CSQ";
pub const IDENTIFICATION: &str = "ATI";
pub const MODEL: &str = "AT+GMM";
pub const GET_OPERATOR: &str = "AT+COPS?";
pub const RESTART: &str = "AT+CFUN=0,1";
pub const SMS_MODE: &str = "AT+CMGF=0";

/// USSD query wrapper.
pub fn ussd(request: &str) -> String {
    format!("AT+CUSD=1, \"{}\",15", request)
}

/// SMS submit header; `len` per `sms_length`.
pub fn sms_send(len: usize) -> String {
    format!("AT+CMGS={}", len)
}

/// Length parameter the CMGS header wants for a PDU-mode message.
pub fn sms_length(text: &str) -> usize {
    (((text.len() as f64) - 2.0) / 2.0).round() as usize
}

/// Append the CR terminator.
pub fn pack_command(command: &str) -> Vec<u8> {
    let mut out = command.as_bytes().to_vec();
    out.push(CR);
    out
}

/// Terminal result classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalResult {
    Ok,
    Connect,
    Busy,
    Ring,
    Error,
    NoAnswer,
    NoCarrier,
    NoDialtone,
    Unknown,
}

impl FinalResult {
    /// Classify an unwrapped answer. Match order follows the modem
    /// manual: OK first, then the CONNECT variants, then the failures.
    pub fn classify(text: &str) -> Self {
        if text.contains("OK") {
            Self::Ok
        } else if text.contains("CONNECT 600")
            || text.contains("CONNECT 1200")
            || text.contains("CONNECT 2400")
            || text.contains("CONNECT")
        {
            Self::Connect
        } else if text.contains("BUSY") {
            Self::Busy
        } else if text.contains("RING") {
            Self::Ring
        } else if text.contains("ERROR") {
            Self::Error
        } else if text.contains("NO ANSWER") {
            Self::NoAnswer
        } else if text.contains("NO CARRIER") {
            Self::NoCarrier
        } else if text.contains("NO DIALTONE") {
            Self::NoDialtone
        } else {
            Self::Unknown
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Connect => "CONNECT",
            Self::Busy => "BUSY",
            Self::Ring => "RING",
            Self::Error => "ERROR",
            Self::NoAnswer => "NO ANSWER",
            Self::NoCarrier => "NO CARRIER",
            Self::NoDialtone => "NO DIALTONE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Cut the answer between the first and the last CRLF pair. The modem may
/// echo the command before the first CRLF; that echo is dropped.
pub fn unwrap_response(raw: &[u8]) -> Result<String> {
    if raw.is_empty() {
        return Err(Error::NoAnswer);
    }

    let crlf = [CR, LF];
    let first = raw
        .windows(2)
        .position(|w| w == crlf)
        .ok_or_else(|| Error::FrameFormat("at: missing leading CRLF".into()))?;
    let last = raw
        .windows(2)
        .rposition(|w| w == crlf)
        .unwrap_or(first);
    if last == first {
        return Err(Error::FrameFormat("at: missing trailing CRLF".into()));
    }

    let inner = &raw[first + 2..last];
    Ok(String::from_utf8_lossy(inner).to_string())
}

/// Unwrap and require a successful terminal result.
pub fn unpack(raw: &[u8]) -> Result<String> {
    let text = unwrap_response(raw)?;
    match FinalResult::classify(&text) {
        FinalResult::Ok => Ok(text),
        other => Err(Error::ModemTerminal(other.name().to_string())),
    }
}

/// Extract the text between the first pair of double quotes (operator
/// name in a +COPS answer).
pub fn extract_quoted(text: &str) -> Option<&str> {
    let first = text.find('"')?;
    let rest = &text[first + 1..];
    let second = rest.find('"')?;
    Some(&rest[..second])
}

/// Extract the signal percentage from a +CSQ answer: the number between
/// the first space and the first comma, capped at 100.
pub fn extract_csq(text: &str) -> Option<u8> {
    let start = text.find(' ')?;
    let end = text.find(',')?;
    if end <= start + 1 {
        return None;
    }
    let value: f64 = text[start + 1..end].trim().parse().ok()?;
    Some(value.min(100.0) as u8)
}

/// Extract the quoted body of a `+CUSD: 0,"..."` envelope.
pub fn extract_cusd(text: &str) -> Option<&str> {
    let marker = "+CUSD: 0,\"";
    let start = text.find(marker)? + marker.len();
    let rest = &text[start..];
    let end = rest.find('"')?;
    Some(rest[..end].trim())
}
