// libpayterm/src/device/modem.rs

//! AT modem session: identification, signal quality, operator, USSD
//! balance/SIM-number queries, SMS send.
//!
//! USSD replies arrive in whatever encoding the carrier picked that day.
//! Extraction therefore runs a fallback chain: the configured regex over
//! the plain answer, then over the GSM 7-bit unpacked text, then over the
//! UCS-2 decoded text. If everything fails the field stays empty - no
//! crash, no partial garbage surfaced.

use regex::Regex;

use crate::device::SessionTiming;
use crate::protocol::at::{self, FinalResult, gsm};
use crate::trace::FrameTrace;
use crate::transport::Transport;
use crate::types::{DeviceIdentity, LineSettings};
use crate::{Error, Result};

/// Default balance pattern: an amount with two decimals, dot or comma,
/// optionally negative.
pub const BALANCE_REGEX: &str = "([0-9]{1,5}[.][0-9]{1,2}|[0-9]{1,5}[,][0-9]{1,2}|[-][0-9]{1,5}[.][0-9]{1,2}|[-][0-9]{1,5}[,][0-9]{1,2})";

/// Default SIM number pattern.
pub const SIM_NUMBER_REGEX: &str = "[0-9]{9,12}";

/// Immutable modem configuration; the USSD codes and patterns come from
/// the terminal settings.
#[derive(Debug, Clone)]
pub struct ModemConfig {
    pub balance_ussd: String,
    pub balance_regex: String,
    /// Offset the balance match may not start before (skips tariff noise
    /// at the head of some carrier answers).
    pub balance_match_from: usize,
    pub sim_number_ussd: String,
    pub sim_number_regex: String,
    pub timing: SessionTiming,
    /// Additional reads while a USSD answer trickles in.
    pub balance_repeats: usize,
    pub sim_number_repeats: usize,
    pub sms_repeats: usize,
    /// Pause between those reads, [ms].
    pub repeat_pause_ms: u64,
    /// Settle time after AT+CFUN restart, [ms].
    pub restart_settle_ms: u64,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            balance_ussd: "*100#".to_string(),
            balance_regex: BALANCE_REGEX.to_string(),
            balance_match_from: 0,
            sim_number_ussd: "*99#".to_string(),
            sim_number_regex: SIM_NUMBER_REGEX.to_string(),
            timing: SessionTiming::at_modem(),
            balance_repeats: 10,
            sim_number_repeats: 4,
            sms_repeats: 5,
            repeat_pause_ms: 300,
            restart_settle_ms: crate::constants::MODEM_RESTART_SETTLE_MS,
        }
    }
}

impl ModemConfig {
    /// Test configuration: no pauses, no settle times, single reads.
    pub fn fast() -> Self {
        Self {
            timing: SessionTiming::fast(),
            balance_repeats: 0,
            sim_number_repeats: 0,
            sms_repeats: 2,
            repeat_pause_ms: 0,
            restart_settle_ms: 0,
            ..Self::default()
        }
    }

    pub fn line(&self) -> LineSettings {
        at::LINE
    }
}

/// What the probe learned about the modem and its SIM.
#[derive(Debug, Clone, Default)]
pub struct ModemInfo {
    pub sim_present: bool,
    /// Signal quality in percent, as text.
    pub signal_quality: String,
    /// Modem model (AT+GMM).
    pub model: String,
    /// Network operator, empty without a SIM.
    pub operator: String,
}

impl ModemInfo {
    /// Registry comment line, `(model ( operator ))`.
    pub fn comment(&self) -> String {
        let operator = if self.operator.is_empty() {
            "( ---NO--- )".to_string()
        } else {
            format!("( {} )", self.operator)
        };
        if self.model.is_empty() {
            operator
        } else {
            format!("({} {})", self.model, operator)
        }
    }
}

/// An identified modem bound to its port.
pub struct ModemSession {
    transport: Box<dyn Transport>,
    config: ModemConfig,
    trace: FrameTrace,
    info: ModemInfo,
}

impl ModemSession {
    /// Probe: reset (two attempts), echo off, SIM check, signal quality,
    /// model, operator. Only the reset and echo-off must succeed; a
    /// missing SIM degrades the info instead of failing the probe.
    pub fn probe(transport: Box<dyn Transport>, config: ModemConfig) -> Result<(Self, ModemInfo)> {
        let mut session = Self {
            transport,
            config,
            trace: FrameTrace::new("MODEM"),
            info: ModemInfo::default(),
        };

        match session.identify() {
            Ok(info) => {
                session.info = info.clone();
                Ok((session, info))
            }
            Err(e) => {
                session.transport.close();
                if e.is_port_error() {
                    Err(e)
                } else {
                    Err(Error::DeviceNotFound)
                }
            }
        }
    }

    pub fn info(&self) -> &ModemInfo {
        &self.info
    }

    pub fn identity(&self) -> DeviceIdentity {
        DeviceIdentity::new("AT-Modem", self.info.model.clone(), String::new())
    }

    pub fn close(&mut self) {
        self.transport.close();
    }

    fn identify(&mut self) -> Result<ModemInfo> {
        let mut reset_ok = false;
        for _ in 0..2 {
            if self.command(at::RESET_SETTINGS, 0).is_ok() {
                reset_ok = true;
                break;
            }
        }
        if !reset_ok {
            return Err(Error::DeviceNotFound);
        }

        self.command(at::OFF_ECHO, 0)?;

        let mut info = ModemInfo {
            sim_present: self.command(at::IS_PIN, 0).is_ok(),
            ..ModemInfo::default()
        };

        if let Ok(text) = self.command(at::SIGNAL_QUALITY, 0) {
            if let Some(quality) = at::extract_csq(&text) {
                info.signal_quality = quality.to_string();
            }
        }

        if let Ok(text) = self.command(at::MODEL, 0) {
            // First line of the answer is the model string.
            info.model = text
                .lines()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("")
                .trim()
                .to_string();
        }

        if info.sim_present {
            if let Ok(text) = self.command(at::GET_OPERATOR, 0) {
                if let Some(operator) = at::extract_quoted(&text) {
                    info.operator = operator.to_string();
                }
            }
        }

        Ok(info)
    }

    /// SIM balance via USSD, with the decode fallback chain. An ERROR
    /// terminal answer triggers one retry with the request re-encoded as
    /// packed GSM 7-bit, the way some carriers expect it.
    pub fn balance(&mut self) -> Result<String> {
        let ussd = self.config.balance_ussd.clone();
        let regex = compile(&self.config.balance_regex)?;
        let from = self.config.balance_match_from;
        let repeats = self.config.balance_repeats;

        match self.ussd_query(&ussd, repeats) {
            Ok(text) => Ok(extract_with_fallback(&text, &regex, from)),
            Err(Error::ModemTerminal(_)) => {
                let encoded = gsm::encode_gsm7(&ussd);
                let text = self.ussd_query(&encoded, repeats)?;
                Ok(extract_with_fallback(&text, &regex, from))
            }
            Err(e) => Err(e),
        }
    }

    /// SIM own number via USSD; same fallback structure as `balance`.
    pub fn sim_number(&mut self) -> Result<String> {
        let ussd = self.config.sim_number_ussd.clone();
        let regex = compile(&self.config.sim_number_regex)?;
        let repeats = self.config.sim_number_repeats;

        match self.ussd_query(&ussd, repeats) {
            Ok(text) => Ok(extract_with_fallback(&text, &regex, 0)),
            Err(Error::ModemTerminal(_)) => {
                let encoded = gsm::encode_gsm7(&ussd);
                let text = self.ussd_query(&encoded, repeats)?;
                Ok(extract_with_fallback(&text, &regex, 0))
            }
            Err(e) => Err(e),
        }
    }

    /// Send one SMS: PDU mode, length header, text + Ctrl-Z.
    pub fn send_sms(&mut self, text: &str) -> Result<()> {
        self.command(at::SMS_MODE, 0)?;

        // The CMGS header answers with an input prompt, not a terminal
        // result; the outcome is judged on the final answer.
        let _ = self.command(&at::sms_send(at::sms_length(text)), 2);

        let mut packet = text.as_bytes().to_vec();
        packet.push(at::CTRL_Z);
        packet.push(at::CR);
        self.trace.tx(&packet, "SmsText");
        self.transport.write(&packet)?;

        let raw = self.collect(self.config.sms_repeats)?;
        self.trace.rx(&raw, "SmsText");
        at::unpack(&raw).map(|_| ())
    }

    /// Restart the radio; the modem disappears for several seconds.
    pub fn restart(&mut self) -> Result<()> {
        let packet = at::pack_command(at::RESTART);
        self.trace.tx(&packet, "Restart");
        self.transport.write(&packet)?;
        if self.config.restart_settle_ms > 0 {
            std::thread::sleep(std::time::Duration::from_millis(
                self.config.restart_settle_ms,
            ));
        }
        Ok(())
    }

    fn ussd_query(&mut self, request: &str, repeats: usize) -> Result<String> {
        self.command(&at::ussd(request), repeats)
    }

    /// Write one command, collect the answer over `extra_reads`
    /// additional read rounds, unwrap and require OK.
    fn command(&mut self, command: &str, extra_reads: usize) -> Result<String> {
        let packet = at::pack_command(command);
        self.trace.tx(&packet, command);
        self.transport.write(&packet)?;

        let raw = self.collect(extra_reads)?;
        self.trace.rx(&raw, command);

        if raw.len() < at::MIN_ANSWER_LEN {
            return Err(Error::NoAnswer);
        }
        at::unpack(&raw)
    }

    fn collect(&mut self, extra_reads: usize) -> Result<Vec<u8>> {
        let mut raw = Vec::new();
        for _ in 0..extra_reads + 1 {
            let chunk = self
                .transport
                .read_timeout(256, self.config.timing.answer_timeout_ms)?;
            raw.extend_from_slice(&chunk);
            if self.config.repeat_pause_ms > 0 {
                std::thread::sleep(std::time::Duration::from_millis(
                    self.config.repeat_pause_ms,
                ));
            }
        }
        Ok(raw)
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| Error::UnsupportedOperation(format!("invalid modem pattern: {}", e)))
}

fn find_from(regex: &Regex, text: &str, from: usize) -> Option<String> {
    if from > text.len() {
        return None;
    }
    regex.find_at(text, from).map(|m| m.as_str().to_string())
}

/// The decode fallback chain: plain text, then the `+CUSD: 0,"..."`
/// envelope re-read as GSM 7-bit, then as UCS-2 hex. First non-empty
/// match wins; an empty string means every decoding failed.
fn extract_with_fallback(text: &str, regex: &Regex, from: usize) -> String {
    if let Some(found) = find_from(regex, text, from) {
        return found;
    }

    let Some(envelope) = at::extract_cusd(text) else {
        return String::new();
    };

    let unpacked = gsm::decode_gsm7(envelope);
    if let Some(found) = find_from(regex, &unpacked, 0) {
        return found;
    }

    let decoded = gsm::decode_ucs2(envelope);
    if let Some(found) = find_from(regex, &decoded, 0) {
        return found;
    }

    String::new()
}

/// Terminal-result check used by tests and the session alike.
pub fn is_final_ok(text: &str) -> bool {
    FinalResult::classify(text) == FinalResult::Ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    fn wrap(text: &str) -> Vec<u8> {
        let mut raw = b"\r\n".to_vec();
        raw.extend_from_slice(text.as_bytes());
        raw.extend_from_slice(b"\r\n");
        raw
    }

    fn probe_responses(mock: &mut MockTransport) {
        mock.push_response(wrap("OK")); // ATZ
        mock.push_response(wrap("OK")); // ATE0
        mock.push_response(wrap("+CPIN: READY\r\n\r\nOK")); // AT+CPIN?
        mock.push_response(wrap("+CSQ: 18,0\r\n\r\nOK")); // AT+CSQ
        mock.push_response(wrap("E173\r\n\r\nOK")); // AT+GMM
        mock.push_response(wrap("+COPS: 0,0,\"Tcell\",2\r\n\r\nOK")); // AT+COPS?
    }

    fn probed(mut mock: MockTransport) -> (ModemSession, ModemInfo) {
        let mut head = MockTransport::new();
        probe_responses(&mut head);
        head.responses.append(&mut mock.responses);
        ModemSession::probe(Box::new(head), ModemConfig::fast()).unwrap()
    }

    #[test]
    fn probe_collects_info() {
        let (_, info) = probed(MockTransport::new());
        assert!(info.sim_present);
        assert_eq!(info.signal_quality, "18");
        assert_eq!(info.model, "E173");
        assert_eq!(info.operator, "Tcell");
        assert_eq!(info.comment(), "(E173 ( Tcell ))");
    }

    #[test]
    fn probe_without_reset_answer_is_not_found() {
        let mock = MockTransport::new();
        match ModemSession::probe(Box::new(mock), ModemConfig::fast()) {
            Err(Error::DeviceNotFound) => {}
            other => panic!("expected DeviceNotFound, got {:?}", other.err()),
        }
    }

    #[test]
    fn probe_without_sim_skips_operator() {
        let mut mock = MockTransport::new();
        mock.push_response(wrap("OK")); // ATZ
        mock.push_response(wrap("OK")); // ATE0
        mock.push_response(wrap("ERROR")); // AT+CPIN? - no SIM
        mock.push_response(wrap("+CSQ: 7,0\r\n\r\nOK"));
        mock.push_response(wrap("E173\r\n\r\nOK"));

        let (_, info) = ModemSession::probe(Box::new(mock), ModemConfig::fast()).unwrap();
        assert!(!info.sim_present);
        assert!(info.operator.is_empty());
        assert_eq!(info.comment(), "(E173 ( ---NO--- ))");
    }

    #[test]
    fn balance_plain_text_match() {
        let mut mock = MockTransport::new();
        mock.push_response(wrap("+CUSD: 0,\"Balans: 12.50 TJS\",15\r\n\r\nOK"));

        let (mut session, _) = probed(mock);
        assert_eq!(session.balance().unwrap(), "12.50");
    }

    #[test]
    fn balance_falls_back_to_gsm7() {
        // The envelope carries packed GSM 7-bit: the plain regex finds
        // nothing in the hex, unpacking recovers the amount.
        let envelope = gsm::encode_gsm7("Balans: 9.99 TJS");
        let mut mock = MockTransport::new();
        mock.push_response(wrap(&format!("+CUSD: 0,\"{}\",15\r\n\r\nOK", envelope)));

        let (mut session, _) = probed(mock);
        assert_eq!(session.balance().unwrap(), "9.99");
    }

    #[test]
    fn balance_falls_back_to_ucs2() {
        // UCS-2 hex of "-6.10". The plain regex finds nothing, the GSM
        // 7-bit unpacking of these bytes yields no amount-shaped text,
        // and the UCS-2 decoding wins.
        let mut mock = MockTransport::new();
        mock.push_response(wrap("+CUSD: 0,\"002D0036002E00310030\",15\r\n\r\nOK"));

        let (mut session, _) = probed(mock);
        assert_eq!(session.balance().unwrap(), "-6.10");
    }

    #[test]
    fn balance_empty_when_all_decodings_fail() {
        let mut mock = MockTransport::new();
        mock.push_response(wrap("+CUSD: 0,\"zz\",15\r\n\r\nOK"));

        let (mut session, _) = probed(mock);
        assert_eq!(session.balance().unwrap(), "");
    }

    #[test]
    fn balance_retries_with_gsm7_encoded_request_on_error() {
        let mut mock = MockTransport::new();
        mock.push_response(wrap("ERROR"));
        mock.push_response(wrap("+CUSD: 0,\"Balans: 3.00 TJS\",15\r\n\r\nOK"));

        let (mut session, _) = probed(mock);
        assert_eq!(session.balance().unwrap(), "3.00");
    }

    #[test]
    fn sim_number_match() {
        let mut mock = MockTransport::new();
        mock.push_response(wrap("+CUSD: 0,\"Raqamingiz: 992901234567\",15\r\n\r\nOK"));

        let (mut session, _) = probed(mock);
        assert_eq!(session.sim_number().unwrap(), "992901234567");
    }

    #[test]
    fn send_sms_sequence() {
        let mut mock = MockTransport::new();
        mock.push_response(wrap("OK")); // AT+CMGF=0
        mock.push_response(wrap("> ")); // AT+CMGS prompt (three reads)
        mock.push_response(Vec::new());
        mock.push_response(Vec::new());
        mock.push_response(wrap("+CMGS: 4\r\n\r\nOK")); // text + Ctrl-Z

        let (mut session, _) = probed(mock);
        session.send_sms("0011223344").unwrap();
    }

    #[test]
    fn send_sms_error_propagates() {
        let mut mock = MockTransport::new();
        mock.push_response(wrap("OK"));
        mock.push_response(wrap("> "));
        mock.push_response(Vec::new());
        mock.push_response(Vec::new());
        mock.push_response(wrap("ERROR"));

        let (mut session, _) = probed(mock);
        match session.send_sms("0011223344") {
            Err(Error::ModemTerminal(_)) => {}
            other => panic!("expected ModemTerminal, got {:?}", other),
        }
    }
}
