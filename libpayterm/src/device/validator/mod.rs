// libpayterm/src/device/validator/mod.rs

//! Bill validator session.
//!
//! One session owns one serial port and speaks one of the two validator
//! wire protocols. The protocol is chosen once at configuration time via
//! `ValidatorProtocol` - a strategy enum, not a per-call string check -
//! and every operation dispatches on it exactly once.

pub mod firmware;

use crate::device::SessionTiming;
use crate::polling::engine::PollDevice;
use crate::polling::state::PollState;
use crate::protocol::ccnet::{self, states::BillTable};
use crate::protocol::ebds::{self, states::NoteFilter};
use crate::trace::FrameTrace;
use crate::transport::{Transport, read_accumulate};
use crate::types::{DeviceIdentity, LineSettings};
use crate::{Error, Result};

/// Which validator wire protocol the bound device speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatorProtocol {
    CcNet,
    Ebds,
}

impl ValidatorProtocol {
    pub fn model_name(&self) -> &'static str {
        match self {
            Self::CcNet => "CashCode CCNET",
            Self::Ebds => "MEI EBDS",
        }
    }
}

/// Immutable validator configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    pub protocol: ValidatorProtocol,
    /// CCNET bill-type table.
    pub bills: BillTable,
    /// EBDS note filter (currency + value range).
    pub notes: NoteFilter,
    pub timing: SessionTiming,
}

impl ValidatorConfig {
    pub fn ccnet() -> Self {
        Self {
            protocol: ValidatorProtocol::CcNet,
            bills: BillTable::tajik(),
            notes: NoteFilter::uzbek(),
            timing: SessionTiming::ccnet(),
        }
    }

    pub fn ebds() -> Self {
        Self {
            protocol: ValidatorProtocol::Ebds,
            bills: BillTable::tajik(),
            notes: NoteFilter::uzbek(),
            timing: SessionTiming::ebds(),
        }
    }

    /// The fixed line parameters this protocol opens its port with.
    pub fn line(&self) -> LineSettings {
        match self.protocol {
            ValidatorProtocol::CcNet => ccnet::LINE,
            ValidatorProtocol::Ebds => ebds::LINE,
        }
    }
}

/// A probed, identified validator bound to its port.
pub struct ValidatorSession {
    transport: Box<dyn Transport>,
    config: ValidatorConfig,
    trace: FrameTrace,
    identity: DeviceIdentity,
    /// EBDS alternating ACK bit.
    ack: bool,
    /// Acceptance state, mirrored into the EBDS poll enable mask.
    enabled: bool,
}

impl ValidatorSession {
    /// Probe the device behind `transport`. On success the session keeps
    /// the port; on failure the port is closed and `DeviceNotFound` is
    /// returned so discovery can try the next candidate.
    pub fn probe(transport: Box<dyn Transport>, config: ValidatorConfig) -> Result<Self> {
        let mut session = Self {
            transport,
            config,
            trace: FrameTrace::new("VALIDATOR"),
            identity: DeviceIdentity::default(),
            ack: false,
            enabled: false,
        };

        match session.identify() {
            Ok(identity) => {
                session.identity = identity;
                Ok(session)
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

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn protocol(&self) -> ValidatorProtocol {
        self.config.protocol
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Release the port.
    pub fn close(&mut self) {
        self.transport.close();
    }

    fn identify(&mut self) -> Result<DeviceIdentity> {
        match self.config.protocol {
            ValidatorProtocol::CcNet => self.identify_ccnet(),
            ValidatorProtocol::Ebds => self.identify_ebds(),
        }
    }

    fn identify_ccnet(&mut self) -> Result<DeviceIdentity> {
        match self.exchange_ccnet(ccnet::Command::Poll) {
            Ok(data) => {
                // A bare Stacked answer during probing means another
                // device class is echoing; not our validator.
                if data.first() == Some(&ccnet::states::state::STACKED) {
                    return Err(Error::DeviceNotFound);
                }
                let answer = self.exchange_ccnet(ccnet::Command::Identification)?;
                let (part_number, serial_number) = ccnet::parse_identification(&answer)?;
                Ok(DeviceIdentity::new(
                    self.config.protocol.model_name(),
                    part_number,
                    serial_number,
                ))
            }
            Err(e) if e.is_port_error() => Err(e),
            Err(_) => {
                // A validator stuck in its bootloader answers no poll but
                // acknowledges the firmware-mode check.
                if self.bootloader_present()? {
                    Ok(DeviceIdentity::new(
                        self.config.protocol.model_name(),
                        "BOOTLDR".to_string(),
                        String::new(),
                    ))
                } else {
                    Err(Error::DeviceNotFound)
                }
            }
        }
    }

    fn identify_ebds(&mut self) -> Result<DeviceIdentity> {
        let kind = self.exchange_ebds(&ebds::GET_TYPE, "GetType")?;
        let kind = String::from_utf8_lossy(&kind).trim().to_string();
        if kind.is_empty() {
            return Err(Error::DeviceNotFound);
        }

        let mut part_number = kind;
        if let Ok(name) = self.exchange_ebds(&ebds::GET_VARIANT_NAME, "GetVariantName") {
            part_number = format!("{}/{}", part_number, String::from_utf8_lossy(&name).trim());
        }
        if let Ok(version) = self.exchange_ebds(&ebds::GET_VARIANT_VERSION, "GetVariantVersion") {
            let version = String::from_utf8_lossy(&version[..version.len().min(9)])
                .trim()
                .to_string();
            part_number = format!("{}/{}", part_number, version);
        }

        let serial_number = match self.exchange_ebds(&ebds::GET_SERIAL_NUMBER, "GetSerialNumber") {
            Ok(serial) => String::from_utf8_lossy(&serial).trim().to_string(),
            Err(_) => String::new(),
        };

        Ok(DeviceIdentity::new(
            self.config.protocol.model_name(),
            part_number,
            serial_number,
        ))
    }

    /// One CCNET exchange: write, collect the answer burst, resolve the
    /// first checksum-valid frame, ACK it. NAK answers and checksum
    /// failures are each retried up to the protocol bound.
    fn exchange_ccnet(&mut self, command: ccnet::Command) -> Result<Vec<u8>> {
        let request = command.encode();
        let mut nak_count = 0usize;
        let mut checksum_count = 0usize;

        loop {
            self.trace.tx(&request, command.label());
            self.transport.write(&request)?;

            let burst = read_accumulate(
                self.transport.as_mut(),
                self.config.timing.answer_timeout_ms,
                self.config.timing.read_slice_ms,
                ccnet::burst_complete,
            )?;
            self.trace.rx(&burst, command.label());

            if burst.is_empty() {
                return Err(Error::NoAnswer);
            }

            match ccnet::first_valid(&burst) {
                Some(frame) if frame.is_nak() => {
                    nak_count += 1;
                    if nak_count >= ccnet::MAX_RETRIES {
                        return Err(Error::RetriesExhausted {
                            attempts: nak_count,
                        });
                    }
                }
                Some(frame) => {
                    // Confirm reception so the device can drop the answer
                    // from its transmit buffer.
                    self.transport.write(&ccnet::Command::Ack.encode())?;
                    self.settle();
                    return Ok(frame.data);
                }
                None => {
                    checksum_count += 1;
                    if checksum_count >= ccnet::MAX_RETRIES {
                        return Err(Error::RetriesExhausted {
                            attempts: checksum_count,
                        });
                    }
                }
            }
        }
    }

    /// One EBDS exchange; the alternating ACK bit advances per request.
    fn exchange_ebds(&mut self, body: &[u8], label: &str) -> Result<Vec<u8>> {
        let request = ebds::encode(body, self.ack);
        self.ack = !self.ack;

        self.trace.tx(&request, label);
        self.transport.write(&request)?;

        let raw = read_accumulate(
            self.transport.as_mut(),
            self.config.timing.answer_timeout_ms,
            self.config.timing.read_slice_ms,
            ebds::answer_complete,
        )?;
        self.trace.rx(&raw, label);

        if raw.is_empty() {
            return Err(Error::NoAnswer);
        }
        ebds::decode(&request, &raw)
    }

    /// Write-only EBDS command (reset expects no answer).
    fn command_ebds_no_answer(&mut self, body: &[u8], label: &str) -> Result<()> {
        let request = ebds::encode(body, self.ack);
        self.ack = !self.ack;
        self.trace.tx(&request, label);
        self.transport.write(&request)
    }

    fn settle(&self) {
        if self.config.timing.command_delay_ms > 0 {
            std::thread::sleep(std::time::Duration::from_millis(
                self.config.timing.command_delay_ms,
            ));
        }
    }

    /// Ignore everything but port errors; enable/disable sequences must
    /// not abort polling because one frame was garbled.
    fn soft(&mut self, result: Result<Vec<u8>>) -> Result<()> {
        match result {
            Ok(_) => Ok(()),
            Err(e) if e.is_port_error() => Err(e),
            Err(_) => Ok(()),
        }
    }
}

impl PollDevice for ValidatorSession {
    fn enable(&mut self) -> Result<()> {
        self.trace.set_enabled(true);
        self.enabled = true;
        match self.config.protocol {
            ValidatorProtocol::CcNet => {
                let r = self.exchange_ccnet(ccnet::Command::SetEnabled);
                self.soft(r)
            }
            ValidatorProtocol::Ebds => {
                // The enable mask travels inside the next poll.
                let r = self.exchange_ebds(&ebds::poll_body(true, 0), "SetEnabled");
                self.soft(r)
            }
        }
    }

    fn disable(&mut self) -> Result<()> {
        self.enabled = false;
        let result = match self.config.protocol {
            ValidatorProtocol::CcNet => {
                let r = self.exchange_ccnet(ccnet::Command::SetDisabled);
                self.soft(r)
            }
            ValidatorProtocol::Ebds => {
                let r = self.exchange_ebds(&ebds::poll_body(false, 0), "SetDisabled");
                self.soft(r)
            }
        };
        self.trace.set_enabled(false);
        result
    }

    fn poll(&mut self) -> Result<PollState> {
        match self.config.protocol {
            ValidatorProtocol::CcNet => {
                let data = self.exchange_ccnet(ccnet::Command::Poll)?;
                Ok(ccnet::decode_poll(&data, &self.config.bills))
            }
            ValidatorProtocol::Ebds => {
                let enabled = self.enabled;
                let data = self.exchange_ebds(&ebds::poll_body(enabled, 0), "Poll")?;
                Ok(ebds::decode_poll(&data, &self.config.notes))
            }
        }
    }

    fn stack(&mut self) -> Result<()> {
        match self.config.protocol {
            ValidatorProtocol::CcNet => self.exchange_ccnet(ccnet::Command::Stack).map(|_| ()),
            ValidatorProtocol::Ebds => {
                let enabled = self.enabled;
                self.exchange_ebds(&ebds::poll_body(enabled, ebds::STACK), "Stack")
                    .map(|_| ())
            }
        }
    }

    fn return_escrowed(&mut self) -> Result<()> {
        match self.config.protocol {
            ValidatorProtocol::CcNet => self.exchange_ccnet(ccnet::Command::Return).map(|_| ()),
            ValidatorProtocol::Ebds => {
                let enabled = self.enabled;
                self.exchange_ebds(&ebds::poll_body(enabled, ebds::RETURN), "Return")
                    .map(|_| ())
            }
        }
    }

    /// CCNET power-up recovery re-runs the identify sequence the vendor
    /// tooling uses; EBDS heads resume by themselves.
    fn restart(&mut self) -> Result<()> {
        match self.config.protocol {
            ValidatorProtocol::CcNet => {
                let r = self.exchange_ccnet(ccnet::Command::Reset);
                self.soft(r)?;
                let r = self.exchange_ccnet(ccnet::Command::Poll);
                self.soft(r)?;
                let r = self.exchange_ccnet(ccnet::Command::GetBillTable);
                self.soft(r)?;
                let r = self.exchange_ccnet(ccnet::Command::SetSecurity);
                self.soft(r)?;
                if let Ok(answer) = self.exchange_ccnet(ccnet::Command::Identification) {
                    if let Ok((part, serial)) = ccnet::parse_identification(&answer) {
                        self.identity.part_number = part;
                        self.identity.serial_number = serial;
                    }
                }
                Ok(())
            }
            ValidatorProtocol::Ebds => {
                self.command_ebds_no_answer(&ebds::RESET, "Reset")
            }
        }
    }
}
