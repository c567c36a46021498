// libpayterm/src/device/watchdog.rs

//! OSMP watchdog session.
//!
//! The watchdog only ever answers its identification command; everything
//! else is fire-and-forget. Timer control keeps the terminal alive, the
//! reset lines power-cycle the modem or the PC.

use crate::device::SessionTiming;
use crate::protocol::watchdog::{self, Command};
use crate::trace::FrameTrace;
use crate::transport::{Transport, read_accumulate};
use crate::types::{DeviceIdentity, LineSettings};
use crate::{Error, Result};

/// An identified watchdog bound to its port.
pub struct WatchdogSession {
    transport: Box<dyn Transport>,
    timing: SessionTiming,
    trace: FrameTrace,
    identity: DeviceIdentity,
}

impl WatchdogSession {
    /// The fixed line parameters for the watchdog protocol.
    pub fn line() -> LineSettings {
        watchdog::LINE
    }

    /// Probe: the identification reply must carry the `WDT`/`v1`
    /// signature. The port is closed on failure.
    pub fn probe(transport: Box<dyn Transport>, timing: SessionTiming) -> Result<Self> {
        let mut session = Self {
            transport,
            timing,
            trace: FrameTrace::new("WATCHDOG"),
            identity: DeviceIdentity::default(),
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

    pub fn close(&mut self) {
        self.transport.close();
    }

    fn identify(&mut self) -> Result<DeviceIdentity> {
        let reply = self.command(Command::Identify)?;
        if !watchdog::is_identity_reply(&reply) {
            return Err(Error::DeviceNotFound);
        }
        Ok(DeviceIdentity::new(
            "OSMP Watchdog",
            format!(
                "{} {}",
                watchdog::IDENTITY_SIGNATURE,
                watchdog::IDENTITY_VERSION
            ),
            String::new(),
        ))
    }

    /// Send one command; commands that answer have their reply returned,
    /// the rest yield an empty buffer.
    pub fn command(&mut self, command: Command) -> Result<Vec<u8>> {
        let packet = command.encode();
        self.trace.tx(&packet, "watchdog");
        self.transport.write(&packet)?;
        self.transport.flush()?;

        if !command.expects_reply() {
            return Ok(Vec::new());
        }

        let reply = read_accumulate(
            self.transport.as_mut(),
            self.timing.answer_timeout_ms,
            self.timing.read_slice_ms,
            watchdog::is_identity_reply,
        )?;
        self.trace.rx(&reply, "watchdog");

        if reply.is_empty() {
            return Err(Error::NoAnswer);
        }
        Ok(reply)
    }

    /// Arm the hardware timer; the terminal must ping before it expires.
    pub fn start_timer(&mut self) -> Result<()> {
        self.command(Command::StartTimer).map(|_| ())
    }

    pub fn stop_timer(&mut self) -> Result<()> {
        self.command(Command::StopTimer).map(|_| ())
    }

    pub fn ping(&mut self) -> Result<()> {
        self.command(Command::Ping).map(|_| ())
    }

    pub fn reset_modem(&mut self) -> Result<()> {
        self.command(Command::ResetModem).map(|_| ())
    }

    pub fn reboot_pc(&mut self) -> Result<()> {
        self.command(Command::RebootPc).map(|_| ())
    }
}
