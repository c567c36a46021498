// libpayterm/src/device/acceptor.rs

//! ccTalk coin acceptor session.
//!
//! Coins have no escrow: a buffered credit is already committed money, so
//! the session surfaces credits as `Stacked` states and the Stack/Return
//! hooks are no-ops. The slot table is read from the device at init time;
//! credit values resolve through the immutable configured value map.

use std::collections::VecDeque;

use crate::device::SessionTiming;
use crate::polling::engine::PollDevice;
use crate::polling::state::PollState;
use crate::protocol::cctalk::{
    self, CoinEvent, CoinTable, CoinValueMap, Command, Frame, decode_credit_poll,
    table::COIN_SLOTS,
};
use crate::trace::FrameTrace;
use crate::transport::{Transport, read_accumulate};
use crate::types::{DeviceIdentity, LineSettings};
use crate::{Error, Result};

/// Immutable coin acceptor configuration.
#[derive(Debug, Clone)]
pub struct AcceptorConfig {
    pub values: CoinValueMap,
    pub timing: SessionTiming,
}

impl AcceptorConfig {
    pub fn tajik() -> Self {
        Self {
            values: CoinValueMap::tajik(),
            timing: SessionTiming::cctalk(),
        }
    }

    pub fn line(&self) -> LineSettings {
        cctalk::LINE
    }
}

/// A probed, identified coin acceptor bound to its port.
pub struct AcceptorSession {
    transport: Box<dyn Transport>,
    config: AcceptorConfig,
    trace: FrameTrace,
    identity: DeviceIdentity,
    table: CoinTable,
    /// Last seen buffered-event counter.
    counter: u8,
    /// Events already decoded but not yet consumed by `poll`.
    pending: VecDeque<PollState>,
}

impl AcceptorSession {
    /// Probe the device behind `transport`: a simple poll must come back
    /// as the empty host-addressed ACK (`01 00 02` prefix), then the
    /// identity commands fill in part and serial numbers. The port is
    /// closed on failure.
    pub fn probe(transport: Box<dyn Transport>, config: AcceptorConfig) -> Result<Self> {
        let mut session = Self {
            transport,
            config,
            trace: FrameTrace::new("COIN ACCEPTOR"),
            identity: DeviceIdentity::default(),
            table: CoinTable::new(),
            counter: 0,
            pending: VecDeque::new(),
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

    pub fn coin_table(&self) -> &CoinTable {
        &self.table
    }

    pub fn close(&mut self) {
        self.transport.close();
    }

    fn identify(&mut self) -> Result<DeviceIdentity> {
        let ack = self.exchange(Command::SimplePoll)?;
        if !(ack.header == 0 && ack.data.is_empty() && ack.source == cctalk::ACCEPTOR_ADDRESS) {
            return Err(Error::DeviceNotFound);
        }

        let manufacturer = self.exchange(Command::ManufacturerId)?;
        let product = self.exchange(Command::ProductCode)?;

        let mut part_number = String::new();
        part_number.push_str(&String::from_utf8_lossy(
            &manufacturer.data[..manufacturer.data.len().min(3)],
        ));
        part_number.push(' ');
        part_number.push_str(&String::from_utf8_lossy(
            &product.data[..product.data.len().min(3)],
        ));

        // Serial arrives little-endian; render the 24-bit value decimal.
        let serial = self.exchange(Command::SerialNumber)?;
        let serial_number = if serial.data.len() >= 3 {
            let value = u32::from_be_bytes([0, serial.data[2], serial.data[1], serial.data[0]]);
            value.to_string()
        } else {
            String::new()
        };

        Ok(DeviceIdentity::new(
            "ccTalk Coin Acceptor",
            part_number.trim().to_string(),
            serial_number,
        ))
    }

    /// Init sequence: settle the device, then read the programmed coin
    /// codes for every slot to build the slot table.
    pub fn init(&mut self) -> Result<()> {
        self.soft_command(Command::Reset)?;
        self.soft_command(Command::Reset)?;
        self.soft_command(Command::ModifyInhibit { enabled: false })?;
        self.soft_command(Command::SelfCheck)?;
        self.soft_command(Command::SelfCheck)?;

        for slot in 1..=COIN_SLOTS {
            if let Ok(frame) = self.exchange(Command::CoinId { slot }) {
                let code = String::from_utf8_lossy(&frame.data[..frame.data.len().min(6)]);
                self.table.set_slot(slot, &code);
            }
        }

        self.trace.note(&format!("coin table\n{}", self.table.render()));
        Ok(())
    }

    /// One ccTalk exchange with NAK/BUSY and checksum retry bounds.
    fn exchange(&mut self, command: Command) -> Result<Frame> {
        let request = command.encode();
        let mut busy_nak_count = 0usize;
        let mut checksum_count = 0usize;

        loop {
            if busy_nak_count > 0 && self.config.timing.nak_pause_ms > 0 {
                std::thread::sleep(std::time::Duration::from_millis(
                    self.config.timing.nak_pause_ms,
                ));
            }

            self.trace.tx(&request, command.label());
            self.transport.write(&request)?;

            let mut answer = read_accumulate(
                self.transport.as_mut(),
                self.config.timing.answer_timeout_ms,
                self.config.timing.read_slice_ms,
                cctalk::answer_complete,
            )?;

            // Half-duplex line: the device sees its own request echoed
            // back; strip it before validation.
            if answer.starts_with(&request) {
                answer.drain(..request.len());
            }
            self.trace.rx(&answer, command.label());

            if answer.is_empty() {
                return Err(Error::NoAnswer);
            }

            if cctalk::is_nak(&answer) || cctalk::is_busy(&answer) {
                busy_nak_count += 1;
                if busy_nak_count >= cctalk::MAX_NAK_RETRIES {
                    return Err(Error::RetriesExhausted {
                        attempts: busy_nak_count,
                    });
                }
                continue;
            }

            match Frame::decode_response(&answer) {
                Ok(frame) => return Ok(frame),
                Err(e) if e.is_protocol_error() => {
                    checksum_count += 1;
                    if checksum_count >= cctalk::MAX_NAK_RETRIES {
                        return Err(Error::RetriesExhausted {
                            attempts: checksum_count,
                        });
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Ignore everything but port errors (init/stop sequences).
    fn soft_command(&mut self, command: Command) -> Result<()> {
        match self.exchange(command) {
            Ok(_) => Ok(()),
            Err(e) if e.is_port_error() => Err(e),
            Err(_) => Ok(()),
        }
    }

    fn event_state(&self, event: CoinEvent) -> PollState {
        match event {
            CoinEvent::Credit { slot } => {
                PollState::Stacked(self.table.resolve(slot, &self.config.values))
            }
            CoinEvent::Accepting => PollState::Accepting,
            CoinEvent::Fault(fault) => PollState::CoinFault(fault),
        }
    }
}

impl PollDevice for AcceptorSession {
    fn enable(&mut self) -> Result<()> {
        self.trace.set_enabled(true);
        self.counter = 0;
        self.pending.clear();
        self.soft_command(Command::ModifyInhibit { enabled: true })
    }

    /// Stop sequence: inhibit, reset, self checks - twice over, the way
    /// the acceptor firmware wants to be parked.
    fn disable(&mut self) -> Result<()> {
        let result = (|| {
            self.soft_command(Command::Reset)?;
            self.soft_command(Command::ModifyInhibit { enabled: false })?;
            self.soft_command(Command::SelfCheck)?;
            self.soft_command(Command::Reset)?;
            self.soft_command(Command::ModifyInhibit { enabled: false })?;
            self.soft_command(Command::SelfCheck)?;
            self.soft_command(Command::SelfCheck)
        })();
        self.trace.set_enabled(false);
        result
    }

    fn poll(&mut self) -> Result<PollState> {
        if let Some(state) = self.pending.pop_front() {
            return Ok(state);
        }

        let frame = self.exchange(Command::ReadBufferedCredits)?;
        let poll = decode_credit_poll(self.counter, &frame.data)?;
        self.counter = poll.counter;

        for event in poll.events {
            let state = self.event_state(event);
            self.pending.push_back(state);
        }

        Ok(self.pending.pop_front().unwrap_or(PollState::Idling))
    }

    /// Coins commit on acceptance; there is no escrow position.
    fn stack(&mut self) -> Result<()> {
        Ok(())
    }

    fn return_escrowed(&mut self) -> Result<()> {
        Ok(())
    }

    fn restart(&mut self) -> Result<()> {
        self.soft_command(Command::Reset)
    }

    fn escrow_based(&self) -> bool {
        false
    }
}
