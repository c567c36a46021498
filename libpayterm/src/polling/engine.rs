// libpayterm/src/polling/engine.rs

//! The generic poll loop.
//!
//! One engine drives one pollable device (bill validator or coin
//! acceptor) on its own thread. The protocol specifics live behind the
//! `PollDevice` strategy; the engine owns the money-safety ladder: an
//! external DB-error flag forces Return, then the session maximum is
//! checked, and only then is Stack issued and the sum accumulated. The
//! decision is made before any hardware command - a physically stacked
//! note cannot be rolled back.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::polling::duplicate::{DuplicateFilter, NominalClass};
use crate::polling::events::{DeviceEvent, DeviceStatus, EventChannel, status_of};
use crate::polling::limits::SessionLimits;
use crate::polling::state::PollState;
use crate::types::Nominal;
use crate::{Result, constants};

/// Protocol strategy driven by the engine. Implemented by the validator
/// session (CCNET/EBDS) and the coin acceptor session.
pub trait PollDevice {
    /// Allow acceptance (inhibits off / enable mask on).
    fn enable(&mut self) -> Result<()>;

    /// Inhibit acceptance and run the protocol's stop sequence.
    fn disable(&mut self) -> Result<()>;

    /// One status request; interprets the answer into a `PollState`.
    fn poll(&mut self) -> Result<PollState>;

    /// Commit the escrowed note to the cash box.
    fn stack(&mut self) -> Result<()>;

    /// Send the escrowed note back to the customer.
    fn return_escrowed(&mut self) -> Result<()>;

    /// Recover from power-up/pause; default is to do nothing.
    fn restart(&mut self) -> Result<()> {
        Ok(())
    }

    /// Whether credits must be preceded by an escrow phase (validators)
    /// or commit immediately (coin acceptor).
    fn escrow_based(&self) -> bool {
        true
    }
}

/// Engine timing knobs.
#[derive(Debug, Clone)]
pub struct PollTiming {
    /// Duplicate-suppression window, [ms].
    pub duplicate_window_ms: u64,
    /// Sleep between poll cycles, [ms].
    pub cycle_delay_ms: u64,
}

impl Default for PollTiming {
    fn default() -> Self {
        Self {
            duplicate_window_ms: constants::DUPLICATE_WINDOW_MS,
            cycle_delay_ms: constants::POLL_CYCLE_DELAY_MS,
        }
    }
}

impl PollTiming {
    /// No artificial delays; unit tests drive the loop synchronously.
    pub fn immediate() -> Self {
        Self {
            duplicate_window_ms: constants::DUPLICATE_WINDOW_MS,
            cycle_delay_ms: 0,
        }
    }
}

/// The polling engine for one device.
pub struct PollingEngine<D: PollDevice> {
    device: D,
    limits: SessionLimits,
    filter: DuplicateFilter,
    events: EventChannel,
    db_error: Arc<AtomicBool>,
    timing: PollTiming,
    last_status: Option<DeviceStatus>,
}

impl<D: PollDevice> PollingEngine<D> {
    pub fn new(
        device: D,
        limits: SessionLimits,
        timing: PollTiming,
        events: EventChannel,
        db_error: Arc<AtomicBool>,
    ) -> Self {
        let filter = DuplicateFilter::new(
            Duration::from_millis(timing.duplicate_window_ms),
            device.escrow_based(),
        );
        Self {
            device,
            limits,
            filter,
            events,
            db_error,
            timing,
            last_status: None,
        }
    }

    /// Hand the device back after the loop has exited.
    pub fn into_device(self) -> D {
        self.device
    }

    /// Run the poll loop until `stop` is set. The flag is checked at the
    /// top of each iteration; an exchange in flight completes first.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<()> {
        self.limits.reset();
        self.device.enable()?;

        let result = self.poll_loop(stop);

        // Cooperative stop: inhibit acceptance before the port is
        // released. Best effort - the port may already be gone.
        if self.device.disable().is_err() {
            log::warn!("disable on poll stop failed");
        }
        self.limits.reset();

        if let Err(e) = &result {
            self.events
                .status(DeviceStatus::Unavailable, &format!("poll loop failed: {}", e));
        }
        result
    }

    fn poll_loop(&mut self, stop: &AtomicBool) -> Result<()> {
        while !stop.load(Ordering::Relaxed) {
            match self.device.poll() {
                Ok(state) => self.handle(state)?,
                Err(e) if e.is_port_error() => return Err(e),
                Err(e) => {
                    // Checksum/timeout class: next cycle tries again.
                    log::debug!("poll exchange failed, retrying next cycle: {}", e);
                }
            }

            if self.timing.cycle_delay_ms > 0 {
                std::thread::sleep(Duration::from_millis(self.timing.cycle_delay_ms));
            }
        }
        Ok(())
    }

    fn handle(&mut self, state: PollState) -> Result<()> {
        match state {
            PollState::PowerUp | PollState::Pause => {
                self.report(&state);
                self.device.restart()
            }
            PollState::Disabled => self.device.enable(),
            PollState::Escrow(nominal) => {
                self.on_escrow(nominal)?;
                // Observe the terminal Stacked/Returned state right away
                // so the credit is attributed to this escrow cycle.
                match self.device.poll() {
                    Ok(after) => self.settle(after),
                    Err(e) if e.is_port_error() => return Err(e),
                    Err(_) => {}
                }
                Ok(())
            }
            other => {
                self.settle(other);
                Ok(())
            }
        }
    }

    /// The escrow decision ladder. Order is money-safety precedence: DB
    /// error first, then session maximum, then Stack.
    fn on_escrow(&mut self, nominal: Nominal) -> Result<()> {
        self.filter.mark_escrow();

        if nominal.is_zero() {
            // Unrecognized denomination is never stacked.
            return self.device.return_escrowed();
        }

        if self.db_error.load(Ordering::Relaxed) {
            self.device.return_escrowed()?;
            self.events.send(DeviceEvent::NominalReturned(nominal));
            return Ok(());
        }

        if self.limits.would_exceed(nominal) {
            self.device.return_escrowed()?;
            self.events.send(DeviceEvent::NominalReturned(nominal));
            return Ok(());
        }

        self.limits.add(nominal);
        self.device.stack()
    }

    /// Interpret a non-escrow state: credits run the duplicate filter,
    /// everything else is an edge-triggered status report.
    fn settle(&mut self, state: PollState) {
        match state {
            PollState::Stacked(nominal) if !nominal.is_zero() => {
                match self.filter.classify(Instant::now()) {
                    NominalClass::Accepted => {
                        self.events.send(DeviceEvent::NominalAccepted(nominal));
                    }
                    NominalClass::Duplicate => {
                        self.events.send(DeviceEvent::NominalDuplicate(nominal));
                    }
                }
            }
            ref other => self.report(other),
        }
    }

    fn report(&mut self, state: &PollState) {
        if let Some((status, comment)) = status_of(state) {
            if self.last_status != Some(status) {
                self.last_status = Some(status);
                self.events.status(status, comment);
            }
        }
    }

    /// Accumulated sum of the current session (test hook).
    pub fn accumulated(&self) -> u32 {
        self.limits.accumulated()
    }
}
