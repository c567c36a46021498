// libpayterm/src/trace.rs

//! Protocol byte traces.
//!
//! Every session owns a `FrameTrace` gate. Traces are written through the
//! `log` facade but only while a poll session is actively enabled; outside
//! of polling the gate stays closed so the hot loops pay nothing.

use crate::utils::bytes_to_hex_spaced;

/// Direction of a traced frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Tx,
    Rx,
}

/// Gated frame trace for one device session.
#[derive(Debug)]
pub struct FrameTrace {
    source: &'static str,
    enabled: bool,
}

impl FrameTrace {
    pub fn new(source: &'static str) -> Self {
        Self {
            source,
            enabled: false,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Trace a frame in the given direction with a short label.
    pub fn frame(&self, direction: Direction, bytes: &[u8], label: &str) {
        if !self.enabled {
            return;
        }
        let arrow = match direction {
            Direction::Tx => ">>",
            Direction::Rx => "<<",
        };
        log::debug!(
            "{}: {} {{{}}} {}",
            self.source,
            arrow,
            bytes_to_hex_spaced(bytes),
            label
        );
    }

    pub fn tx(&self, bytes: &[u8], label: &str) {
        self.frame(Direction::Tx, bytes, label);
    }

    pub fn rx(&self, bytes: &[u8], label: &str) {
        self.frame(Direction::Rx, bytes, label);
    }

    /// Free-form note in the session trace, same gating as frames.
    pub fn note(&self, text: &str) {
        if self.enabled {
            log::debug!("{}: {}", self.source, text);
        }
    }
}
