// libpayterm/src/polling/duplicate.rs

//! Duplicate credit suppression.
//!
//! Two credits for the same physical note can surface when a poll answer
//! is replayed or a terminal state is observed twice. The filter compares
//! the wall-clock delta since the previous credit against a window, and
//! for validators additionally requires that an escrow phase was actually
//! seen since the last accepted credit. This is a best-effort heuristic
//! against protocol replay, not a ledger; rapid genuine insertions near
//! the window boundary can still be misclassified, which is why the
//! window stays configurable.

use std::time::{Duration, Instant};

/// Classification of one observed credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NominalClass {
    Accepted,
    Duplicate,
}

/// Sliding credit filter. `classify` takes an explicit timestamp so
/// boundary timing is testable without sleeping.
#[derive(Debug)]
pub struct DuplicateFilter {
    window: Duration,
    needs_escrow: bool,
    escrow_seen: bool,
    last_credit: Option<Instant>,
}

/// Delta assumed for the very first credit of a session.
const FIRST_CREDIT_DELTA: Duration = Duration::from_millis(1000);

impl DuplicateFilter {
    /// `needs_escrow` gates acceptance on a preceding escrow phase
    /// (validators); coin acceptors commit immediately and pass `false`.
    pub fn new(window: Duration, needs_escrow: bool) -> Self {
        Self {
            window,
            needs_escrow,
            escrow_seen: !needs_escrow,
            last_credit: None,
        }
    }

    /// Record that the device reported an escrow phase.
    pub fn mark_escrow(&mut self) {
        self.escrow_seen = true;
    }

    /// Classify a credit observed at `at`.
    pub fn classify(&mut self, at: Instant) -> NominalClass {
        let delta = match self.last_credit {
            Some(prev) => at.saturating_duration_since(prev),
            None => FIRST_CREDIT_DELTA,
        };
        self.last_credit = Some(at);

        let fresh = delta > self.window;
        let accepted = if self.needs_escrow {
            fresh && self.escrow_seen
        } else {
            fresh
        };

        if accepted {
            if self.needs_escrow {
                self.escrow_seen = false;
            }
            NominalClass::Accepted
        } else {
            NominalClass::Duplicate
        }
    }
}
