//! Timeout helpers used across the crate.
//!
//! The blocking read loops accumulate bytes in short slices against an
//! overall deadline; `Deadline` centralizes that arithmetic so the loops
//! stay readable.

use std::time::{Duration, Instant};

/// Default read timeout in milliseconds used by transports when a caller
/// doesn't provide an explicit timeout.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;

/// Convert milliseconds to Duration.
pub fn ms(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

/// Convenience: default read timeout as Duration.
pub fn default_read_timeout() -> Duration {
    ms(DEFAULT_READ_TIMEOUT_MS)
}

/// A wall-clock deadline for a multi-slice read.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    end: Instant,
}

impl Deadline {
    pub fn after_ms(timeout_ms: u64) -> Self {
        Self {
            end: Instant::now() + ms(timeout_ms),
        }
    }

    pub fn expired(&self) -> bool {
        Instant::now() >= self.end
    }
}
