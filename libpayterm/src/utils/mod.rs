//! Utilities for libpayterm: small, reusable helpers used across the crate.
//!
//! Kept deliberately tiny: hex rendering for protocol traces and test
//! assertions, and timeout/deadline arithmetic for the blocking read loops.

pub mod hex;
pub mod timeout;

// Re-export the most common helpers at the `utils` module level so callers
// can use `crate::utils::bytes_to_hex(...)` etc if they prefer.
pub use hex::*;
pub use timeout::*;
