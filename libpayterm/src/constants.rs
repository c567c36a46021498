// libpayterm/src/constants.rs
//! Cross-cutting timing defaults used by the device sessions.

/// Default duplicate-suppression window between two credits, in
/// milliseconds. A heuristic against protocol replay, kept configurable
/// per engine (`PollTiming`).
pub const DUPLICATE_WINDOW_MS: u64 = 500;

/// Delay between poll cycles on a device worker thread.
pub const POLL_CYCLE_DELAY_MS: u64 = 50;

/// How long a modem is given to finish powering up before AT commands
/// are attempted during discovery. Zero in test configurations.
pub const MODEM_POWER_UP_WAIT_MS: u64 = 30_000;

/// Settle time after a modem restart (AT+CFUN=0,1).
pub const MODEM_RESTART_SETTLE_MS: u64 = 10_000;
