// libpayterm/src/protocol/cctalk/events.rs

//! Buffered credit / error queue decoding (ccTalk header 0xE5).
//!
//! The answer data is `[counter][coin1][sorter1][coin2][sorter2]...` with
//! up to five (coin, sorter) result pairs, newest first. The counter wraps
//! at 255 and restarts at zero after a device reset.

use crate::polling::state::AcceptorFault;
use crate::{Result, protocol::parser};

/// Result pairs the device can buffer per answer.
pub const MAX_BUFFERED_EVENTS: u8 = 5;

/// One decoded result pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoinEvent {
    /// A coin was accepted into slot `slot` (1..=16).
    Credit { slot: u8 },
    /// Coin in flight; no credit yet.
    Accepting,
    Fault(AcceptorFault),
}

/// The decoded credit poll answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditPoll {
    /// Event counter reported by the device.
    pub counter: u8,
    /// New events since `prev_counter`, newest first.
    pub events: Vec<CoinEvent>,
}

/// Decode the buffered-credit answer data against the previously seen
/// counter value.
pub fn decode_credit_poll(prev_counter: u8, data: &[u8]) -> Result<CreditPoll> {
    let counter = parser::byte_at(data, 0)?;

    // Counter zero means the device was reset; the backlog is meaningless.
    let prev = if counter == 0 { 0 } else { prev_counter };

    let pending = if prev <= counter {
        counter - prev
    } else {
        // Wrapped around 255.
        255 - prev + counter
    };
    let pending = pending.min(MAX_BUFFERED_EVENTS);

    // Newest pair sits at the end of the used region; walk backwards the
    // way the credit queue is meant to be drained.
    let mut events = Vec::with_capacity(pending as usize);
    for i in (1..=pending).rev() {
        let coin = parser::byte_at(data, i as usize * 2 - 1)?;
        let sorter = parser::byte_at(data, i as usize * 2)?;

        if coin > 0 {
            events.push(CoinEvent::Credit { slot: coin });
        } else if sorter == 0 {
            events.push(CoinEvent::Accepting);
        } else {
            events.push(CoinEvent::Fault(AcceptorFault::from_code(sorter)));
        }
    }

    Ok(CreditPoll { counter, events })
}
