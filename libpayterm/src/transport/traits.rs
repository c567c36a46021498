// libpayterm/src/transport/traits.rs

use crate::Result;
use crate::utils::Deadline;

/// Transport trait abstracts blocking serial I/O away from the protocol
/// and session logic.
///
/// `read_timeout` returns whatever was received by the deadline, possibly
/// an empty buffer - an expired timeout is not an error at this layer.
/// Interpreting emptiness (probe miss, poll retry) is the session's job.
pub trait Transport: Send {
    /// Write raw bytes to the device.
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Read up to `max_len` bytes, blocking for at most `timeout_ms`.
    fn read_timeout(&mut self, max_len: usize, timeout_ms: u64) -> Result<Vec<u8>>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_open(&self) -> bool {
        true
    }

    /// Release the OS handle. Safe to call more than once.
    fn close(&mut self) {}
}

/// Accumulate reads in short slices until `complete` says the buffer holds
/// a full answer or the overall deadline expires. Returns whatever was
/// collected either way; the caller decides whether a partial buffer is a
/// protocol error or a timeout.
pub fn read_accumulate(
    transport: &mut dyn Transport,
    total_timeout_ms: u64,
    slice_ms: u64,
    mut complete: impl FnMut(&[u8]) -> bool,
) -> Result<Vec<u8>> {
    let deadline = Deadline::after_ms(total_timeout_ms);
    let mut buffer = Vec::new();

    loop {
        let chunk = transport.read_timeout(256, slice_ms)?;
        buffer.extend_from_slice(&chunk);

        if !buffer.is_empty() && complete(&buffer) {
            break;
        }
        if deadline.expired() {
            break;
        }
    }

    Ok(buffer)
}
