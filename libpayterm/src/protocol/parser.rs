// libpayterm/src/protocol/parser.rs

use crate::{Error, Result};

/// Ensure the slice has at least `min` bytes.
pub fn ensure_len(data: &[u8], min: usize) -> Result<()> {
    if data.len() < min {
        return Err(Error::InvalidLength {
            expected: min,
            actual: data.len(),
        });
    }
    Ok(())
}

/// Read a single byte at `idx` with bounds checking.
pub fn byte_at(data: &[u8], idx: usize) -> Result<u8> {
    ensure_len(data, idx + 1)?;
    Ok(data[idx])
}

/// Return a subslice with bounds checking.
pub fn slice_at(data: &[u8], idx: usize, len: usize) -> Result<&[u8]> {
    ensure_len(data, idx + len)?;
    Ok(&data[idx..idx + len])
}

/// Read a little-endian u16 at given index, with bounds checking.
/// The CCNET CRC trailer is transmitted low byte first.
pub fn le_u16_at(data: &[u8], idx: usize) -> Result<u16> {
    ensure_len(data, idx + 2)?;
    Ok(u16::from_le_bytes([data[idx], data[idx + 1]]))
}

/// Render a byte range as trimmed ASCII, with bounds checking.
/// Non-ASCII bytes are replaced; device identity strings are plain ASCII
/// in practice.
pub fn ascii_at(data: &[u8], idx: usize, len: usize) -> Result<String> {
    let raw = slice_at(data, idx, len)?;
    Ok(String::from_utf8_lossy(raw).trim().to_string())
}
