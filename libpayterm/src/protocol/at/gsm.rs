// libpayterm/src/protocol/at/gsm.rs

//! GSM 03.38 7-bit packing and UCS-2 hex decoding for USSD payloads.
//!
//! Carriers answer USSD queries in whatever encoding their SMSC feels
//! like; the modem session tries plain text first, then these decoders.

use crate::utils::parse_hex;

/// GSM 03.38 default alphabet, indexed by septet value. 0x1B is the
/// escape septet and is skipped by the decoder.
const ALPHABET: [char; 128] = [
    '@', '£', '$', '¥', 'è', 'é', 'ù', 'ì', 'ò', 'Ç', '\n', 'Ø', 'ø', '\r', 'Å', 'å', 'Δ', '_',
    'Φ', 'Γ', 'Λ', 'Ω', 'Π', 'Ψ', 'Σ', 'Θ', 'Ξ', ' ', 'Æ', 'æ', 'ß', 'É', ' ', '!', '"', '#',
    '¤', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/', '0', '1', '2', '3', '4', '5',
    '6', '7', '8', '9', ':', ';', '<', '=', '>', '?', '¡', 'A', 'B', 'C', 'D', 'E', 'F', 'G',
    'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y',
    'Z', 'Ä', 'Ö', 'Ñ', 'Ü', '§', '¿', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k',
    'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'ä', 'ö', 'ñ',
    'ü', 'à',
];

/// Escape septet (extension table follows; the extension character itself
/// is dropped, matching the original decoder).
const ESCAPE: u8 = 27;

/// Unpack a hex string of GSM 7-bit packed septets into text.
///
/// Invalid hex yields an empty string - the caller's fallback chain
/// treats that as "this was not GSM 7-bit after all".
pub fn decode_gsm7(hex_str: &str) -> String {
    let Ok(bytes) = parse_hex(hex_str) else {
        return String::new();
    };
    if bytes.is_empty() {
        return String::new();
    }

    let septet_count = bytes.len() * 8 / 7;
    let mut out = String::with_capacity(septet_count);

    for i in 0..septet_count {
        let mut septet = 0u8;
        for k in 0..7 {
            let bit_index = i * 7 + k;
            let bit = (bytes[bit_index / 8] >> (bit_index % 8)) & 1;
            septet |= bit << k;
        }
        if septet != ESCAPE {
            out.push(ALPHABET[septet as usize]);
        }
    }

    // Seven packed bytes carry eight septets; an all-zero eighth septet
    // is padding, not a real '@'.
    if bytes.len() % 7 == 0 && out.ends_with('@') {
        out.pop();
    }

    out.trim().to_string()
}

/// Pack text into GSM 7-bit septets, rendered as a hex string. Used to
/// re-encode a USSD request when the carrier rejects the plain form.
pub fn encode_gsm7(msg: &str) -> String {
    let mut out = Vec::with_capacity(msg.len());
    let mut bits: u32 = 0;
    let mut nbits = 0u32;

    for &b in msg.as_bytes() {
        bits |= ((b & 0x7F) as u32) << nbits;
        nbits += 7;
        while nbits >= 8 {
            out.push(bits as u8);
            bits >>= 8;
            nbits -= 8;
        }
    }
    if nbits > 0 {
        out.push(bits as u8);
    }

    crate::utils::bytes_to_hex(&out)
}

/// Decode a UCS-2 (big-endian, hex-rendered) string.
///
/// Invalid hex or an odd number of code units yields an empty string for
/// the same fallback-chain reason as `decode_gsm7`.
pub fn decode_ucs2(hex_str: &str) -> String {
    let Ok(bytes) = parse_hex(hex_str) else {
        return String::new();
    };
    if bytes.is_empty() || bytes.len() % 2 != 0 {
        return String::new();
    }

    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();

    String::from_utf16_lossy(&units).trim().to_string()
}
