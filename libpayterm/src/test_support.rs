//! Test support helpers intended for use by unit and integration tests.
//!
//! These helpers centralize common MockTransport setup so tests across the
//! crate and tests/ directory can reuse the same response framing.
#![allow(dead_code)]

use crate::protocol::{ccnet, cctalk, ebds};
use crate::transport::{MockTransport, Transport};

/// Build a MockTransport pre-seeded with the given response chunks and
/// return it boxed as a Transport trait object.
#[doc(hidden)]
pub fn boxed_mock_with_responses(responses: Vec<Vec<u8>>) -> Box<dyn Transport> {
    let mut mock = MockTransport::new();
    for resp in responses {
        mock.push_response(resp);
    }
    Box::new(mock)
}

/// Frame a CCNET device answer (no command byte, just answer data).
#[doc(hidden)]
pub fn ccnet_answer(data: &[u8]) -> Vec<u8> {
    ccnet::Frame::encode_raw(data)
}

/// CCNET poll answer for a state byte with optional parameter.
#[doc(hidden)]
pub fn ccnet_poll_answer(state: u8, param: Option<u8>) -> Vec<u8> {
    match param {
        Some(p) => ccnet_answer(&[state, p]),
        None => ccnet_answer(&[state]),
    }
}

/// CCNET identification answer: 15 bytes part number, 12 bytes serial.
#[doc(hidden)]
pub fn ccnet_identification(part: &str, serial: &str) -> Vec<u8> {
    let mut data = vec![b' '; 27];
    for (i, b) in part.bytes().take(15).enumerate() {
        data[i] = b;
    }
    for (i, b) in serial.bytes().take(12).enumerate() {
        data[15 + i] = b;
    }
    ccnet_answer(&data)
}

/// Frame a ccTalk answer addressed to the host: `[01][len][02][0][data][crc]`.
#[doc(hidden)]
pub fn cctalk_answer(data: &[u8]) -> Vec<u8> {
    let mut raw = vec![
        cctalk::HOST_ADDRESS,
        data.len() as u8,
        cctalk::ACCEPTOR_ADDRESS,
        0x00,
    ];
    raw.extend_from_slice(data);
    raw.push(cctalk::crc8(&raw));
    raw
}

/// A ccTalk buffered-credit answer: counter plus five result pairs.
#[doc(hidden)]
pub fn cctalk_credit_answer(counter: u8, pairs: &[(u8, u8)]) -> Vec<u8> {
    let mut data = vec![counter];
    for &(coin, sorter) in pairs.iter().take(5) {
        data.push(coin);
        data.push(sorter);
    }
    while data.len() < 11 {
        data.push(0);
    }
    cctalk_answer(&data)
}

/// Frame an EBDS device answer carrying `body` with the given ACK bit.
#[doc(hidden)]
pub fn ebds_answer(body: &[u8], ack: bool) -> Vec<u8> {
    ebds::encode(body, ack)
}

/// Wrap text into a modem answer: CRLF, text, CRLF.
#[doc(hidden)]
pub fn at_answer(text: &str) -> Vec<u8> {
    let mut raw = b"\r\n".to_vec();
    raw.extend_from_slice(text.as_bytes());
    raw.extend_from_slice(b"\r\n");
    raw
}
