use libpayterm::Error;
use libpayterm::protocol::ebds::{self, decode, encode, poll_body};

#[test]
fn poll_request_layout() {
    let raw = encode(&poll_body(true, 0), false);
    assert_eq!(raw[0], ebds::PREFIX);
    assert_eq!(raw[1] as usize, raw.len());
    assert_eq!(raw[raw.len() - 2], ebds::POSTFIX);
    // XOR of length..postfix equals the trailer.
    let crc = raw[1..raw.len() - 1]
        .iter()
        .fold(0u8, |acc, &b| acc ^ b);
    assert_eq!(raw[raw.len() - 1], crc);
}

#[test]
fn stack_and_return_actions_set_their_bits() {
    let stack = poll_body(true, ebds::STACK);
    let ret = poll_body(true, ebds::RETURN);
    assert_eq!(stack[2] & ebds::STACK, ebds::STACK);
    assert_eq!(ret[2] & ebds::RETURN, ebds::RETURN);
    // Escrow and orientation stay set either way.
    assert_eq!(stack[2] & ebds::BYTE1, ebds::BYTE1);
}

#[test]
fn ack_bit_must_match() {
    let request = encode(&poll_body(true, 0), true);
    let wrong = encode(&[0x20, 0x01, 0x10, 0x00], false);
    match decode(&request, &wrong) {
        Err(Error::AckMismatch { .. }) => {}
        other => panic!("expected AckMismatch, got {:?}", other),
    }
}

#[test]
fn extended_marker_strips_subtype_byte() {
    let request = encode(&[0x70, 0x02], false);
    let response = encode(&[0x70, 0x02, 0x11, 0x22], false);
    assert_eq!(decode(&request, &response).unwrap(), vec![0x11, 0x22]);

    let plain_request = encode(&[0x20, 0x01], false);
    let plain = encode(&[0x20, 0x11, 0x22], false);
    assert_eq!(decode(&plain_request, &plain).unwrap(), vec![0x11, 0x22]);
}

#[test]
fn single_bit_corruption_is_detected() {
    let request = encode(&poll_body(true, 0), false);
    let response = encode(&[0x20, 0x01, 0x10, 0x00], false);
    for byte_idx in 0..response.len() {
        for bit in 0..8u8 {
            let mut corrupt = response.clone();
            corrupt[byte_idx] ^= 1 << bit;
            assert!(
                decode(&request, &corrupt).is_err(),
                "bit {} of byte {} slipped through",
                bit,
                byte_idx
            );
        }
    }
}
