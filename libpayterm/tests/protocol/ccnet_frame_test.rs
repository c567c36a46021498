use libpayterm::protocol::ccnet::{self, Command, Frame, first_valid, scan_frames};
use libpayterm::test_support::ccnet_answer;

#[test]
fn request_frame_layout() {
    let raw = Command::Poll.encode();
    assert_eq!(raw, {
        let head = [ccnet::SYNC, ccnet::VALIDATOR_ADDRESS, 0x06, 0x33];
        let crc = ccnet::crc16(&head);
        let mut v = head.to_vec();
        v.push(crc as u8);
        v.push((crc >> 8) as u8);
        v
    });
}

#[test]
fn answer_roundtrip_recovers_data() {
    let frame = Frame::decode(&ccnet_answer(&[0x80, 0x04])).unwrap();
    assert_eq!(frame.data, vec![0x80, 0x04]);
}

#[test]
fn single_bit_corruption_is_detected() {
    let raw = ccnet_answer(&[0x14, 0x00, 0x42]);
    for byte_idx in 0..raw.len() {
        for bit in 0..8u8 {
            let mut corrupt = raw.clone();
            corrupt[byte_idx] ^= 1 << bit;
            assert!(
                Frame::decode(&corrupt).is_err(),
                "bit {} of byte {} slipped through",
                bit,
                byte_idx
            );
        }
    }
}

#[test]
fn resynchronization_skips_garbage_prefix() {
    // One garbage byte, then a valid frame: the scanner must find and
    // validate the embedded frame.
    let valid = ccnet_answer(&[0x14]);
    let mut burst = vec![0xA7u8];
    burst.extend_from_slice(&valid);

    let frame = first_valid(&burst).expect("embedded frame not found");
    assert_eq!(frame.data, vec![0x14]);
}

#[test]
fn resynchronization_survives_corrupted_length() {
    // A rogue SYNC whose length byte points past the buffer must not
    // panic and must not shadow the real frame that follows.
    let valid = ccnet_answer(&[0x19]);
    let mut burst = vec![ccnet::SYNC, ccnet::VALIDATOR_ADDRESS, 0xF0];
    burst.extend_from_slice(&valid);

    let frame = first_valid(&burst).expect("frame after rogue sync not found");
    assert_eq!(frame.data, vec![0x19]);
}

#[test]
fn concatenated_answers_split_into_candidates() {
    let mut burst = ccnet_answer(&[0x14]);
    burst.extend_from_slice(&ccnet_answer(&[0x19]));
    burst.extend_from_slice(&ccnet_answer(&[0x15]));

    let candidates = scan_frames(&burst);
    assert_eq!(candidates.len(), 3);
    for candidate in candidates {
        assert!(Frame::decode(candidate).is_ok());
    }
}

#[test]
fn crc16_reference_vector() {
    // The polynomial is the reversed CCITT 0x8408; spot-check symmetry
    // properties rather than a table: appending the CRC bytes and
    // recomputing over the whole frame is how the wire check works.
    let frame = ccnet_answer(&[0x33]);
    let expected = ccnet::crc16(&frame[..frame.len() - 2]);
    let stored = u16::from_le_bytes([frame[frame.len() - 2], frame[frame.len() - 1]]);
    assert_eq!(expected, stored);
}
