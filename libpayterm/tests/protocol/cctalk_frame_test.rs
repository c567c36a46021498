use libpayterm::Error;
use libpayterm::protocol::cctalk::{self, Command, Frame};
use libpayterm::test_support::cctalk_answer;

#[test]
fn request_frame_layout() {
    let raw = Command::SimplePoll.encode();
    // [dest=2][len=0][src=1][0xFE][crc]
    assert_eq!(raw.len(), 5);
    assert_eq!(raw[0], cctalk::ACCEPTOR_ADDRESS);
    assert_eq!(raw[2], cctalk::HOST_ADDRESS);
    assert_eq!(raw[3], 0xFE);

    // CRC closes the byte sum to zero.
    let sum = raw.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    assert_eq!(sum, 0);
}

#[test]
fn answer_roundtrip_recovers_data() {
    let data = [0x03u8, 0x02, 0x01];
    let frame = Frame::decode_response(&cctalk_answer(&data)).unwrap();
    assert_eq!(frame.data, data);
    assert_eq!(frame.source, cctalk::ACCEPTOR_ADDRESS);
}

#[test]
fn single_bit_corruption_is_detected() {
    let raw = cctalk_answer(&[0x10, 0x20]);
    for byte_idx in 0..raw.len() {
        for bit in 0..8u8 {
            let mut corrupt = raw.clone();
            corrupt[byte_idx] ^= 1 << bit;
            assert!(
                Frame::decode_response(&corrupt).is_err(),
                "bit {} of byte {} slipped through",
                bit,
                byte_idx
            );
        }
    }
}

#[test]
fn truncated_answer_is_length_error() {
    let raw = cctalk_answer(&[0x10, 0x20]);
    match Frame::decode_response(&raw[..raw.len() - 2]) {
        Err(Error::InvalidLength { .. }) => {}
        other => panic!("expected InvalidLength, got {:?}", other),
    }
}

#[test]
fn bare_nak_and_busy_are_not_frames() {
    assert!(cctalk::is_nak(&[cctalk::NAK]));
    assert!(cctalk::is_busy(&[cctalk::BUSY]));
    assert!(Frame::decode_response(&[cctalk::NAK]).is_err());
}
