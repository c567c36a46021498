use libpayterm::protocol::at::{self, FinalResult, gsm};

#[test]
fn terminal_classification_covers_the_fixed_set() {
    for (text, expected) in [
        ("OK", FinalResult::Ok),
        ("CONNECT", FinalResult::Connect),
        ("CONNECT 2400", FinalResult::Connect),
        ("BUSY", FinalResult::Busy),
        ("RING", FinalResult::Ring),
        ("ERROR", FinalResult::Error),
        ("NO ANSWER", FinalResult::NoAnswer),
        ("NO CARRIER", FinalResult::NoCarrier),
        ("NO DIALTONE", FinalResult::NoDialtone),
        ("+CSQ: 18,0", FinalResult::Unknown),
    ] {
        assert_eq!(FinalResult::classify(text), expected, "for {:?}", text);
    }
}

#[test]
fn response_unwrap_cuts_between_crlf_pairs() {
    let raw = b"ATI\r\nE173 GSM modem\r\n\r\nOK\r\n";
    let text = at::unwrap_response(raw).unwrap();
    assert!(text.starts_with("E173"));
    assert!(text.contains("OK"));
}

#[test]
fn unpack_rejects_error_answers() {
    let raw = b"\r\n+CME ERROR: 10\r\n";
    assert!(at::unpack(raw).is_err());
}

#[test]
fn cusd_envelope_and_extractors() {
    let text = "+CUSD: 0,\"Balans: 12.50 TJS\",15";
    assert_eq!(at::extract_cusd(text), Some("Balans: 12.50 TJS"));
    assert_eq!(at::extract_quoted("+COPS: 0,0,\"Megafon\",7"), Some("Megafon"));
    assert_eq!(at::extract_csq("+CSQ: 23,99"), Some(23));
}

#[test]
fn gsm7_pack_unpack_roundtrip() {
    for text in ["*100#", "Balans: 12.50", "992901234567", "a"] {
        let packed = gsm::encode_gsm7(text);
        assert_eq!(gsm::decode_gsm7(&packed), text);
    }
}

#[test]
fn gsm7_decode_of_invalid_hex_is_empty_not_panic() {
    assert_eq!(gsm::decode_gsm7("not hex at all"), "");
    assert_eq!(gsm::decode_gsm7("f"), "");
}

#[test]
fn ucs2_decode_handles_cyrillic_and_ascii() {
    assert_eq!(gsm::decode_ucs2("00480069"), "Hi");
    assert_eq!(gsm::decode_ucs2("04110430043B0430043D0441"), "Баланс");
    assert_eq!(gsm::decode_ucs2("xyz"), "");
}

#[test]
fn sms_length_matches_pdu_rounding() {
    assert_eq!(at::sms_length("0011223344"), 4);
    assert_eq!(at::sms_length("00112233445"), 5);
    assert_eq!(at::sms_send(4), "AT+CMGS=4");
}
