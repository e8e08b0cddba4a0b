//! Packet Tests
//!
//! Building, parsing and serializing bus frames.

use bioloid::protocol::{Command, Id, Packet, ParseState, ParseStatus, MAX_FRAME_SIZE};
use proptest::prelude::*;

/// Parse hex like "ff ff 01" into bytes
fn hex(s: &str) -> Vec<u8> {
    s.split_whitespace()
        .map(|b| u8::from_str_radix(b, 16).unwrap())
        .collect()
}

/// Feed bytes until the parser finishes a frame
fn parse(packet: &mut Packet<'_>, bytes: &[u8]) -> ParseStatus {
    for &byte in bytes {
        let status = packet.process_byte(byte);
        if status.is_done() {
            return status;
        }
    }
    ParseStatus::Incomplete
}

fn serialized(packet: &Packet<'_>) -> Vec<u8> {
    let mut out = [0u8; MAX_FRAME_SIZE];
    let len = packet.serialize(&mut out);
    out[..len].to_vec()
}

// =============================================================================
// Construction
// =============================================================================

#[test]
fn test_construct_ping_no_params() {
    let mut packet = Packet::new(&mut []);
    packet.set_id(Id(1));
    packet.set_command(Command::PING);
    packet.set_num_params(0);
    packet.update_checksum();

    assert_eq!(packet.id(), Id(1));
    assert_eq!(packet.length(), 2);
    assert_eq!(packet.command(), Command::PING);
    assert_eq!(packet.num_params(), 0);
    assert_eq!(packet.checksum(), 0xfb);
    assert_eq!(serialized(&packet), hex("ff ff 01 02 01 fb"));
}

#[test]
fn test_construct_write_with_params() {
    let mut storage = [0u8; 8];
    let mut packet = Packet::new(&mut storage);
    packet.set_id(Id::BROADCAST);
    packet.set_command(Command::WRITE);
    packet.set_params(&[0x03, 0x01]);
    packet.update_checksum();

    assert_eq!(packet.length(), 4);
    assert_eq!(packet.num_params(), 2);
    assert_eq!(packet.params(), &[0x03, 0x01]);
    assert_eq!(packet.checksum(), 0xf6);
    assert_eq!(serialized(&packet), hex("ff ff fe 04 03 03 01 f6"));
}

#[test]
fn test_construct_by_filling_storage() {
    let mut storage = [0u8; 2];
    let mut packet = Packet::new(&mut storage);
    packet.set_id(Id::BROADCAST);
    packet.set_command(Command::WRITE);
    packet.params_mut().copy_from_slice(&[0x03, 0x01]);
    packet.set_num_params(2);
    packet.update_checksum();

    assert_eq!(packet.checksum(), 0xf6);
    assert_eq!(packet.frame_len(), 8);
}

// =============================================================================
// Parsing
// =============================================================================

#[test]
fn test_parse_set_id_to_1() {
    let mut storage = [0u8; 32];
    let mut packet = Packet::new(&mut storage);

    assert_eq!(parse(&mut packet, &hex("ff ff fe 04 03 03 01 f6")), ParseStatus::Complete);
    assert_eq!(packet.id(), Id::BROADCAST);
    assert_eq!(packet.length(), 4);
    assert_eq!(packet.command(), Command::WRITE);
    assert_eq!(packet.params(), &[0x03, 0x01]);
    assert_eq!(packet.checksum(), 0xf6);
    assert_eq!(packet.state(), ParseState::Idle);
    assert_eq!(serialized(&packet), hex("ff ff fe 04 03 03 01 f6"));
}

#[test]
fn test_parse_read_internal_temp() {
    let mut storage = [0u8; 32];
    let mut packet = Packet::new(&mut storage);

    assert_eq!(parse(&mut packet, &hex("ff ff 01 04 02 2b 01 cc")), ParseStatus::Complete);
    assert_eq!(packet.id(), Id(1));
    assert_eq!(packet.command(), Command::READ);
    assert_eq!(packet.params(), &[0x2b, 0x01]);
    assert_eq!(packet.checksum(), 0xcc);
}

#[test]
fn test_no_second_sync() {
    let mut storage = [0u8; 32];
    let mut packet = Packet::new(&mut storage);
    assert_eq!(parse(&mut packet, &hex("ff 00")), ParseStatus::Incomplete);
    assert_eq!(packet.state(), ParseState::Idle);
}

#[test]
fn test_leading_noise_is_skipped() {
    let mut storage = [0u8; 32];
    let mut packet = Packet::new(&mut storage);
    assert_eq!(
        parse(&mut packet, &hex("00 ff ff ff 01 04 02 2b 01 cc")),
        ParseStatus::Complete
    );
    assert_eq!(packet.id(), Id(1));
    assert_eq!(packet.params(), &[0x2b, 0x01]);
}

#[test]
fn test_three_syncs() {
    let mut storage = [0u8; 32];
    let mut packet = Packet::new(&mut storage);
    assert_eq!(
        parse(&mut packet, &hex("ff ff ff 01 04 02 2b 01 cc")),
        ParseStatus::Complete
    );
    assert_eq!(packet.command(), Command::READ);
    assert_eq!(packet.checksum(), 0xcc);
}

#[test]
fn test_too_much_data() {
    let mut storage = [0u8; 1];
    let mut packet = Packet::new(&mut storage);

    assert_eq!(parse(&mut packet, &hex("ff ff 01 04 02 2b 01 cc")), ParseStatus::TooMuchData);
    assert_eq!(packet.id(), Id(1));
    assert_eq!(packet.length(), 4);
    assert_eq!(packet.command(), Command::READ);
    assert_eq!(packet.num_params(), 2);
    assert_eq!(packet.params(), &[0x2b]);

    // Only the stored parameter is emitted, and no checksum
    assert_eq!(serialized(&packet), hex("ff ff 01 04 02 2b"));
}

#[test]
fn test_params_exactly_fill_storage() {
    let mut storage = [0u8; 2];
    let mut packet = Packet::new(&mut storage);

    assert_eq!(parse(&mut packet, &hex("ff ff 01 04 02 2b 01 cc")), ParseStatus::Complete);
    assert_eq!(packet.num_params(), 2);
    assert_eq!(packet.params(), &[0x2b, 0x01]);
    assert_eq!(serialized(&packet), hex("ff ff 01 04 02 2b 01 cc"));
}

#[test]
fn test_checksum_mismatch() {
    let mut storage = [0u8; 32];
    let mut packet = Packet::new(&mut storage);

    assert_eq!(
        parse(&mut packet, &hex("ff ff 01 04 02 2b 01 ee")),
        ParseStatus::ChecksumMismatch {
            expected: 0xcc,
            received: 0xee
        }
    );
    assert_eq!(packet.id(), Id(1));
    assert_eq!(packet.params(), &[0x2b, 0x01]);
    assert_eq!(packet.checksum(), 0xee);
    assert_eq!(serialized(&packet), hex("ff ff 01 04 02 2b 01 ee"));
}

#[test]
fn test_packet_reused_after_bad_frame() {
    let mut storage = [0u8; 32];
    let mut packet = Packet::new(&mut storage);

    let mut stream = hex("ff ff 01 04 02 2b 01 ee");
    stream.extend(hex("ff ff fe 04 03 03 01 f6"));

    assert!(matches!(
        parse(&mut packet, &stream[..8]),
        ParseStatus::ChecksumMismatch { .. }
    ));
    assert_eq!(parse(&mut packet, &stream[8..]), ParseStatus::Complete);
    assert_eq!(packet.id(), Id::BROADCAST);
}

// =============================================================================
// Serialization
// =============================================================================

#[test]
fn test_truncated_output() {
    let mut storage = [0u8; 32];
    let mut packet = Packet::new(&mut storage);
    let expected = hex("ff ff fe 04 03 03 01 f6");
    assert_eq!(parse(&mut packet, &expected), ParseStatus::Complete);

    for max_len in 0..expected.len() {
        let mut out = vec![0u8; max_len];
        assert_eq!(packet.serialize(&mut out), max_len);
        assert_eq!(out, &expected[..max_len]);
    }
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_serialized_frame_parses_back(
        id in 0u8..0xff,
        command in any::<u8>(),
        params in proptest::collection::vec(any::<u8>(), 0..=32),
    ) {
        let mut tx_storage = [0u8; 32];
        let mut tx = Packet::new(&mut tx_storage);
        tx.set_id(Id(id));
        tx.set_command(Command(command));
        tx.set_params(&params);
        tx.update_checksum();
        let frame = serialized(&tx);
        prop_assert_eq!(frame.len(), params.len() + 6);

        let mut rx_storage = [0u8; 32];
        let mut rx = Packet::new(&mut rx_storage);
        let statuses: Vec<ParseStatus> = frame.iter().map(|&b| rx.process_byte(b)).collect();

        prop_assert!(statuses[..frame.len() - 1].iter().all(|s| *s == ParseStatus::Incomplete));
        prop_assert_eq!(statuses[frame.len() - 1], ParseStatus::Complete);
        prop_assert_eq!(rx.id(), Id(id));
        prop_assert_eq!(rx.command(), Command(command));
        prop_assert_eq!(rx.params(), &params[..]);
        prop_assert_eq!(serialized(&rx), frame);
    }

    #[test]
    fn prop_corrupted_body_is_rejected(
        id in 0u8..0xfe,
        params in proptest::collection::vec(any::<u8>(), 0..=16),
        position in any::<prop::sample::Index>(),
        flip in 1u8..=0xff,
    ) {
        let mut tx_storage = [0u8; 16];
        let mut tx = Packet::new(&mut tx_storage);
        tx.set_id(Id(id));
        tx.set_command(Command::WRITE);
        tx.set_params(&params);
        tx.update_checksum();
        let mut frame = serialized(&tx);

        // Corrupt one byte after the id; the length byte is left alone so the
        // frame still ends where the checksum is.
        let body = 4 + position.index(frame.len() - 4);
        frame[body] ^= flip;

        let mut rx_storage = [0u8; 16];
        let mut rx = Packet::new(&mut rx_storage);
        let status = parse(&mut rx, &frame);
        let is_mismatch = matches!(status, ParseStatus::ChecksumMismatch { .. });
        prop_assert!(is_mismatch, "status was {:?}", status);
    }
}
