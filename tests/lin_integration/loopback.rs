//! Transmitter output fed back into the receiver.

use lin_slcan::lin::checksum_with_id;
use lin_slcan::{ChecksumType, Error, FrameChannel, LinFrame, LinWrite, Transmitter};

use crate::sim::{self, SimDelay, SimLine, SimTxPin, Waveform};
use crate::{drain, errors, receive};

fn transmit<F>(write: F) -> Waveform
where
    F: FnOnce(&mut Transmitter<SimTxPin, SimDelay>),
{
    let line = SimLine::new();
    let mut transmitter = Transmitter::new(line.tx_pin(), line.delay(), &sim::config()).unwrap();
    write(&mut transmitter);
    assert!(line.level(), "line released recessive");
    Waveform::new().idle(2).samples(&line.recorded()).idle(10)
}

#[test]
fn transmitted_frames_decode_identically() {
    let cases: [(u8, &[u8]); 5] = [
        (0x0A, &[0xAA, 0xBB]),
        (0x01, &[0x12, 0x34]),
        (0x00, &[0x00]),
        (0x3F, &[0xFF; 8]),
        (0x2B, &[0x80, 0x7F, 0x01]),
    ];

    for (address, data) in cases {
        let channel = FrameChannel::new();
        receive(transmit(|tx| tx.write_frame(address, data).unwrap()), &channel);

        let frames = drain(&channel);
        assert_eq!(frames.len(), 1, "address {address:#04x}");
        let frame = frames[0];
        assert_eq!(frame, LinFrame::with_checksum(address, data, ChecksumType::Enhanced));
        assert!(frame.is_valid(ChecksumType::Enhanced));
        assert_eq!(frame.data(), data);
        assert!(errors(&channel).is_empty());
    }
}

#[test]
fn transmit_checksum_covers_identifier() {
    let channel = FrameChannel::new();
    receive(transmit(|tx| tx.write_frame(0x0A, &[0xAA, 0xBB]).unwrap()), &channel);

    let frame = drain(&channel)[0];
    assert_eq!(frame.bytes(), [0xCA, 0xAA, 0xBB, 0xCE]);
    assert_eq!(frame.checksum_byte(), Some(checksum_with_id(0xCA, &[0xAA, 0xBB])));
}

#[test]
fn altered_byte_fails_validation() {
    let channel = FrameChannel::new();
    receive(transmit(|tx| tx.write_frame(0x01, &[0x12, 0x34, 0x56]).unwrap()), &channel);
    let frame = drain(&channel)[0];
    assert!(frame.is_valid(ChecksumType::Enhanced));

    for index in 0..frame.len() - 1 {
        let mut bytes = frame.bytes().to_vec();
        bytes[index] ^= 0x01;
        let altered = LinFrame::from_bytes(&bytes).unwrap();
        assert!(!altered.is_valid(ChecksumType::Enhanced), "byte {index}");
    }
}

#[test]
fn transmitted_header_decodes_as_single_byte() {
    let channel = FrameChannel::new();
    receive(transmit(|tx| tx.write_header(0x3C).unwrap()), &channel);

    let frames = drain(&channel);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].bytes(), [0x3C]);
}

#[test]
fn invalid_length_sends_nothing() {
    let wave = transmit(|tx| {
        assert_eq!(
            tx.write_frame(0x01, &[0; 9]),
            Err(Error::InvalidDataLength { len: 9 })
        );
    });
    let channel = FrameChannel::new();
    receive(wave, &channel);
    assert!(drain(&channel).is_empty());
    assert!(errors(&channel).is_empty());
}
