//! Host encoding of received frames.
//!
//! A frame is reported as `t`, the identifier byte in hex, and for frames
//! with data a space, the data length digit, the data bytes and the checksum
//! byte in hex, terminated by CR:
//!
//! ```text
//! tc1 21234b9\r      identifier 0xC1, 2 data bytes, checksum 0xB9
//! t3c\r              header only
//! ```

use heapless::Vec;

use super::command::CR;
use super::hex::encode_byte;
use crate::lin::{ChecksumType, LinFrame, MAX_FRAME_BYTES};
use crate::serial::SerialTx;

/// Longest encoded frame: `t`, 10 hex byte pairs, space, length digit, CR.
pub const MAX_ENCODED_LEN: usize = 1 + 2 * MAX_FRAME_BYTES + 2 + 1;

/// Length digit for a frame of `frame_len` bytes: data byte count `1`-`8`,
/// `0` for anything else.
pub const fn data_length_digit(frame_len: usize) -> u8 {
    match frame_len.wrapping_sub(2) {
        n @ 1..=8 => b'0' + n as u8,
        _ => b'0',
    }
}

/// Encode `frame` into its host line.
pub fn encode_frame(frame: &LinFrame) -> Vec<u8, MAX_ENCODED_LEN> {
    let mut line = Vec::new();
    // Capacity covers the longest frame, so pushes cannot fail.
    let _ = line.push(b't');
    for (i, &byte) in frame.bytes().iter().enumerate() {
        if i == 1 {
            let _ = line.push(b' ');
            let _ = line.push(data_length_digit(frame.len()));
        }
        let _ = line.extend_from_slice(&encode_byte(byte));
    }
    let _ = line.push(CR);
    line
}

/// Queue the host line for `frame` on `tx`.
pub fn write_frame<T: SerialTx + ?Sized>(frame: &LinFrame, tx: &mut T) {
    tx.write_all(&encode_frame(frame));
}

/// Forward `frame` if it passes validation.
///
/// Invalid frames are dropped silently. Returns whether the frame was sent.
pub fn forward_frame<T: SerialTx + ?Sized>(
    frame: &LinFrame,
    checksum_type: ChecksumType,
    tx: &mut T,
) -> bool {
    if !frame.is_valid(checksum_type) {
        return false;
    }
    write_frame(frame, tx);
    true
}
