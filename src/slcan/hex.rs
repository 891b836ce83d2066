//! ASCII hex helpers.

const DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Value of one hex digit. Anything that is not a hex digit decodes as 0.
pub const fn decode_nibble(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'A'..=b'F' => c - b'A' + 10,
        b'a'..=b'f' => c - b'a' + 10,
        _ => 0,
    }
}

/// Lowercase hex digit for the low nibble of `value`.
pub const fn encode_nibble(value: u8) -> u8 {
    DIGITS[(value & 0x0F) as usize]
}

/// Decode `digits` as a big-endian hex number, keeping the low 8 bits.
///
/// Missing digits are not an error: an empty slice decodes as 0.
pub fn decode_u8(digits: &[u8]) -> u8 {
    digits
        .iter()
        .fold(0u8, |acc, &c| (acc << 4) | decode_nibble(c))
}

/// The two lowercase hex digits of `byte`.
pub const fn encode_byte(byte: u8) -> [u8; 2] {
    [encode_nibble(byte >> 4), encode_nibble(byte)]
}
