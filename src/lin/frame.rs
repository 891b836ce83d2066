//! LIN frame buffer.
//!
//! A [`LinFrame`] holds the bytes of one frame as seen on the bus after the
//! sync byte: protected identifier, 0-8 data bytes and, when data is present,
//! the checksum byte. It is a fixed-size `Copy` value so it can be moved
//! between interrupt and main-loop context without allocation.

use super::checksum::{self, ChecksumType, MAX_LIN_ID};

/// Maximum LIN frame data size (8 bytes).
pub const MAX_LIN_DATA_LEN: usize = 8;

/// Bytes in the shortest frame: identifier only, no slave response.
pub const MIN_FRAME_BYTES: usize = 1;

/// Bytes in the longest frame: identifier, 8 data bytes, checksum.
pub const MAX_FRAME_BYTES: usize = 1 + MAX_LIN_DATA_LEN + 1;

/// A LIN frame as received from or sent to the bus.
///
/// # Byte Layout
///
/// - Byte 0: Protected identifier (6-bit address + 2 parity bits)
/// - Bytes 1..n-1: Data (1-8 bytes)
/// - Byte n-1: Checksum
///
/// A frame of length 1 is a header with no slave response. Length 2 is never
/// valid. The sync byte (`0x55`) is not stored.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinFrame {
    bytes: [u8; MAX_FRAME_BYTES],
    len: u8,
}

impl LinFrame {
    /// Create an empty frame.
    pub const fn empty() -> Self {
        Self {
            bytes: [0; MAX_FRAME_BYTES],
            len: 0,
        }
    }

    /// Create a frame from raw bus bytes (identifier first, checksum last).
    ///
    /// Returns `None` if `bytes` is longer than [`MAX_FRAME_BYTES`].
    /// No validation is performed.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() > MAX_FRAME_BYTES {
            return None;
        }
        let mut frame = Self::empty();
        frame.bytes[..bytes.len()].copy_from_slice(bytes);
        frame.len = bytes.len() as u8;
        Some(frame)
    }

    /// Create a header-only frame for `address` (0-63).
    pub fn header(address: u8) -> Self {
        let mut frame = Self::empty();
        frame.push(checksum::protected_id(address));
        frame
    }

    /// Create a complete frame with a computed checksum.
    ///
    /// # Arguments
    /// * `address` - Frame ID (0-63, upper bits ignored)
    /// * `data` - Frame data (truncated to 8 bytes; empty gives a header-only frame)
    /// * `checksum_type` - Checksum model
    pub fn with_checksum(address: u8, data: &[u8], checksum_type: ChecksumType) -> Self {
        let mut frame = Self::header(address);
        if data.is_empty() {
            return frame;
        }
        for &byte in data.iter().take(MAX_LIN_DATA_LEN) {
            frame.push(byte);
        }
        let sum = checksum::checksum(frame.bytes(), checksum_type);
        frame.push(sum);
        frame
    }

    /// Clear the frame for reuse.
    #[inline]
    pub fn reset(&mut self) {
        self.len = 0;
    }

    /// Append a byte. Returns `false` if the frame is already full.
    #[inline]
    pub fn push(&mut self, byte: u8) -> bool {
        match self.bytes.get_mut(self.len as usize) {
            Some(slot) => {
                *slot = byte;
                self.len += 1;
                true
            }
            None => false,
        }
    }

    /// Number of bytes in the frame.
    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Check if the frame holds no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check if the frame holds [`MAX_FRAME_BYTES`] bytes.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= MAX_FRAME_BYTES
    }

    /// All frame bytes: identifier, data, checksum.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes[..self.len()]
    }

    /// The protected identifier byte.
    pub fn id_byte(&self) -> Option<u8> {
        self.bytes().first().copied()
    }

    /// The 6-bit frame address.
    pub fn address(&self) -> Option<u8> {
        self.id_byte().map(|id| id & MAX_LIN_ID)
    }

    /// Get the data slice (empty for header-only frames).
    pub fn data(&self) -> &[u8] {
        match self.len() {
            0..=2 => &[],
            n => &self.bytes[1..n - 1],
        }
    }

    /// Number of data bytes.
    pub fn data_len(&self) -> usize {
        self.data().len()
    }

    /// The checksum byte, if the frame carries data.
    pub fn checksum_byte(&self) -> Option<u8> {
        match self.len() {
            0..=2 => None,
            n => Some(self.bytes[n - 1]),
        }
    }

    /// Length is 1 (header only) or 3-10 (identifier, data, checksum).
    pub fn is_structurally_valid(&self) -> bool {
        let n = self.len();
        n == MIN_FRAME_BYTES || (3..=MAX_FRAME_BYTES).contains(&n)
    }

    /// The identifier byte's parity bits match its address.
    pub fn has_valid_parity(&self) -> bool {
        self.id_byte().is_some_and(checksum::has_valid_parity)
    }

    /// The trailing checksum byte matches the frame contents.
    ///
    /// Header-only frames have no checksum and always pass.
    pub fn has_valid_checksum(&self, checksum_type: ChecksumType) -> bool {
        match self.len() {
            0 => false,
            1 => true,
            n => self.bytes[n - 1] == checksum::checksum(&self.bytes[..n - 1], checksum_type),
        }
    }

    /// Full validation: length, identifier parity and checksum.
    pub fn is_valid(&self, checksum_type: ChecksumType) -> bool {
        self.is_structurally_valid()
            && self.has_valid_parity()
            && self.has_valid_checksum(checksum_type)
    }
}

impl PartialEq for LinFrame {
    fn eq(&self, other: &Self) -> bool {
        self.bytes() == other.bytes()
    }
}

impl Eq for LinFrame {}

#[cfg(feature = "can")]
mod can_frame {
    use embedded_can::{Frame, Id, StandardId};

    use super::{ChecksumType, LinFrame, MAX_LIN_DATA_LEN};
    use crate::lin::checksum::MAX_LIN_ID;

    fn address_of(id: Id) -> Option<u8> {
        match id {
            Id::Standard(id) if id.as_raw() <= u16::from(MAX_LIN_ID) => Some(id.as_raw() as u8),
            _ => None,
        }
    }

    /// View a LIN frame through the `embedded-can` API, mapping the 6-bit
    /// address to a standard identifier. Header-only frames appear as remote
    /// frames.
    impl Frame for LinFrame {
        fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
            if data.len() > MAX_LIN_DATA_LEN {
                return None;
            }
            let address = address_of(id.into())?;
            Some(LinFrame::with_checksum(
                address,
                data,
                ChecksumType::configured(),
            ))
        }

        fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
            if dlc > MAX_LIN_DATA_LEN {
                return None;
            }
            address_of(id.into()).map(LinFrame::header)
        }

        fn is_extended(&self) -> bool {
            false
        }

        fn is_remote_frame(&self) -> bool {
            self.len() == 1
        }

        fn id(&self) -> Id {
            let address = u16::from(self.address().unwrap_or(0));
            Id::Standard(StandardId::new(address).unwrap_or(StandardId::ZERO))
        }

        fn dlc(&self) -> usize {
            self.data_len()
        }

        fn data(&self) -> &[u8] {
            LinFrame::data(self)
        }
    }
}
