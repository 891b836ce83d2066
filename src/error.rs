//! Error types for LIN adapter operations.
//!
//! This module defines the [`Error`] enum returned by fallible library calls,
//! chiefly the bit-banged [`Transmitter`](crate::Transmitter).
//!
//! Bus-level receive faults (framing, sync, overrun) are *not* reported through
//! this type: they are collected by the [`ErrorAggregator`](crate::ErrorAggregator)
//! as [`ErrorFlags`](crate::ErrorFlags), because they originate in interrupt
//! context where there is no caller to return an error to.
//!
//! # Example
//!
//! ```ignore
//! use lin_slcan::{Error, Transmitter};
//!
//! match transmitter.write_frame(0x21, &payload) {
//!     Ok(()) => {}
//!     Err(Error::InvalidDataLength { len }) => defmt::warn!("bad length {}", len),
//!     Err(e) => return Err(e),
//! }
//! ```

use core::fmt;

use embedded_hal::digital::ErrorKind;

/// Errors that can occur while driving the LIN bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A GPIO operation on the bus pin failed.
    Pin(ErrorKind),

    /// A data frame must carry between 1 and 8 data bytes.
    InvalidDataLength {
        /// Number of data bytes that was requested
        len: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Pin(kind) => write!(f, "Bus pin error: {kind:?}"),
            Error::InvalidDataLength { len } => {
                write!(f, "Invalid data length: expected 1..=8 bytes, got {len}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// A specialized Result type for LIN adapter operations.
///
/// This is defined as `core::result::Result<T, Error>` for convenience.
pub type Result<T> = core::result::Result<T, Error>;
