//! Bus error flags.
//!
//! The receiver runs in interrupt context and cannot return errors to anyone,
//! so every framing fault it sees is OR-ed into an [`ErrorAggregator`]. The
//! main loop periodically takes and clears the accumulated [`ErrorFlags`].

use core::cell::Cell;
use core::fmt;

use critical_section::Mutex;

/// A single kind of receive fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum LinError {
    /// The frame ended before an identifier byte was received.
    FrameTooShort = 1 << 0,
    /// Another byte started after the frame already held 10 bytes.
    FrameTooLong = 1 << 1,
    /// A start bit sampled recessive.
    StartBit = 1 << 2,
    /// A stop bit sampled dominant.
    StopBit = 1 << 3,
    /// The sync byte was malformed or not `0x55`.
    SyncByte = 1 << 4,
    /// The frame ring buffer was full and the oldest frame was dropped.
    BufferOverrun = 1 << 5,
    /// Any other fault, e.g. a bus stuck dominant after a break.
    Other = 1 << 6,
}

impl LinError {
    /// Every error kind, in bit order.
    pub const ALL: [LinError; 7] = [
        LinError::FrameTooShort,
        LinError::FrameTooLong,
        LinError::StartBit,
        LinError::StopBit,
        LinError::SyncByte,
        LinError::BufferOverrun,
        LinError::Other,
    ];

    /// Bit mask of this error in [`ErrorFlags`].
    pub const fn mask(self) -> u8 {
        self as u8
    }

    /// Four-letter tag used in log output.
    pub const fn short_name(self) -> &'static str {
        match self {
            LinError::FrameTooShort => "SHRT",
            LinError::FrameTooLong => "LONG",
            LinError::StartBit => "STRT",
            LinError::StopBit => "STOP",
            LinError::SyncByte => "SYNC",
            LinError::BufferOverrun => "OVRN",
            LinError::Other => "OTHR",
        }
    }
}

/// Bitmask of pending [`LinError`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ErrorFlags(u8);

impl ErrorFlags {
    /// No errors.
    pub const EMPTY: Self = Self(0);

    /// Create flags from raw byte.
    pub const fn from_byte(value: u8) -> Self {
        Self(value)
    }

    /// Get raw byte value.
    pub const fn to_byte(self) -> u8 {
        self.0
    }

    /// Check if no error is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Check if `error` is set.
    pub const fn contains(self, error: LinError) -> bool {
        self.0 & error.mask() != 0
    }

    /// Set `error`.
    pub fn insert(&mut self, error: LinError) {
        self.0 |= error.mask();
    }

    /// Union of both flag sets.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Iterate over the set errors in bit order.
    pub fn iter(self) -> impl Iterator<Item = LinError> {
        LinError::ALL.into_iter().filter(move |e| self.contains(*e))
    }
}

impl From<LinError> for ErrorFlags {
    fn from(error: LinError) -> Self {
        Self(error.mask())
    }
}

impl core::ops::BitOr for ErrorFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl core::ops::BitOrAssign for ErrorFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl fmt::Display for ErrorFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for error in self.iter() {
            if !first {
                f.write_str(" ")?;
            }
            f.write_str(error.short_name())?;
            first = false;
        }
        Ok(())
    }
}

/// Interrupt-writable, main-loop-readable error mask.
pub struct ErrorAggregator {
    flags: Mutex<Cell<ErrorFlags>>,
}

impl ErrorAggregator {
    /// Create an aggregator with no pending errors.
    pub const fn new() -> Self {
        Self {
            flags: Mutex::new(Cell::new(ErrorFlags::EMPTY)),
        }
    }

    /// OR `flags` into the pending set. Safe to call from interrupt context.
    pub fn raise(&self, flags: impl Into<ErrorFlags>) {
        let flags = flags.into();
        critical_section::with(|cs| {
            let cell = self.flags.borrow(cs);
            cell.set(cell.get() | flags);
        });
    }

    /// Read and clear the pending set atomically.
    pub fn take(&self) -> ErrorFlags {
        critical_section::with(|cs| self.flags.borrow(cs).replace(ErrorFlags::EMPTY))
    }

    /// Read the pending set without clearing it.
    pub fn peek(&self) -> ErrorFlags {
        critical_section::with(|cs| self.flags.borrow(cs).get())
    }
}

impl Default for ErrorAggregator {
    fn default() -> Self {
        Self::new()
    }
}
