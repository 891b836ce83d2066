//! Baud-rate derived timing configuration.
//!
//! [`Config`] is computed once at startup from a baud rate and the board's
//! [`Clocks`]. It carries everything the receiver, the bit timer and the
//! transmitter need to agree on bit timing:
//!
//! - bit timer prescaler and compare counts (full bit and half bit)
//! - tick-counter timeouts for the bounded busy-waits in the receiver and
//!   the main loop
//! - bit period in microseconds for the transmitter
//! - the checksum model used when validating received frames
//!
//! Out-of-range baud rates fall back to [`DEFAULT_BAUD`].

use crate::lin::ChecksumType;

/// Baud rate used when the requested rate is outside `MIN_BAUD..=MAX_BAUD`.
pub const DEFAULT_BAUD: u16 = 9600;

/// Lowest supported baud rate.
pub const MIN_BAUD: u16 = 1000;

/// Highest supported baud rate.
pub const MAX_BAUD: u16 = 20000;

/// Baud rates below this use the x64 prescaler, others x8.
pub const PRESCALER_X64_BELOW_BAUD: u16 = 8000;

/// Timer counts added to the half-bit phase to compensate interrupt entry latency.
pub const HALF_BIT_LATENCY_COUNTS: u8 = 2;

/// Maximum idle gap, in bit times, between the stop bit of one byte and the
/// start bit of the next before the frame is considered complete.
pub const MAX_SPACE_BITS: u16 = 6;

/// Bound, in bit times, on the wait for the bus to go recessive after a break.
pub const BREAK_END_TIMEOUT_BITS: u16 = 10;

/// Bound, in bit times, on the wait for the sync byte's start bit after a break.
pub const SYNC_START_TIMEOUT_BITS: u16 = 10;

/// Bound, in bit times, on the main loop's wait for the bit timer interrupt
/// to complete before it opens a critical section.
pub const ISR_FENCE_TIMEOUT_BITS: u16 = 2;

/// Board clock rates feeding the bit timer and the free-running tick counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Clocks {
    /// Input clock of the bit timer before prescaling, in Hz.
    pub timer_hz: u32,
    /// Rate of the free-running [`TickSource`](crate::TickSource), in Hz.
    pub tick_hz: u32,
}

impl Default for Clocks {
    /// 16 MHz CPU clock and a 250 kHz tick counter (x64 prescaled).
    fn default() -> Self {
        Self {
            timer_hz: 16_000_000,
            tick_hz: 250_000,
        }
    }
}

/// Bit timer prescaler selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Prescaler {
    /// Timer clock divided by 8.
    Div8,
    /// Timer clock divided by 64.
    Div64,
}

impl Prescaler {
    /// Division factor applied to the timer input clock.
    pub const fn divisor(self) -> u32 {
        match self {
            Prescaler::Div8 => 8,
            Prescaler::Div64 => 64,
        }
    }

    fn for_baud(baud: u16) -> Self {
        if baud < PRESCALER_X64_BELOW_BAUD {
            Prescaler::Div64
        } else {
            Prescaler::Div8
        }
    }
}

/// Timing configuration derived from a baud rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    baud: u16,
    prescaler: Prescaler,
    counts_per_bit: u8,
    counts_per_half_bit: u8,
    ticks_per_bit: u16,
    ticks_per_half_bit: u16,
    ticks_until_start_bit: u16,
    break_end_timeout_ticks: u16,
    sync_start_timeout_ticks: u16,
    isr_fence_timeout_ticks: u16,
    bit_period_us: u32,
    checksum: ChecksumType,
}

impl Config {
    /// Create a configuration for `baud` with the default [`Clocks`].
    pub fn new(baud: u16) -> Self {
        Self::with_clocks(baud, Clocks::default())
    }

    /// Create a configuration for `baud` with explicit board clocks.
    pub fn with_clocks(baud: u16, clocks: Clocks) -> Self {
        let baud = if (MIN_BAUD..=MAX_BAUD).contains(&baud) {
            baud
        } else {
            DEFAULT_BAUD
        };
        let baud_hz = u32::from(baud);

        let prescaler = Prescaler::for_baud(baud);
        let counts_per_bit = saturate_u8(clocks.timer_hz / prescaler.divisor() / baud_hz);
        let counts_per_half_bit = (counts_per_bit / 2).saturating_add(HALF_BIT_LATENCY_COUNTS);

        let ticks_per_bit = saturate_u16(clocks.tick_hz / baud_hz).max(1);

        Self {
            baud,
            prescaler,
            counts_per_bit,
            counts_per_half_bit,
            ticks_per_bit,
            ticks_per_half_bit: ticks_per_bit / 2,
            ticks_until_start_bit: ticks_per_bit.saturating_mul(MAX_SPACE_BITS),
            break_end_timeout_ticks: ticks_per_bit.saturating_mul(BREAK_END_TIMEOUT_BITS),
            sync_start_timeout_ticks: ticks_per_bit.saturating_mul(SYNC_START_TIMEOUT_BITS),
            isr_fence_timeout_ticks: ticks_per_bit.saturating_mul(ISR_FENCE_TIMEOUT_BITS),
            bit_period_us: 1_000_000 / baud_hz,
            checksum: ChecksumType::configured(),
        }
    }

    /// Override the checksum model used to validate received frames.
    pub fn with_checksum(mut self, checksum: ChecksumType) -> Self {
        self.checksum = checksum;
        self
    }

    /// Effective baud rate after range checking.
    pub fn baud(&self) -> u16 {
        self.baud
    }

    /// Bit timer prescaler.
    pub fn prescaler(&self) -> Prescaler {
        self.prescaler
    }

    /// Bit timer compare value for one full bit period.
    pub fn counts_per_bit(&self) -> u8 {
        self.counts_per_bit
    }

    /// Bit timer counter preload that makes the next tick land mid-bit.
    pub fn counts_per_half_bit(&self) -> u8 {
        self.counts_per_half_bit
    }

    /// Tick-counter ticks per bit period.
    pub fn ticks_per_bit(&self) -> u16 {
        self.ticks_per_bit
    }

    /// Tick-counter ticks per half bit period.
    pub fn ticks_per_half_bit(&self) -> u16 {
        self.ticks_per_half_bit
    }

    /// Ticks to wait for the next start bit before ending the frame.
    pub fn ticks_until_start_bit(&self) -> u16 {
        self.ticks_until_start_bit
    }

    /// Ticks to wait for the bus to go recessive after a detected break.
    pub fn break_end_timeout_ticks(&self) -> u16 {
        self.break_end_timeout_ticks
    }

    /// Ticks to wait for the sync byte's start bit after the break delimiter.
    pub fn sync_start_timeout_ticks(&self) -> u16 {
        self.sync_start_timeout_ticks
    }

    /// Ticks the main loop waits for an interrupt invocation to complete.
    pub fn isr_fence_timeout_ticks(&self) -> u16 {
        self.isr_fence_timeout_ticks
    }

    /// One bit period in microseconds, used by the transmitter.
    pub fn bit_period_us(&self) -> u32 {
        self.bit_period_us
    }

    /// Checksum model for validating received frames.
    pub fn checksum(&self) -> ChecksumType {
        self.checksum
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_BAUD)
    }
}

fn saturate_u8(value: u32) -> u8 {
    u8::try_from(value).unwrap_or(u8::MAX)
}

fn saturate_u16(value: u32) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}
