//! Bit-banged LIN transmitter.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use heapless::Vec;

use super::checksum::{checksum_with_id, protected_id};
use super::frame::MAX_LIN_DATA_LEN;
use super::receiver::SYNC_BYTE;
use crate::config::Config;
use crate::error::{Error, Result};

/// Dominant bit times in a transmitted break.
pub const BREAK_BITS: u32 = 13;

/// Recessive bit times between break and sync byte.
pub const BREAK_DELIMITER_BITS: u32 = 1;

/// Sync, identifier, up to 8 data bytes, checksum.
const MAX_WIRE_BYTES: usize = 1 + 1 + MAX_LIN_DATA_LEN + 1;

/// Something that can put a LIN frame on the bus.
pub trait LinWrite {
    /// Send a complete frame (header, data, checksum) as bus master.
    ///
    /// `data` must hold 1-8 bytes.
    fn write_frame(&mut self, address: u8, data: &[u8]) -> Result<()>;

    /// Send a header only, leaving the response to a slave.
    fn write_header(&mut self, address: u8) -> Result<()>;
}

/// Drives the TX pin bit by bit with busy-wait delays.
///
/// Each frame is sent inside a critical section so the timing is not
/// disturbed by interrupts. The receiver is blocked for the same time, so
/// frames cannot be received while transmitting.
pub struct Transmitter<TX, D> {
    tx: TX,
    delay: D,
    bit_period_us: u32,
}

impl<TX, D> Transmitter<TX, D>
where
    TX: OutputPin,
    D: DelayNs,
{
    /// Take ownership of the TX pin and drive it recessive.
    pub fn new(mut tx: TX, delay: D, config: &Config) -> Result<Self> {
        tx.set_high().map_err(pin_error)?;
        Ok(Self {
            tx,
            delay,
            bit_period_us: config.bit_period_us(),
        })
    }

    /// Duration of one bit in microseconds.
    pub fn bit_period_us(&self) -> u32 {
        self.bit_period_us
    }

    /// Release the pin and delay provider.
    pub fn release(self) -> (TX, D) {
        (self.tx, self.delay)
    }

    fn send(&mut self, wire: &[u8]) -> Result<()> {
        critical_section::with(|_| {
            self.hold(false, BREAK_BITS)?;
            self.hold(true, BREAK_DELIMITER_BITS)?;
            wire.iter().try_for_each(|&byte| self.send_byte(byte))
        })
    }

    fn send_byte(&mut self, byte: u8) -> Result<()> {
        self.hold(false, 1)?;
        for bit in 0..8 {
            self.hold(byte & (1 << bit) != 0, 1)?;
        }
        self.hold(true, 1)
    }

    fn hold(&mut self, high: bool, bits: u32) -> Result<()> {
        if high {
            self.tx.set_high()
        } else {
            self.tx.set_low()
        }
        .map_err(pin_error)?;
        self.delay.delay_us(self.bit_period_us.saturating_mul(bits));
        Ok(())
    }
}

impl<TX, D> LinWrite for Transmitter<TX, D>
where
    TX: OutputPin,
    D: DelayNs,
{
    fn write_frame(&mut self, address: u8, data: &[u8]) -> Result<()> {
        if data.is_empty() || data.len() > MAX_LIN_DATA_LEN {
            return Err(Error::InvalidDataLength { len: data.len() });
        }

        let pid = protected_id(address);
        let mut wire: Vec<u8, MAX_WIRE_BYTES> = Vec::new();
        // Cannot overflow: length checked above.
        let _ = wire.push(SYNC_BYTE);
        let _ = wire.push(pid);
        let _ = wire.extend_from_slice(data);
        let _ = wire.push(checksum_with_id(pid, data));

        trace!("TX frame id={} len={}", address, data.len());
        self.send(&wire)
    }

    fn write_header(&mut self, address: u8) -> Result<()> {
        self.send(&[SYNC_BYTE, protected_id(address)])
    }
}

fn pin_error<E: digital::Error>(error: E) -> Error {
    Error::Pin(error.kind())
}
