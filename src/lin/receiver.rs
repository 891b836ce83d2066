//! Bit-level LIN receiver.
//!
//! The receiver is a two-state machine advanced once per bit timer interrupt.
//! In [`State::DetectBreak`] it counts consecutive dominant samples until a
//! break is recognised. In [`State::ReadData`] the timer has been phased to
//! the centre of each bit and every tick samples exactly one bit of the
//! current byte.
//!
//! Between bytes (and at the end of the break) the handler busy-waits for the
//! next edge, restarting the timer phase on every iteration so no tick fires
//! during the wait. Every wait is bounded by a tick budget from [`Config`];
//! a timed-out wait is the recovery path back to break detection.

use embedded_hal::digital::InputPin;

use super::channel::FrameChannel;
use super::errors::LinError;
use super::frame::{LinFrame, MIN_FRAME_BYTES};
use crate::config::Config;
use crate::hal::{BitPhase, BitTimer, TickSource};

/// Consecutive dominant samples that make a break.
pub const BREAK_LOW_BITS: u8 = 10;

/// Value of the first byte after the break.
pub const SYNC_BYTE: u8 = 0x55;

const START_BIT: u8 = 0;
const STOP_BIT: u8 = 9;

/// Progress through the bytes of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ByteReader {
    /// Completed bytes since the break, sync byte included.
    pub bytes_read: u8,
    /// Bit index within the current byte: 0 start, 1-8 data, 9 stop.
    pub bits_in_byte: u8,
    /// Data bits collected so far.
    pub byte: u8,
    /// Mask of the next data bit.
    pub mask: u8,
}

impl ByteReader {
    const fn starting(bytes_read: u8) -> Self {
        Self {
            bytes_read,
            bits_in_byte: START_BIT,
            byte: 0,
            mask: 0x01,
        }
    }
}

/// Receiver state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Waiting for a break; `low_bits` counts consecutive dominant samples.
    DetectBreak { low_bits: u8 },
    /// Sampling the bytes of a frame at bit centres.
    ReadData(ByteReader),
}

/// Interrupt-driven LIN frame receiver.
///
/// Completed frames and receive errors are published through a shared
/// [`FrameChannel`]; the receiver itself never blocks on the main loop.
pub struct Receiver<'a, RX, T, B> {
    rx: RX,
    ticks: T,
    timer: B,
    config: Config,
    channel: &'a FrameChannel,
    state: State,
    frame: LinFrame,
}

impl<'a, RX, T, B> Receiver<'a, RX, T, B>
where
    RX: InputPin,
    T: TickSource,
    B: BitTimer,
{
    /// Configure the bit timer and start in break detection.
    pub fn new(rx: RX, ticks: T, mut timer: B, config: &Config, channel: &'a FrameChannel) -> Self {
        timer.configure(config);
        debug!("LIN receiver at {} baud, {} ticks per bit", config.baud(), config.ticks_per_bit());
        let mut receiver = Self {
            rx,
            ticks,
            timer,
            config: *config,
            channel,
            state: State::DetectBreak { low_bits: 0 },
            frame: LinFrame::empty(),
        };
        receiver.enter_detect_break();
        receiver
    }

    /// Bit timer interrupt entry point.
    pub fn on_tick(&mut self) {
        // Sample before anything else so the sampling instant does not
        // depend on the state handling below.
        let high = self.sample();
        match self.state {
            State::DetectBreak { low_bits } => self.on_break_sample(high, low_bits),
            State::ReadData(reader) => self.on_data_sample(high, reader),
        }
        self.channel.isr_completed();
    }

    /// Current state.
    pub fn state(&self) -> State {
        self.state
    }

    /// The frame being assembled.
    pub fn partial_frame(&self) -> &LinFrame {
        &self.frame
    }

    /// Release the peripherals.
    pub fn release(self) -> (RX, T, B) {
        (self.rx, self.ticks, self.timer)
    }

    fn enter_detect_break(&mut self) {
        self.state = State::DetectBreak { low_bits: 0 };
    }

    fn enter_read_data(&mut self) {
        self.frame.reset();
        if self.wait_for_line(false, self.config.sync_start_timeout_ticks()) {
            self.timer.set_phase(BitPhase::HalfBit);
            self.state = State::ReadData(ByteReader::starting(0));
        } else {
            trace!("no sync byte after break");
            self.fail(LinError::Other);
        }
    }

    fn on_break_sample(&mut self, high: bool, low_bits: u8) {
        if high {
            self.state = State::DetectBreak { low_bits: 0 };
            return;
        }

        let low_bits = low_bits.saturating_add(1);
        if low_bits < BREAK_LOW_BITS {
            self.state = State::DetectBreak { low_bits };
            return;
        }

        if self.wait_for_line(true, self.config.break_end_timeout_ticks()) {
            self.enter_read_data();
        } else {
            trace!("bus stuck dominant after break");
            self.fail(LinError::Other);
        }
    }

    fn on_data_sample(&mut self, high: bool, mut reader: ByteReader) {
        match reader.bits_in_byte {
            START_BIT => {
                if high {
                    self.fail(Self::framing_error(&reader, LinError::StartBit));
                    return;
                }
            }
            STOP_BIT => {
                if high {
                    self.on_byte_complete(reader);
                } else {
                    self.fail(Self::framing_error(&reader, LinError::StopBit));
                }
                return;
            }
            _ => {
                if high {
                    reader.byte |= reader.mask;
                }
                reader.mask <<= 1;
            }
        }
        reader.bits_in_byte += 1;
        self.state = State::ReadData(reader);
    }

    fn on_byte_complete(&mut self, reader: ByteReader) {
        if reader.bytes_read == 0 {
            if reader.byte != SYNC_BYTE {
                self.fail(LinError::SyncByte);
                return;
            }
        } else {
            // Room is guaranteed: a start bit after a full frame is rejected below.
            self.frame.push(reader.byte);
        }

        if !self.wait_for_line(false, self.config.ticks_until_start_bit()) {
            self.finish_frame();
            return;
        }

        if self.frame.is_full() {
            self.fail(LinError::FrameTooLong);
            return;
        }

        self.timer.set_phase(BitPhase::HalfBit);
        self.state = State::ReadData(ByteReader::starting(reader.bytes_read.saturating_add(1)));
    }

    fn finish_frame(&mut self) {
        if self.frame.len() < MIN_FRAME_BYTES {
            self.fail(LinError::FrameTooShort);
            return;
        }
        trace!("frame complete, {} bytes", self.frame.len());
        self.channel.commit(&self.frame);
        self.enter_detect_break();
    }

    fn fail(&mut self, error: LinError) {
        self.channel.raise(error);
        self.enter_detect_break();
    }

    /// Faults in the sync byte are reported as sync errors.
    fn framing_error(reader: &ByteReader, error: LinError) -> LinError {
        if reader.bytes_read == 0 {
            LinError::SyncByte
        } else {
            error
        }
    }

    fn sample(&mut self) -> bool {
        // An unreadable pin reads as the recessive level.
        self.rx.is_high().unwrap_or(true)
    }

    /// Busy-wait until the line reads `high`, for at most `max_ticks`.
    fn wait_for_line(&mut self, high: bool, max_ticks: u16) -> bool {
        let start = self.ticks.ticks();
        loop {
            self.timer.set_phase(BitPhase::Restart);
            if self.sample() == high {
                return true;
            }
            if self.ticks.ticks().wrapping_sub(start) >= max_ticks {
                return false;
            }
        }
    }
}
