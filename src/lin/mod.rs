//! LIN bus engine.
//!
//! This module contains everything that touches the bus: the bit-level
//! receiver driven by the bit timer interrupt, the bit-banged transmitter and
//! the frame model shared by both.
//!
//! # Features
//!
//! - Break detection and bit-centre sampling without a hardware UART
//! - Classic (LIN 1.x) and Enhanced (LIN 2.x) checksum support
//! - Protected ID calculation with parity bits
//! - Fixed-size drop-oldest frame queue between interrupt and main loop
//! - Sticky error flags (framing, sync, overrun) read by the main loop
//!
//! # LIN Protocol Overview
//!
//! LIN is a low-cost, single-wire serial network used in automotive applications
//! for communication between sensors, actuators, and ECUs. Key characteristics:
//!
//! - Single master, multiple slave architecture
//! - Frame IDs 0-59 for unconditional frames, 60-61 for diagnostics
//! - Maximum 8 bytes of data per frame
//! - Baud rates: typically 9600, 10400, or 19200 bps
//!
//! A frame on the wire is a break (at least 13 dominant bits and a recessive
//! delimiter), the sync byte `0x55`, the protected identifier, 0-8 data bytes
//! and a checksum. Every byte is a start bit, 8 data bits LSB first and a stop
//! bit.
//!
//! # Example
//!
//! ```ignore
//! use lin_slcan::lin::{FrameChannel, Receiver};
//!
//! static CHANNEL: FrameChannel = FrameChannel::new();
//!
//! // Setup: hand the receiver its pin, tick counter and timer.
//! let mut receiver = Receiver::new(rx_pin, ticks, timer, &config, &CHANNEL);
//!
//! // Bit timer interrupt:
//! receiver.on_tick();
//!
//! // Main loop, with a second handle on the tick counter:
//! let fence_timeout = config.isr_fence_timeout_ticks();
//! while let Some(frame) = CHANNEL.read_next_frame(&mut main_ticks, fence_timeout) {
//!     if frame.is_valid(config.checksum()) { /* forward */ }
//! }
//! ```

pub mod channel;
pub mod checksum;
pub mod errors;
pub mod frame;
pub mod receiver;
pub mod ring;
pub mod transmitter;

pub use channel::{FrameChannel, IsrFence};
pub use checksum::{ChecksumType, MAX_LIN_ID, checksum_with_id, has_valid_parity, protected_id};
pub use errors::{ErrorAggregator, ErrorFlags, LinError};
pub use frame::{LinFrame, MAX_FRAME_BYTES, MAX_LIN_DATA_LEN, MIN_FRAME_BYTES};
pub use receiver::{ByteReader, Receiver, State};
pub use ring::{FRAME_BUFFER_CAPACITY, FrameRingBuffer};
pub use transmitter::{LinWrite, Transmitter};
