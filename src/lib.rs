#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
#![cfg_attr(not(feature = "defmt"), forbid(unsafe_code))]

//! # lin-slcan
//!
//! A `no_std` LIN (Local Interconnect Network) bus engine for small
//! microcontrollers that presents the bus to a host computer using the
//! Lawicel/SLCAN ASCII protocol normally spoken by serial CAN adapters.
//!
//! ## Features
//!
//! - **Receiver**: bit-level state machine driven by a periodic bit timer
//!   interrupt, with break detection, mid-bit sampling and framing checks
//! - **Transmitter**: bit-banged LIN frames (break, sync, protected ID, data,
//!   checksum) on any [`embedded_hal::digital::OutputPin`]
//! - **Hand-off**: an interrupt-safe frame ring buffer and error aggregator built
//!   on [`critical_section`]
//! - **Host protocol**: SLCAN command parser and frame encoder
//! - No heap, no threads, constant-time interrupt handling
//!
//! ## Quick Start
//!
//! ```ignore
//! use lin_slcan::{Bridge, Config, FrameChannel, Receiver, Transmitter};
//!
//! static CHANNEL: FrameChannel = FrameChannel::new();
//!
//! let config = Config::new(19_200);
//! let mut receiver = Receiver::new(rx_pin, tick_counter, bit_timer, &config, &CHANNEL);
//! let transmitter = Transmitter::new(tx_pin, delay, &config)?;
//! let mut bridge = Bridge::new(&CHANNEL, transmitter, millis, main_ticks, &config);
//!
//! // In the bit timer interrupt handler:
//! receiver.on_tick();
//!
//! // In the main loop:
//! loop {
//!     bridge.poll(&mut serial_rx, &mut serial_tx);
//! }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`lin`] | Frame model, validation, receiver, transmitter and ISR hand-off |
//! | [`slcan`] | Host command session and frame encoder |
//! | [`bridge`] | Main-loop driver tying both halves together |
//! | [`config`] | Baud-rate derived timing |
//! | [`hal`] | Timer and clock collaborator traits |
//! | [`serial`] | Serial byte queue traits |
//! | [`error`] | Error types and [`Result`] alias |

// This mod MUST go first, so that the others see its macros.
#[macro_use]
mod fmt;

pub mod bridge;
pub mod config;
pub mod error;
pub mod hal;
pub mod lin;
pub mod serial;
pub mod slcan;

// Re-export commonly used types at the crate root
pub use bridge::{Bridge, BridgeStats, ErrorReporter};
pub use config::{Clocks, Config, Prescaler};
pub use error::{Error, Result};
pub use hal::{BitPhase, BitTimer, Millis, TickSource};
pub use lin::{
    ChecksumType, ErrorAggregator, ErrorFlags, FrameChannel, FrameRingBuffer, IsrFence, LinError,
    LinFrame, LinWrite, Receiver, Transmitter,
};
pub use serial::{SerialRx, SerialTx};
pub use slcan::CommandSession;
