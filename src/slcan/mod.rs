//! Lawicel/SLCAN host protocol.
//!
//! The adapter presents itself to the host as a serial CAN interface: the host
//! opens the channel with `O`, sends frames with `t` and receives every valid
//! bus frame as a `t` line. See [`command`] for the accepted commands and
//! [`encoder`] for the frame format.

pub mod command;
pub mod encoder;
pub mod hex;

pub use command::{Bitrate, CommandSession, Command, BEL, CR, LINE_CAPACITY};
pub use encoder::{MAX_ENCODED_LEN, encode_frame, forward_frame, write_frame};
