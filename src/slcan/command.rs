//! SLCAN command session.
//!
//! Host input is a stream of ASCII lines terminated by CR or LF. Each line
//! starts with a command byte followed by a fixed-grammar payload. Replies
//! are a fixed string, `CR` (success) or `BEL` (rejected).

use heapless::Vec;

use super::hex::{decode_nibble, decode_u8};
use crate::lin::{LinWrite, MAX_LIN_DATA_LEN, MAX_LIN_ID};
use crate::serial::{SerialRx, SerialTx};

/// Longest command line, terminator excluded.
pub const LINE_CAPACITY: usize = 26;

/// Line terminator and success reply.
pub const CR: u8 = b'\r';
/// Alternative line terminator.
pub const LF: u8 = b'\n';
/// Failure reply.
pub const BEL: u8 = 0x07;

/// Reply to `N`.
pub const SERIAL_RESPONSE: &[u8] = b"N0001\r";
/// Reply to `v`.
pub const SW_VERSION_RESPONSE: &[u8] = b"v0107\r";
/// Reply to `V`.
pub const VERSION_RESPONSE: &[u8] = b"V1010\r";

/// Identifier digits of a standard `tiiildd..` transmit command.
const STANDARD_ID_DIGITS: usize = 3;
/// Identifier digits of the short `tiildd..` form.
const SHORT_ID_DIGITS: usize = 2;

/// Command byte of a host line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    /// `N`: serial number.
    GetSerial = b'N',
    /// `v`: firmware version.
    GetSwVersion = b'v',
    /// `V`: hardware and firmware version.
    GetVersion = b'V',
    /// `O`: open the channel.
    Open = b'O',
    /// `C`: close the channel.
    Close = b'C',
    /// `Sn`: select a predefined bitrate.
    SetBitrate = b'S',
    /// `sxxyy`: set bit timing registers.
    SetBtr = b's',
    /// `Zn`: timestamps on/off.
    Timestamp = b'Z',
    /// `tiiildd..`: transmit a frame.
    Transmit = b't',
}

impl Command {
    /// Parse a command byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            b'N' => Self::GetSerial,
            b'v' => Self::GetSwVersion,
            b'V' => Self::GetVersion,
            b'O' => Self::Open,
            b'C' => Self::Close,
            b'S' => Self::SetBitrate,
            b's' => Self::SetBtr,
            b'Z' => Self::Timestamp,
            b't' => Self::Transmit,
            _ => return None,
        })
    }
}

/// Predefined bitrates selectable with `S0`..`S8`.
///
/// The selection is recorded but does not change the LIN baud rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bitrate {
    Kbps10,
    Kbps20,
    Kbps50,
    Kbps100,
    Kbps125,
    Kbps250,
    Kbps500,
    Kbps1000,
}

impl Bitrate {
    /// Parse the digit after `S`. `7` (800 kbit/s) is not supported.
    pub fn from_digit(digit: u8) -> Option<Self> {
        Some(match digit {
            b'0' => Self::Kbps10,
            b'1' => Self::Kbps20,
            b'2' => Self::Kbps50,
            b'3' => Self::Kbps100,
            b'4' => Self::Kbps125,
            b'5' => Self::Kbps250,
            b'6' => Self::Kbps500,
            b'8' => Self::Kbps1000,
            _ => return None,
        })
    }
}

/// Line assembler and command dispatcher for one host connection.
#[derive(Debug, Clone)]
pub struct CommandSession {
    line: Vec<u8, LINE_CAPACITY>,
    connected: bool,
    id: u8,
    dlc: u8,
    data: [u8; MAX_LIN_DATA_LEN],
    timestamps: bool,
    bitrate: Option<Bitrate>,
}

impl CommandSession {
    /// Create a closed session.
    pub const fn new() -> Self {
        Self {
            line: Vec::new(),
            connected: false,
            id: 0,
            dlc: 0,
            data: [0; MAX_LIN_DATA_LEN],
            timestamps: false,
            bitrate: None,
        }
    }

    /// Whether the host opened the channel with `O`.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Timestamp flag set by `Z`.
    pub fn timestamps(&self) -> bool {
        self.timestamps
    }

    /// Bitrate selected by `S`, if any.
    pub fn bitrate(&self) -> Option<Bitrate> {
        self.bitrate
    }

    /// Address and data of the last transmit command that reached the bus.
    pub fn last_transmit(&self) -> (u8, &[u8]) {
        (self.id, &self.data[..self.dlc as usize])
    }

    /// Drain `rx`, dispatching every complete line.
    pub fn process<R, T, W>(&mut self, rx: &mut R, tx: &mut T, bus: &mut W)
    where
        R: SerialRx + ?Sized,
        T: SerialTx + ?Sized,
        W: LinWrite + ?Sized,
    {
        while rx.available() > 0 {
            let byte = rx.read();
            self.process_byte(byte, tx, bus);
        }
    }

    /// Feed one input byte.
    pub fn process_byte<T, W>(&mut self, byte: u8, tx: &mut T, bus: &mut W)
    where
        T: SerialTx + ?Sized,
        W: LinWrite + ?Sized,
    {
        match byte {
            CR | LF => {
                if !self.line.is_empty() {
                    self.dispatch(tx, bus);
                    self.line.clear();
                }
            }
            0 => {}
            _ => {
                if self.line.push(byte).is_err() {
                    // Overlong line: drop it and resynchronise on the next one.
                    self.line.clear();
                }
            }
        }
    }

    fn dispatch<T, W>(&mut self, tx: &mut T, bus: &mut W)
    where
        T: SerialTx + ?Sized,
        W: LinWrite + ?Sized,
    {
        let Some(command) = self.line.first().copied().and_then(Command::from_byte) else {
            tx.write(BEL);
            return;
        };

        match command {
            Command::GetSerial => tx.write_all(SERIAL_RESPONSE),
            Command::GetSwVersion => tx.write_all(SW_VERSION_RESPONSE),
            Command::GetVersion => tx.write_all(VERSION_RESPONSE),
            Command::Open => {
                if self.line.len() == 1 {
                    self.connected = true;
                    debug!("channel opened");
                    tx.write(CR);
                }
            }
            Command::Close => {
                self.connected = false;
                debug!("channel closed");
                tx.write(CR);
            }
            Command::SetBitrate => tx.write(self.set_bitrate()),
            Command::SetBtr => tx.write(if self.connected { BEL } else { CR }),
            Command::Timestamp => tx.write(self.set_timestamps()),
            Command::Transmit => self.transmit(tx, bus),
        }
    }

    fn set_bitrate(&mut self) -> u8 {
        if self.connected {
            return BEL;
        }
        match self.line.get(1).copied().and_then(Bitrate::from_digit) {
            Some(bitrate) => {
                self.bitrate = Some(bitrate);
                CR
            }
            None => BEL,
        }
    }

    fn set_timestamps(&mut self) -> u8 {
        if self.line.len() != 2 {
            return BEL;
        }
        match self.line[1] {
            b'0' => self.timestamps = false,
            b'1' => self.timestamps = true,
            _ => return BEL,
        }
        CR
    }

    /// `t` followed by identifier, length digit and data digits.
    ///
    /// The identifier is 3 hex digits, or 2 when the payload has odd length.
    /// Only its low 6 bits are used. Missing digits decode as 0.
    ///
    /// The width follows from the parity because well-formed lines carry an
    /// even number of data digits. A 3-digit line with an odd number of data
    /// digits is therefore read with a 2-digit identifier: `t00A2AAB` becomes
    /// identifier `0x00`, length 0x0A, and is ignored.
    fn transmit<T, W>(&mut self, tx: &mut T, bus: &mut W)
    where
        T: SerialTx + ?Sized,
        W: LinWrite + ?Sized,
    {
        if !self.connected {
            return;
        }

        let payload = &self.line[1..];
        let id_digits = if payload.len() % 2 == 1 {
            SHORT_ID_DIGITS
        } else {
            STANDARD_ID_DIGITS
        };

        let id = decode_u8(field(payload, 0, id_digits)) & MAX_LIN_ID;
        let dlc = payload.get(id_digits).copied().map_or(0, decode_nibble);
        if dlc == 0 || dlc as usize > MAX_LIN_DATA_LEN {
            return;
        }

        let mut data = [0u8; MAX_LIN_DATA_LEN];
        let data_start = id_digits + 1;
        for (i, byte) in data.iter_mut().take(dlc as usize).enumerate() {
            *byte = decode_u8(field(payload, data_start + 2 * i, 2));
        }

        self.id = id;
        self.dlc = dlc;
        self.data = data;

        match bus.write_frame(id, &data[..dlc as usize]) {
            Ok(()) => tx.write(CR),
            Err(e) => {
                warn!("LIN transmit failed: {}", e);
                tx.write(BEL);
            }
        }
    }
}

impl Default for CommandSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Up to `len` bytes of `payload` from `start`, shorter at the end of the line.
fn field(payload: &[u8], start: usize, len: usize) -> &[u8] {
    let rest = payload.get(start..).unwrap_or(&[]);
    &rest[..len.min(rest.len())]
}
