//! Simulated LIN bus.
//!
//! Time is counted in ticks of a 1 MHz counter. The bus runs at 10 kbit/s, so
//! one bit lasts exactly 100 ticks. Reading the tick counter advances time by
//! one tick, which lets the receiver's bounded busy-waits make progress.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use lin_slcan::{BitPhase, BitTimer, Clocks, Config, TickSource};

/// Bus bit rate used by every simulation.
pub const BAUD: u16 = 10_000;

/// Ticks per bit at [`BAUD`].
pub const TICKS_PER_BIT: usize = 100;

/// Receiver and transmitter configuration matching the simulated clocks.
pub fn config() -> Config {
    Config::with_clocks(
        BAUD,
        Clocks {
            timer_hz: 16_000_000,
            tick_hz: 1_000_000,
        },
    )
}

/// Line level per tick, built bit by bit.
#[derive(Debug, Clone, Default)]
pub struct Waveform {
    samples: Vec<bool>,
}

impl Waveform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold `high` for `bits` bit times.
    pub fn level(mut self, high: bool, bits: usize) -> Self {
        self.samples
            .extend(std::iter::repeat_n(high, bits * TICKS_PER_BIT));
        self
    }

    /// Recessive bus.
    pub fn idle(self, bits: usize) -> Self {
        self.level(true, bits)
    }

    /// 13 dominant bits and a recessive delimiter.
    pub fn brk(self) -> Self {
        self.level(false, 13).level(true, 1)
    }

    /// One byte with the given stop bit level.
    pub fn byte_with_stop(mut self, byte: u8, stop: bool) -> Self {
        self = self.level(false, 1);
        for bit in 0..8 {
            self = self.level(byte & (1 << bit) != 0, 1);
        }
        self.level(stop, 1)
    }

    /// One well-formed byte.
    pub fn byte(self, byte: u8) -> Self {
        self.byte_with_stop(byte, true)
    }

    pub fn bytes(self, bytes: &[u8]) -> Self {
        bytes.iter().fold(self, |wave, &b| wave.byte(b))
    }

    /// Break, sync byte, `bytes`, then enough idle time to end the frame.
    pub fn frame(self, bytes: &[u8]) -> Self {
        self.brk().byte(0x55).bytes(bytes).idle(10)
    }

    /// Append raw per-tick samples.
    pub fn samples(mut self, samples: &[bool]) -> Self {
        self.samples.extend_from_slice(samples);
        self
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

struct BusState {
    now: Cell<u32>,
    next_fire: Cell<u32>,
    bit_ticks: Cell<u32>,
    wave: Vec<bool>,
}

impl BusState {
    fn level(&self) -> bool {
        self.wave
            .get(self.now.get() as usize)
            .copied()
            .unwrap_or(true)
    }
}

/// A waveform being played back to a receiver.
pub struct SimBus {
    state: Rc<BusState>,
}

impl SimBus {
    pub fn new(wave: Waveform) -> Self {
        Self {
            state: Rc::new(BusState {
                now: Cell::new(0),
                next_fire: Cell::new(TICKS_PER_BIT as u32),
                bit_ticks: Cell::new(TICKS_PER_BIT as u32),
                wave: wave.samples,
            }),
        }
    }

    pub fn rx_pin(&self) -> SimRxPin {
        SimRxPin(Rc::clone(&self.state))
    }

    pub fn ticks(&self) -> SimTicks {
        SimTicks(Rc::clone(&self.state))
    }

    pub fn timer(&self) -> SimTimer {
        SimTimer(Rc::clone(&self.state))
    }

    /// Current time in ticks.
    pub fn now(&self) -> u32 {
        self.state.now.get()
    }

    /// Fire the bit timer until the waveform (plus a recessive tail) is over.
    pub fn run(&self, mut on_tick: impl FnMut()) {
        let end = (self.state.wave.len() + 20 * TICKS_PER_BIT) as u32;
        loop {
            let fire = self.state.next_fire.get();
            if fire >= end {
                break;
            }
            self.state.now.set(fire);
            self.state
                .next_fire
                .set(fire + self.state.bit_ticks.get());
            on_tick();
        }
    }
}

pub struct SimRxPin(Rc<BusState>);

impl ErrorType for SimRxPin {
    type Error = Infallible;
}

impl InputPin for SimRxPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.level())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.0.level())
    }
}

pub struct SimTicks(Rc<BusState>);

impl TickSource for SimTicks {
    fn ticks(&mut self) -> u16 {
        let now = self.0.now.get() + 1;
        self.0.now.set(now);
        now as u16
    }
}

pub struct SimTimer(Rc<BusState>);

impl BitTimer for SimTimer {
    fn configure(&mut self, config: &Config) {
        self.0.bit_ticks.set(u32::from(config.ticks_per_bit()));
    }

    fn set_phase(&mut self, phase: BitPhase) {
        let now = self.0.now.get();
        let bit = self.0.bit_ticks.get();
        let next = match phase {
            BitPhase::Restart => now + bit,
            BitPhase::HalfBit => now + bit / 2,
        };
        self.0.next_fire.set(next);
    }
}

/// Main-loop handle on a tick counter no interrupt is driving. Advances one
/// tick per read, so fence waits run to their timeout.
#[derive(Debug, Default)]
pub struct FreeTicks(pub u16);

impl TickSource for FreeTicks {
    fn ticks(&mut self) -> u16 {
        self.0 = self.0.wrapping_add(1);
        self.0
    }
}

#[derive(Default)]
struct LineState {
    level: Cell<bool>,
    samples: RefCell<Vec<bool>>,
}

/// Records what a transmitter drives onto the line, one sample per tick.
#[derive(Clone, Default)]
pub struct SimLine(Rc<LineState>);

impl SimLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tx_pin(&self) -> SimTxPin {
        SimTxPin(Rc::clone(&self.0))
    }

    pub fn delay(&self) -> SimDelay {
        SimDelay(Rc::clone(&self.0))
    }

    pub fn level(&self) -> bool {
        self.0.level.get()
    }

    /// Everything driven so far.
    pub fn recorded(&self) -> Vec<bool> {
        self.0.samples.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.samples.borrow_mut().clear();
    }
}

pub struct SimTxPin(Rc<LineState>);

impl ErrorType for SimTxPin {
    type Error = Infallible;
}

impl OutputPin for SimTxPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.level.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.level.set(true);
        Ok(())
    }
}

/// Delay that advances the recorded line by one sample per microsecond.
pub struct SimDelay(Rc<LineState>);

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        let level = self.0.level.get();
        self.0
            .samples
            .borrow_mut()
            .extend(std::iter::repeat_n(level, (ns / 1000) as usize));
    }
}
