//! Hardware collaborator traits.
//!
//! GPIO and delays come from [`embedded_hal`]; the traits here cover the
//! remaining peripherals the LIN engine depends on. Implement them once per
//! board, or with a simulated clock for host-side tests.

use crate::config::Config;

/// Free-running hardware tick counter.
///
/// The counter wraps at `u16::MAX`; callers only ever compare wrapping
/// differences, so wraparound is harmless as long as a single wait spans
/// fewer than 65536 ticks. Must be readable from interrupt context.
pub trait TickSource {
    /// Current counter value.
    fn ticks(&mut self) -> u16;
}

/// Where the next bit timer interrupt should land relative to "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitPhase {
    /// Restart the bit period: the next tick fires one full bit from now.
    ///
    /// Called repeatedly while busy-waiting so no tick fires during the wait.
    Restart,
    /// The next tick fires half a bit from now, at the centre of the bit
    /// whose leading edge was just observed.
    HalfBit,
}

/// Periodic bit timer interrupt source.
pub trait BitTimer {
    /// Program prescaler and period from `config`. Called once at setup.
    fn configure(&mut self, config: &Config);

    /// Re-phase the timer.
    fn set_phase(&mut self, phase: BitPhase);
}

/// Monotonic millisecond clock used by the main loop.
pub trait Millis {
    /// Milliseconds since an arbitrary epoch, wrapping.
    fn now_ms(&self) -> u32;
}
