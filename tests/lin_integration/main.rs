//! LIN integration test module
//!
//! End-to-end tests driving the receiver from a simulated bus line:
//! - `receiver_decode`: break detection, byte sampling and framing errors
//! - `loopback`: frames written by the transmitter decoded by the receiver
//! - `bridge_flow`: bus frames reaching the host link through the bridge

mod bridge_flow;
mod loopback;
mod sim;

use lin_slcan::{ErrorFlags, FrameChannel, LinFrame, Receiver};
use sim::{FreeTicks, SimBus, SimRxPin, SimTicks, SimTimer, Waveform};

/// Receiver wired to a simulated bus.
pub type SimReceiver<'a> = Receiver<'a, SimRxPin, SimTicks, SimTimer>;

/// Play `wave` into a fresh receiver publishing into `channel`.
pub fn receive(wave: Waveform, channel: &FrameChannel) {
    let bus = SimBus::new(wave);
    let mut receiver: SimReceiver<'_> =
        Receiver::new(bus.rx_pin(), bus.ticks(), bus.timer(), &sim::config(), channel);
    bus.run(|| receiver.on_tick());
}

/// Every frame waiting in `channel`, oldest first.
pub fn drain(channel: &FrameChannel) -> Vec<LinFrame> {
    let mut ticks = FreeTicks::default();
    let timeout = sim::config().isr_fence_timeout_ticks();
    std::iter::from_fn(|| channel.read_next_frame(&mut ticks, timeout)).collect()
}

/// Read and clear the error flags `channel` collected.
pub fn errors(channel: &FrameChannel) -> ErrorFlags {
    channel.take_errors(&mut FreeTicks::default(), sim::config().isr_fence_timeout_ticks())
}
