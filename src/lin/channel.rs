//! Interrupt to main-loop hand-off.
//!
//! [`FrameChannel`] is the single shared object between the receiver (bit
//! timer interrupt) and the main loop. It is meant to live in a `static`.
//!
//! # Hand-off protocol
//!
//! 1. The interrupt side never waits. It enters a (nested, cheap) critical
//!    section to commit a frame or raise error flags, and calls
//!    [`IsrFence::isr_completed`] as the last thing in every invocation.
//! 2. The main loop first waits for the in-flight interrupt invocation to
//!    finish ([`IsrFence::wait_for_isr_end`]). A critical section opened right
//!    after that point then has a full bit period before the next tick, so
//!    masking interrupts does not add jitter to the sampling instant. The
//!    wait is bounded by
//!    [`Config::isr_fence_timeout_ticks`](crate::Config::isr_fence_timeout_ticks);
//!    when it expires no invocation ran for that long, so the bit timer is
//!    stopped and there is no sample to delay.
//! 3. Inside the critical section the main loop copies what it needs by value
//!    and leaves again immediately.

use core::cell::RefCell;
use core::sync::atomic::{AtomicU8, Ordering};

use critical_section::Mutex;

use super::errors::{ErrorAggregator, ErrorFlags, LinError};
use super::frame::LinFrame;
use super::ring::FrameRingBuffer;
use crate::hal::TickSource;

/// Completion marker bumped at the end of every interrupt invocation.
pub struct IsrFence {
    marker: AtomicU8,
}

impl IsrFence {
    /// Create a fence.
    pub const fn new() -> Self {
        Self {
            marker: AtomicU8::new(0),
        }
    }

    /// Mark the current interrupt invocation as finished. Interrupt context only.
    #[inline]
    pub fn isr_completed(&self) {
        // Single writer: a plain load/store pair is enough and works on
        // targets without atomic read-modify-write.
        let value = self.marker.load(Ordering::Relaxed);
        self.marker.store(value.wrapping_add(1), Ordering::Release);
    }

    /// Spin until the next interrupt invocation completes.
    ///
    /// Returns `false` if no invocation completed within `timeout_ticks` of
    /// `ticks`. Main loop only.
    pub fn wait_for_isr_end<T>(&self, ticks: &mut T, timeout_ticks: u16) -> bool
    where
        T: TickSource + ?Sized,
    {
        let marker = self.marker.load(Ordering::Acquire);
        let start = ticks.ticks();
        loop {
            if self.marker.load(Ordering::Acquire) != marker {
                return true;
            }
            if ticks.ticks().wrapping_sub(start) >= timeout_ticks {
                // An invocation may have preempted us between the two reads.
                return self.marker.load(Ordering::Acquire) != marker;
            }
            core::hint::spin_loop();
        }
    }

    /// Number of completed invocations, modulo 256.
    pub fn marker(&self) -> u8 {
        self.marker.load(Ordering::Acquire)
    }
}

impl Default for IsrFence {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-producer/single-consumer channel of received frames and errors.
pub struct FrameChannel {
    ring: Mutex<RefCell<FrameRingBuffer>>,
    errors: ErrorAggregator,
    fence: IsrFence,
}

impl FrameChannel {
    /// Create an empty channel.
    pub const fn new() -> Self {
        Self {
            ring: Mutex::new(RefCell::new(FrameRingBuffer::new())),
            errors: ErrorAggregator::new(),
            fence: IsrFence::new(),
        }
    }

    // ----- Producer side (interrupt context) -----

    /// Commit a completed frame. On overflow the oldest unread frame is
    /// dropped, [`LinError::BufferOverrun`] is raised and `true` returned.
    pub fn commit(&self, frame: &LinFrame) -> bool {
        let overrun = critical_section::with(|cs| self.ring.borrow_ref_mut(cs).push(frame));
        if overrun {
            self.errors.raise(LinError::BufferOverrun);
        }
        overrun
    }

    /// Record receive errors.
    pub fn raise(&self, flags: impl Into<ErrorFlags>) {
        self.errors.raise(flags);
    }

    /// Signal the end of an interrupt invocation.
    pub fn isr_completed(&self) {
        self.fence.isr_completed();
    }

    // ----- Consumer side (main loop) -----

    /// Copy out the oldest unread frame, if any.
    ///
    /// Waits up to `timeout_ticks` for the bit timer interrupt to complete
    /// first, see [`IsrFence::wait_for_isr_end`].
    pub fn read_next_frame<T>(&self, ticks: &mut T, timeout_ticks: u16) -> Option<LinFrame>
    where
        T: TickSource + ?Sized,
    {
        self.fence_wait(ticks, timeout_ticks);
        critical_section::with(|cs| self.ring.borrow_ref_mut(cs).pop())
    }

    /// Read and clear the accumulated error flags, fenced like
    /// [`read_next_frame`](Self::read_next_frame).
    pub fn take_errors<T>(&self, ticks: &mut T, timeout_ticks: u16) -> ErrorFlags
    where
        T: TickSource + ?Sized,
    {
        self.fence_wait(ticks, timeout_ticks);
        self.errors.take()
    }

    fn fence_wait<T: TickSource + ?Sized>(&self, ticks: &mut T, timeout_ticks: u16) {
        if !self.fence.wait_for_isr_end(ticks, timeout_ticks) {
            trace!("bit timer idle for {} ticks", timeout_ticks);
        }
    }

    /// Number of frames waiting to be read.
    pub fn pending_frames(&self) -> usize {
        critical_section::with(|cs| self.ring.borrow_ref(cs).len())
    }

    /// The completion fence shared with the interrupt handler.
    pub fn fence(&self) -> &IsrFence {
        &self.fence
    }
}

impl Default for FrameChannel {
    fn default() -> Self {
        Self::new()
    }
}
