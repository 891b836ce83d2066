//! Fixed-capacity frame ring buffer with drop-oldest overflow.

use super::frame::LinFrame;

/// Number of frames the ring buffer holds.
pub const FRAME_BUFFER_CAPACITY: usize = 8;

// Counters wrap at 256, which must stay a multiple of the capacity.
const _: () = assert!(256 % FRAME_BUFFER_CAPACITY == 0);

/// Circular queue of completed frames.
///
/// `head` and `tail` are free-running counters; the slot index is the counter
/// modulo the capacity, so all [`FRAME_BUFFER_CAPACITY`] slots are usable.
/// `head` only moves on [`push`](Self::push); `tail` moves on
/// [`pop`](Self::pop) and on overflow.
#[derive(Debug, Clone)]
pub struct FrameRingBuffer {
    slots: [LinFrame; FRAME_BUFFER_CAPACITY],
    head: u8,
    tail: u8,
}

impl FrameRingBuffer {
    /// Create an empty ring buffer.
    pub const fn new() -> Self {
        Self {
            slots: [LinFrame::empty(); FRAME_BUFFER_CAPACITY],
            head: 0,
            tail: 0,
        }
    }

    #[inline]
    fn slot(counter: u8) -> usize {
        counter as usize % FRAME_BUFFER_CAPACITY
    }

    /// Append a copy of `frame`.
    ///
    /// When the buffer is full the oldest unread frame is discarded and `true`
    /// is returned so the caller can record an overrun.
    pub fn push(&mut self, frame: &LinFrame) -> bool {
        let overrun = self.is_full();
        if overrun {
            self.tail = self.tail.wrapping_add(1);
        }
        self.slots[Self::slot(self.head)] = *frame;
        self.head = self.head.wrapping_add(1);
        overrun
    }

    /// Remove and return the oldest frame.
    pub fn pop(&mut self) -> Option<LinFrame> {
        if self.is_empty() {
            return None;
        }
        let frame = self.slots[Self::slot(self.tail)];
        self.tail = self.tail.wrapping_add(1);
        Some(frame)
    }

    /// Number of unread frames.
    pub fn len(&self) -> usize {
        self.head.wrapping_sub(self.tail) as usize
    }

    /// Check if there are no unread frames.
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Check if the next push will drop a frame.
    pub fn is_full(&self) -> bool {
        self.len() >= FRAME_BUFFER_CAPACITY
    }

    /// Total number of slots.
    pub const fn capacity(&self) -> usize {
        FRAME_BUFFER_CAPACITY
    }

    /// Discard every unread frame.
    pub fn clear(&mut self) {
        self.tail = self.head;
    }
}

impl Default for FrameRingBuffer {
    fn default() -> Self {
        Self::new()
    }
}
