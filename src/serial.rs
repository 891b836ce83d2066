//! Host serial byte queues.
//!
//! The UART driver itself lives outside this crate; the command session and
//! frame encoder only need a byte source and a byte sink. Both traits are
//! implemented for [`heapless::Deque`], which also serves as the queue type
//! on targets where the UART interrupt fills a buffer.

use heapless::{Deque, Vec};

/// Serial receive queue.
pub trait SerialRx {
    /// Number of bytes waiting to be read.
    fn available(&self) -> usize;

    /// Pop the oldest byte, or `0` when the queue is empty.
    fn read(&mut self) -> u8;
}

/// Serial transmit queue.
pub trait SerialTx {
    /// Queue one byte. Bytes that do not fit are dropped.
    fn write(&mut self, byte: u8);

    /// Free space in bytes.
    fn capacity(&self) -> usize;

    /// Queue every byte of `bytes`.
    fn write_all(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.write(byte);
        }
    }
}

impl<const N: usize> SerialRx for Deque<u8, N> {
    fn available(&self) -> usize {
        self.len()
    }

    fn read(&mut self) -> u8 {
        self.pop_front().unwrap_or(0)
    }
}

impl<const N: usize> SerialTx for Deque<u8, N> {
    fn write(&mut self, byte: u8) {
        let _ = self.push_back(byte);
    }

    fn capacity(&self) -> usize {
        N - self.len()
    }
}

impl<const N: usize> SerialTx for Vec<u8, N> {
    fn write(&mut self, byte: u8) {
        let _ = self.push(byte);
    }

    fn capacity(&self) -> usize {
        N - self.len()
    }
}
