//! Main-loop driver.
//!
//! [`Bridge`] owns everything that runs outside the bit timer interrupt: the
//! host command session, the transmitter and the error reporting window. Call
//! [`Bridge::poll`] from the main loop as often as possible.
//!
//! The bridge reads the free-running tick counter through its own
//! [`TickSource`] handle to bound the wait for the bit timer interrupt before
//! touching the frame channel.

use crate::config::Config;
use crate::hal::{Millis, TickSource};
use crate::lin::{ChecksumType, ErrorFlags, FrameChannel, LinWrite};
use crate::serial::{SerialRx, SerialTx};
use crate::slcan::{CommandSession, MAX_ENCODED_LEN, forward_frame};

/// Minimum time between two error reports.
pub const ERROR_REPORT_INTERVAL_MS: u32 = 1000;

/// Rate limiter for bus error reports.
///
/// Flags accumulate between reports, so no error kind is lost, but at most
/// one report is produced per [`ERROR_REPORT_INTERVAL_MS`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorReporter {
    pending: ErrorFlags,
    last_report_ms: Option<u32>,
}

impl ErrorReporter {
    /// Create a reporter with nothing pending.
    pub const fn new() -> Self {
        Self {
            pending: ErrorFlags::EMPTY,
            last_report_ms: None,
        }
    }

    /// Merge `flags` and return the accumulated set if a report is due.
    pub fn record(&mut self, flags: ErrorFlags, now_ms: u32) -> Option<ErrorFlags> {
        self.pending |= flags;
        if self.pending.is_empty() {
            return None;
        }
        let due = match self.last_report_ms {
            Some(last) => now_ms.wrapping_sub(last) >= ERROR_REPORT_INTERVAL_MS,
            None => true,
        };
        if !due {
            return None;
        }
        self.last_report_ms = Some(now_ms);
        Some(core::mem::take(&mut self.pending))
    }

    /// Flags waiting for the next report.
    pub fn pending(&self) -> ErrorFlags {
        self.pending
    }
}

/// Counters kept by the bridge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BridgeStats {
    /// Frames sent to the host.
    pub forwarded: u32,
    /// Frames dropped for bad parity or checksum.
    pub dropped_invalid: u32,
    /// Error reports emitted.
    pub error_reports: u32,
}

/// Connects the frame channel, the host link and the bus transmitter.
pub struct Bridge<'a, W, M, K> {
    channel: &'a FrameChannel,
    session: CommandSession,
    bus: W,
    clock: M,
    ticks: K,
    fence_timeout_ticks: u16,
    reporter: ErrorReporter,
    checksum: ChecksumType,
    stats: BridgeStats,
}

impl<'a, W, M, K> Bridge<'a, W, M, K>
where
    W: LinWrite,
    M: Millis,
    K: TickSource,
{
    /// Create a bridge with a closed host session.
    pub fn new(channel: &'a FrameChannel, bus: W, clock: M, ticks: K, config: &Config) -> Self {
        Self {
            channel,
            session: CommandSession::new(),
            bus,
            clock,
            ticks,
            fence_timeout_ticks: config.isr_fence_timeout_ticks(),
            reporter: ErrorReporter::new(),
            checksum: config.checksum(),
            stats: BridgeStats::default(),
        }
    }

    /// One main loop iteration.
    ///
    /// 1. Collect receive errors and report them at most once per second.
    /// 2. Process host input.
    /// 3. Forward one received frame if the host link has room for it.
    pub fn poll<R, T>(&mut self, rx: &mut R, tx: &mut T)
    where
        R: SerialRx + ?Sized,
        T: SerialTx + ?Sized,
    {
        let now_ms = self.clock.now_ms();
        self.report_errors(now_ms);

        if rx.available() > 0 {
            self.session.process(rx, tx, &mut self.bus);
        }

        if self.session.is_connected() && tx.capacity() >= MAX_ENCODED_LEN {
            self.forward_one(tx);
        }
    }

    fn report_errors(&mut self, now_ms: u32) {
        let flags = self
            .channel
            .take_errors(&mut self.ticks, self.fence_timeout_ticks);
        if let Some(report) = self.reporter.record(flags, now_ms) {
            self.stats.error_reports += 1;
            if self.session.is_connected() {
                warn!("LIN errors: {}", report);
            } else {
                debug!("LIN errors while closed: {}", report);
            }
        }
    }

    fn forward_one<T: SerialTx + ?Sized>(&mut self, tx: &mut T) {
        let Some(frame) = self
            .channel
            .read_next_frame(&mut self.ticks, self.fence_timeout_ticks)
        else {
            return;
        };
        if forward_frame(&frame, self.checksum, tx) {
            self.stats.forwarded = self.stats.forwarded.wrapping_add(1);
        } else {
            trace!("dropping invalid frame, {} bytes", frame.len());
            self.stats.dropped_invalid = self.stats.dropped_invalid.wrapping_add(1);
        }
    }

    /// Whether the host has the channel open. Drives a status indicator.
    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    /// The host command session.
    pub fn session(&self) -> &CommandSession {
        &self.session
    }

    /// Forwarding counters.
    pub fn stats(&self) -> BridgeStats {
        self.stats
    }

    /// Errors collected but not yet reported.
    pub fn pending_errors(&self) -> ErrorFlags {
        self.reporter.pending()
    }

    /// The bus writer.
    pub fn bus(&self) -> &W {
        &self.bus
    }

    /// Release the bus writer, clock and tick source.
    pub fn release(self) -> (W, M, K) {
        (self.bus, self.clock, self.ticks)
    }
}
