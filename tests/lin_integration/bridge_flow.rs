//! Bus frames and host commands flowing through the bridge.

use heapless::Deque;
use lin_slcan::lin::{checksum_with_id, protected_id};
use lin_slcan::{Bridge, ChecksumType, FrameChannel, LinFrame, Millis, SerialTx, Transmitter};

use crate::sim::{self, FreeTicks, SimDelay, SimLine, SimTxPin, Waveform};
use crate::{drain, errors, receive};

struct FixedClock(u32);

impl Millis for FixedClock {
    fn now_ms(&self) -> u32 {
        self.0
    }
}

type SimBridge<'a> = Bridge<'a, Transmitter<SimTxPin, SimDelay>, FixedClock, FreeTicks>;

fn bridge<'a>(channel: &'a FrameChannel, line: &SimLine) -> SimBridge<'a> {
    let config = sim::config();
    let transmitter = Transmitter::new(line.tx_pin(), line.delay(), &config).unwrap();
    Bridge::new(channel, transmitter, FixedClock(0), FreeTicks::default(), &config)
}

fn host_output(out: &Deque<u8, 128>) -> Vec<u8> {
    out.iter().copied().collect()
}

#[cfg(not(feature = "classic-checksum"))]
#[test]
fn bus_frame_reaches_host() {
    let channel = FrameChannel::new();
    let pid = protected_id(0x01);
    let sum = checksum_with_id(pid, &[0x12, 0x34]);
    receive(Waveform::new().idle(2).frame(&[pid, 0x12, 0x34, sum]), &channel);

    let line = SimLine::new();
    let mut bridge = bridge(&channel, &line);
    let mut rx: Deque<u8, 32> = Deque::new();
    let mut out: Deque<u8, 128> = Deque::new();
    rx.write_all(b"O\r");
    bridge.poll(&mut rx, &mut out);

    assert_eq!(host_output(&out), b"\rtc1 21234f7\r");
    assert_eq!(bridge.stats().forwarded, 1);
}

#[cfg(not(feature = "classic-checksum"))]
#[test]
fn classic_checksum_frame_dropped_by_default() {
    let channel = FrameChannel::new();
    let classic = LinFrame::with_checksum(0x01, &[0x12, 0x34], ChecksumType::Classic);
    receive(Waveform::new().idle(2).frame(classic.bytes()), &channel);

    let line = SimLine::new();
    let mut bridge = bridge(&channel, &line);
    let mut rx: Deque<u8, 32> = Deque::new();
    let mut out: Deque<u8, 128> = Deque::new();
    rx.write_all(b"O\r");
    bridge.poll(&mut rx, &mut out);

    assert_eq!(host_output(&out), b"\r");
    assert_eq!(bridge.stats().dropped_invalid, 1);
}

#[test]
fn framing_errors_never_reach_host() {
    let channel = FrameChannel::new();
    receive(
        Waveform::new().idle(2).brk().byte(0x54).idle(10),
        &channel,
    );

    let line = SimLine::new();
    let mut bridge = bridge(&channel, &line);
    let mut rx: Deque<u8, 32> = Deque::new();
    let mut out: Deque<u8, 128> = Deque::new();
    rx.write_all(b"O\r");
    bridge.poll(&mut rx, &mut out);

    assert_eq!(host_output(&out), b"\r");
    assert_eq!(bridge.stats().error_reports, 1);
    assert!(bridge.pending_errors().is_empty());
    assert!(errors(&channel).is_empty());
}

#[test]
fn host_command_reaches_bus() {
    let channel = FrameChannel::new();
    let line = SimLine::new();
    let mut bridge = bridge(&channel, &line);
    let mut rx: Deque<u8, 32> = Deque::new();
    let mut out: Deque<u8, 128> = Deque::new();
    rx.write_all(b"O\rt0A2AABB\r");
    bridge.poll(&mut rx, &mut out);
    assert_eq!(host_output(&out), b"\r\r");

    // Play what the transmitter drove back into a receiver.
    let echo = FrameChannel::new();
    receive(
        Waveform::new().idle(2).samples(&line.recorded()).idle(10),
        &echo,
    );
    let frames = drain(&echo);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].bytes(), [0xCA, 0xAA, 0xBB, 0xCE]);
    assert!(frames[0].is_valid(ChecksumType::Enhanced));
}

#[test]
fn closed_session_keeps_frames_queued() {
    let channel = FrameChannel::new();
    receive(Waveform::new().idle(2).frame(&[0x3C]), &channel);

    let line = SimLine::new();
    let mut bridge = bridge(&channel, &line);
    let mut rx: Deque<u8, 32> = Deque::new();
    let mut out: Deque<u8, 128> = Deque::new();
    bridge.poll(&mut rx, &mut out);
    assert!(out.is_empty());
    assert_eq!(channel.pending_frames(), 1);

    rx.write_all(b"O\r");
    bridge.poll(&mut rx, &mut out);
    assert_eq!(host_output(&out), b"\rt3c\r");
}
