//! Fake hardware shared by unit tests across this crate. Not part of
//! the public API.

use std::cell::Cell;

use crate::flash::{FlashError, FlashStorage};
use crate::line::{AlarmToken, CecLine, EdgeMask, Level};

/// Real hardware's `now_us()` is backed by a free-running timer that
/// advances on its own; a fake clock that only moves when a test calls
/// [`FakeLine::advance_us`] would make [`crate::codec::send`]'s and
/// [`crate::codec::IdleMonitor::wait_idle`]'s busy-wait loops spin
/// forever, since nothing else in those loops ever calls `advance_us`.
/// [`FakeLine::now_us`] ticks by one microsecond on every read to give
/// those loops real progress, the same way a real timer register would;
/// the tick is far smaller than any timing window this crate checks, so
/// it never changes which window a measured duration falls into.
const AUTO_TICK_US: u64 = 1;

#[derive(Debug)]
pub(crate) struct FakeLine {
    now_us: Cell<u64>,
    level: Level,
    output_low_calls: u32,
    scheduled: Option<(u64, AlarmToken)>,
    edge_mask: EdgeMask,
}

impl FakeLine {
    pub(crate) fn new() -> Self {
        Self {
            now_us: Cell::new(0),
            level: Level::High,
            output_low_calls: 0,
            scheduled: None,
            edge_mask: EdgeMask {
                rising: false,
                falling: false,
            },
        }
    }

    pub(crate) fn advance_us(&mut self, delta: u64) {
        self.now_us.set(self.now_us.get() + delta);
    }

    pub(crate) fn set_level(&mut self, level: Level) {
        self.level = level;
    }

    pub(crate) fn output_low_calls(&self) -> u32 {
        self.output_low_calls
    }

    pub(crate) fn scheduled_alarm(&self) -> Option<(u64, AlarmToken)> {
        self.scheduled
    }

    pub(crate) fn take_scheduled_alarm(&mut self) -> Option<(u64, AlarmToken)> {
        self.scheduled.take()
    }
}

impl CecLine for FakeLine {
    fn set_output_low(&mut self) {
        self.output_low_calls += 1;
        self.level = Level::Low;
    }

    fn release(&mut self) {
        self.level = Level::High;
    }

    fn read_level(&self) -> Level {
        self.level
    }

    fn enable_edge_irq(&mut self, mask: EdgeMask) {
        self.edge_mask = mask;
    }

    fn disable_edge_irq(&mut self) {
        self.edge_mask = EdgeMask {
            rising: false,
            falling: false,
        };
    }

    fn now_us(&self) -> u64 {
        let now = self.now_us.get();
        self.now_us.set(now + AUTO_TICK_US);
        now
    }

    fn schedule_at(&mut self, at_us: u64, token: AlarmToken) {
        self.scheduled = Some((at_us, token));
    }
}

/// Drive [`crate::codec::send`]'s algorithm against a [`FakeLine`]
/// without an unbounded busy-wait: fast-forwards the fake clock to each
/// deadline instead of spinning on it. `ack` controls whether the
/// simulated follower pulls ACK low.
pub(crate) fn drive_send(message: &crate::message::Message, line: &mut FakeLine, ack: bool) -> bool {
    let mut monitor = crate::codec::IdleMonitor::new();
    while !monitor.observe(line.read_level()) {
        line.advance_us(crate::codec::timing::DATA_PERIOD);
    }

    let mut tx = crate::codec::TxSession::idle();
    tx.begin(message, line);
    loop {
        let due = tx.next_alarm_us();
        if due > line.now_us() {
            line.advance_us(due - line.now_us());
        }
        if ack {
            line.set_level(Level::Low);
        }
        if let crate::codec::TxProgress::Done { acked } = tx.on_alarm(line) {
            return acked;
        }
    }
}

/// In-memory stand-in for a reserved flash region. Erased bytes read as
/// `0xFF`, matching real NOR flash.
pub(crate) struct MemoryFlash {
    bytes: std::vec::Vec<u8>,
    sector_size: usize,
}

impl MemoryFlash {
    pub(crate) fn blank(capacity: usize) -> Self {
        Self {
            bytes: std::vec![0xFFu8; capacity],
            sector_size: 4096,
        }
    }
}

impl FlashStorage for MemoryFlash {
    fn capacity(&self) -> usize {
        self.bytes.len()
    }

    fn sector_size(&self) -> usize {
        self.sector_size
    }

    fn read(&self, offset: usize, buf: &mut [u8]) {
        buf.copy_from_slice(&self.bytes[offset..offset + buf.len()]);
    }

    fn erase(&mut self, offset: usize, len: usize) -> Result<(), FlashError> {
        if offset + len > self.bytes.len() {
            return Err(FlashError::TooLarge);
        }
        self.bytes[offset..offset + len].fill(0xFF);
        Ok(())
    }

    fn program(&mut self, offset: usize, data: &[u8]) -> Result<(), FlashError> {
        if offset + data.len() > self.bytes.len() {
            return Err(FlashError::TooLarge);
        }
        self.bytes[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }
}
