//! Link-layer statistics: four monotonically increasing counters.
//!
//! Incremented only from the engine/codec context, read from the
//! console task. Plain [`AtomicU32`] with `Relaxed` ordering matches the
//! "single-word atomic on the target, slightly stale reads acceptable"
//! requirement (spec.md §5) without pulling in a mutex.

use core::sync::atomic::{AtomicU32, Ordering};

/// Snapshot of the four counters, for reporting over the console.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatsSnapshot {
    pub rx_frames: u32,
    pub tx_frames: u32,
    pub rx_abort_frames: u32,
    pub tx_noack_frames: u32,
}

#[derive(Debug, Default)]
pub struct Statistics {
    rx_frames: AtomicU32,
    tx_frames: AtomicU32,
    rx_abort_frames: AtomicU32,
    tx_noack_frames: AtomicU32,
}

impl Statistics {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rx_frames: AtomicU32::new(0),
            tx_frames: AtomicU32::new(0),
            rx_abort_frames: AtomicU32::new(0),
            tx_noack_frames: AtomicU32::new(0),
        }
    }

    pub fn record_rx_frame(&self) {
        self.rx_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rx_abort(&self) {
        self.rx_abort_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tx_frame(&self, acked: bool) {
        if acked {
            self.tx_frames.fetch_add(1, Ordering::Relaxed);
        } else {
            self.tx_noack_frames.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            rx_frames: self.rx_frames.load(Ordering::Relaxed),
            tx_frames: self.tx_frames.load(Ordering::Relaxed),
            rx_abort_frames: self.rx_abort_frames.load(Ordering::Relaxed),
            tx_noack_frames: self.tx_noack_frames.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let s = Statistics::new();
        assert_eq!(s.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn tx_frame_splits_ack_and_noack() {
        let s = Statistics::new();
        s.record_tx_frame(true);
        s.record_tx_frame(false);
        s.record_tx_frame(false);
        let snap = s.snapshot();
        assert_eq!(snap.tx_frames, 1);
        assert_eq!(snap.tx_noack_frames, 2);
    }

    #[test]
    fn rx_accounting() {
        let s = Statistics::new();
        s.record_rx_frame();
        s.record_rx_abort();
        s.record_rx_abort();
        let snap = s.snapshot();
        assert_eq!(snap.rx_frames, 1);
        assert_eq!(snap.rx_abort_frames, 2);
        assert_eq!(snap.rx_frames + snap.rx_abort_frames, 3);
    }
}
