//! Abstraction over the single shared, open-drain CEC GPIO.
//!
//! The line is wired-AND: driving it low is a unilateral action, "high"
//! is merely the absence of any asserter. All timing is anchored on
//! absolute microsecond timestamps from [`CecLine::now_us`], not on
//! relative delays, so the frame codec's state machines can be driven
//! equally from an edge ISR or from a scheduled alarm.

/// Logic level observed on the line.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

/// Edge that triggered the line's interrupt handler.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Rising,
    Falling,
}

/// Which edges the caller wants notified about.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EdgeMask {
    pub rising: bool,
    pub falling: bool,
}

impl EdgeMask {
    pub const BOTH: Self = Self {
        rising: true,
        falling: true,
    };
    pub const RISING: Self = Self {
        rising: true,
        falling: false,
    };
    pub const FALLING: Self = Self {
        rising: false,
        falling: true,
    };
}

/// Hardware access the frame codec needs for one shared CEC line.
///
/// Implementations own the GPIO peripheral and the free-running timer;
/// the codec never touches registers directly, mirroring how
/// [`crate::config::record`] never casts raw pointers across the
/// in-memory/on-flash boundary.
///
/// # Safety
///
/// `schedule_at` callbacks and the edge-interrupt handler may run in
/// interrupt context. Implementations must ensure `now_us`, `read_level`,
/// `set_output_low` and `release` are safe to call from that context,
/// and that they never block.
pub trait CecLine {
    /// Drive the line low (assert).
    fn set_output_low(&mut self);

    /// Release the line to high-impedance input; the bus pull-up takes
    /// it high.
    fn release(&mut self);

    /// Sample the current level.
    fn read_level(&self) -> Level;

    /// Enable the edge interrupt for the given edges. The single handler
    /// registered by the implementation's platform glue is expected to
    /// call back into [`crate::codec::rx::RxSession::on_edge`].
    fn enable_edge_irq(&mut self, mask: EdgeMask);

    /// Disable the edge interrupt entirely.
    fn disable_edge_irq(&mut self);

    /// Free-running microsecond counter.
    fn now_us(&self) -> u64;

    /// Schedule a one-shot callback identified by `token` to fire at
    /// `at_us` (an absolute `now_us()` timestamp). Implementations may
    /// invoke the callback from interrupt/alarm context.
    fn schedule_at(&mut self, at_us: u64, token: AlarmToken);
}

/// Identifies which pending alarm fired, so a single `CecLine` can
/// multiplex the ACK-release alarm (RX path) against TX bit-timing
/// alarms without two independent callback types.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlarmToken {
    /// Release the line after an asserted ACK (RX path, §4.2 ACK_LOW).
    AckRelease,
    /// Advance the TX state machine to its next bit (TX path).
    TxBit,
}
