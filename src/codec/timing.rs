//! Bit-timing constants from the HDMI-CEC electrical specification, in
//! microseconds. Values must be reproduced exactly (spec.md §4.2).

/// Start-bit low duration window accepted on receive.
pub const START_LOW_MIN: u64 = 3500;
pub const START_LOW_MAX: u64 = 3900;
/// Start-bit low duration driven on transmit.
pub const START_LOW_NOM: u64 = 3700;
/// Start-bit total period driven on transmit.
pub const START_PERIOD: u64 = 4500;

/// Data-bit "1" low duration window accepted on receive.
pub const DATA_LOW_MIN: u64 = 400;
pub const DATA_LOW_MAX: u64 = 800;
/// Data-bit "0" low duration window accepted on receive.
pub const DATA_LOW_LONG_MIN: u64 = 1300;
pub const DATA_LOW_LONG_MAX: u64 = 1700;
/// Data-bit "1" low duration driven on transmit.
pub const DATA_LOW_1: u64 = 600;
/// Data-bit "0" low duration driven on transmit.
pub const DATA_LOW_0: u64 = 1500;
/// Data-bit total period driven on transmit.
pub const DATA_PERIOD: u64 = 2400;

/// Offset from the ACK bit anchor at which the sender samples the line
/// for an acknowledgement (midpoint of the safe 850-1250 us window).
pub const SAMPLE: u64 = 1050;

/// First-bit period window accepted on receive (start bit skews the
/// very first data bit's timing reference).
pub const BIT_RX_FIRST_MIN: u64 = 4300;
pub const BIT_RX_FIRST_MAX: u64 = 4700;
/// Subsequent bit period window accepted on receive.
pub const BIT_RX_MIN: u64 = 2050;
pub const BIT_RX_MAX: u64 = 2750;

/// Bit-times of continuous "high" required before TX may begin.
pub const IDLE_BITS: u8 = 7;

/// `true` if `duration` falls in `[lo, hi]` inclusive.
#[inline]
#[must_use]
pub const fn in_window(duration: u64, lo: u64, hi: u64) -> bool {
    duration >= lo && duration <= hi
}
