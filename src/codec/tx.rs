//! TX state machine: a [`Message`] in, wire bits out.
//!
//! Unlike [`crate::codec::rx::RxSession`], the TX session is driven by
//! alarms computed from each bit's anchor timestamp rather than by
//! edges (spec.md §4.2): every wait, including the post-EOM ACK sample,
//! is an exactly-timed [`CecLine::schedule_at`] callback, so nothing in
//! this state machine ever busy-waits.

use crate::codec::timing::{DATA_LOW_0, DATA_LOW_1, DATA_PERIOD, SAMPLE, START_LOW_NOM, START_PERIOD};
use crate::line::{AlarmToken, CecLine, Level};
use crate::message::{Message, MAX_LEN};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum TxState {
    StartLow,
    StartHigh,
    DataLow,
    DataHigh,
    EomLow,
    EomHigh,
    AckWait,
    NextByte,
    Finish,
    End,
}

/// Outcome of feeding one alarm callback to the session.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxProgress {
    Pending,
    /// Transmission complete. `acked` reflects the last byte's ACK
    /// sample (spec.md §4.2 step 4).
    Done { acked: bool },
}

/// Owned TX session state for one outbound message.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TxSession {
    data: [u8; MAX_LEN],
    len: u8,
    byte: u8,
    bit: u8,
    anchor_us: u64,
    state: TxState,
    ack_bits: [bool; MAX_LEN],
    frame_acked: bool,
    next_alarm_us: u64,
}

impl TxSession {
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            data: [0; MAX_LEN],
            len: 0,
            byte: 0,
            bit: 7,
            anchor_us: 0,
            state: TxState::End,
            ack_bits: [false; MAX_LEN],
            frame_acked: false,
            next_alarm_us: 0,
        }
    }

    /// Begin transmitting `message`. The caller must have already
    /// established line idleness (see [`super::tx::IdleMonitor`]) and
    /// disabled the RX edge interrupt before calling this.
    pub fn begin(&mut self, message: &Message, line: &mut impl CecLine) {
        self.data = [0; MAX_LEN];
        self.data[..message.len() as usize].copy_from_slice(message.as_bytes());
        self.len = message.len();
        self.byte = 0;
        self.bit = 7;
        self.ack_bits = [false; MAX_LEN];
        self.frame_acked = false;
        self.anchor_us = line.now_us();
        line.set_output_low();
        self.state = TxState::StartLow;
        self.next_alarm_us = self.anchor_us + START_LOW_NOM;
        line.schedule_at(self.next_alarm_us, AlarmToken::TxBit);
    }

    #[must_use]
    pub fn ack_bits(&self) -> &[bool] {
        &self.ack_bits[..self.len as usize]
    }

    /// Absolute timestamp of the next scheduled alarm. Callers driving
    /// this session from a busy-wait (rather than a true interrupt)
    /// poll `line.now_us()` against this value before calling
    /// [`Self::on_alarm`] — see [`super::send`].
    #[must_use]
    pub const fn next_alarm_us(&self) -> u64 {
        self.next_alarm_us
    }

    /// Service one alarm callback.
    pub fn on_alarm(&mut self, line: &mut impl CecLine) -> TxProgress {
        let now = line.now_us();
        match self.state {
            TxState::StartLow => {
                line.release();
                self.state = TxState::StartHigh;
                self.next_alarm_us = self.anchor_us + START_PERIOD;
                line.schedule_at(self.next_alarm_us, AlarmToken::TxBit);
                TxProgress::Pending
            }
            TxState::StartHigh => {
                self.begin_bit(line, now);
                TxProgress::Pending
            }
            TxState::DataLow => {
                line.release();
                self.state = TxState::DataHigh;
                self.next_alarm_us = self.anchor_us + DATA_PERIOD;
                line.schedule_at(self.next_alarm_us, AlarmToken::TxBit);
                TxProgress::Pending
            }
            TxState::DataHigh => {
                if self.bit == 0 {
                    self.begin_eom(line, now);
                } else {
                    self.bit -= 1;
                    self.begin_bit(line, now);
                }
                TxProgress::Pending
            }
            TxState::EomLow => {
                line.release();
                self.state = TxState::EomHigh;
                self.next_alarm_us = self.anchor_us + DATA_PERIOD;
                line.schedule_at(self.next_alarm_us, AlarmToken::TxBit);
                TxProgress::Pending
            }
            TxState::EomHigh => {
                self.anchor_us = now;
                self.state = TxState::AckWait;
                self.next_alarm_us = self.anchor_us + SAMPLE;
                line.schedule_at(self.next_alarm_us, AlarmToken::TxBit);
                TxProgress::Pending
            }
            TxState::AckWait => {
                let acked = line.read_level() == Level::Low;
                self.ack_bits[self.byte as usize] = acked;
                self.frame_acked = acked;
                let remaining = DATA_PERIOD - SAMPLE;
                self.state = if self.byte + 1 < self.len {
                    TxState::NextByte
                } else {
                    TxState::Finish
                };
                self.next_alarm_us = now + remaining;
                line.schedule_at(self.next_alarm_us, AlarmToken::TxBit);
                TxProgress::Pending
            }
            TxState::NextByte => {
                self.byte += 1;
                self.bit = 7;
                self.begin_bit(line, now);
                TxProgress::Pending
            }
            TxState::Finish | TxState::End => {
                self.state = TxState::End;
                TxProgress::Done {
                    acked: self.frame_acked,
                }
            }
        }
    }

    fn begin_bit(&mut self, line: &mut impl CecLine, now: u64) {
        self.anchor_us = now;
        let bit_is_one = (self.data[self.byte as usize] >> self.bit) & 1 == 1;
        let low = if bit_is_one { DATA_LOW_1 } else { DATA_LOW_0 };
        line.set_output_low();
        self.state = TxState::DataLow;
        self.next_alarm_us = now + low;
        line.schedule_at(self.next_alarm_us, AlarmToken::TxBit);
    }

    fn begin_eom(&mut self, line: &mut impl CecLine, now: u64) {
        self.anchor_us = now;
        let is_last_byte = self.byte + 1 == self.len;
        let low = if is_last_byte { DATA_LOW_1 } else { DATA_LOW_0 };
        line.set_output_low();
        self.state = TxState::EomLow;
        self.next_alarm_us = now + low;
        line.schedule_at(self.next_alarm_us, AlarmToken::TxBit);
    }
}

/// Bus-idleness gate: `T_IDLE_BITS` consecutive high samples, one
/// `T_DATA_PERIOD` apart, before a send may begin (spec.md §4.2 step 2).
///
/// This is a genuine busy-poll, not an alarm-driven wait: spec.md lists
/// only RX-END/ABORT and TX-END as the engine's suspension points, so
/// idleness detection runs as a tight loop that re-checks on every tick
/// (spec.md §5, "no upper bound but must re-check on every tick").
#[derive(Debug)]
pub struct IdleMonitor {
    consecutive_high: u8,
}

impl IdleMonitor {
    #[must_use]
    pub const fn new() -> Self {
        Self { consecutive_high: 0 }
    }

    /// Block the caller until the line has been observed high for
    /// `T_IDLE_BITS` consecutive polls, `T_DATA_PERIOD` apart.
    pub fn wait_idle(&mut self, line: &mut impl CecLine) {
        self.consecutive_high = 0;
        let mut next_sample = line.now_us();
        while self.consecutive_high < crate::codec::timing::IDLE_BITS {
            while line.now_us() < next_sample {}
            self.observe(line.read_level());
            next_sample += DATA_PERIOD;
        }
    }

    /// Feed one sample; returns `true` once idleness has been confirmed.
    /// Exposed separately from [`Self::wait_idle`] for deterministic
    /// testing without a busy-loop.
    pub fn observe(&mut self, level: Level) -> bool {
        if level == Level::High {
            self.consecutive_high += 1;
        } else {
            self.consecutive_high = 0;
        }
        self.consecutive_high >= crate::codec::timing::IDLE_BITS
    }
}

impl Default for IdleMonitor {
    fn default() -> Self {
        Self::new()
    }
}
