//! RX state machine: wire bits in, assembled [`Message`] out.
//!
//! Driven entirely by [`RxSession::on_edge`], which platform glue calls
//! directly from the GPIO edge interrupt handler. The session owns its
//! message buffer (spec.md §9: "pointer-heavy frame structs become an
//! owned message buffer inside an RX session object"); there is nothing
//! here that blocks, allocates, or is unsafe to call from interrupt
//! context.

use crate::addr::LogicalAddress;
use crate::codec::timing::{
    in_window, BIT_RX_FIRST_MAX, BIT_RX_FIRST_MIN, BIT_RX_MAX, BIT_RX_MIN, DATA_LOW_LONG_MAX,
    DATA_LOW_LONG_MIN, DATA_LOW_MAX, DATA_LOW_MIN, START_LOW_MAX, START_LOW_MIN,
};
use crate::line::{AlarmToken, CecLine, Edge, EdgeMask};
use crate::message::{Message, MAX_LEN};

/// RX session state, named after the bit phase the session is currently
/// waiting to observe the boundary of (spec.md §4.2).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxState {
    /// Idle; waiting for the start bit's falling edge.
    StartLow,
    StartHigh,
    DataLow,
    DataHigh,
    EomLow,
    EomHigh,
    AckLow,
    AckHigh,
    /// Terminal: a complete message is ready.
    End,
    /// Terminal: a timing violation was observed.
    Abort,
}

/// Result of feeding one edge to the session.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxProgress {
    /// Still assembling the frame.
    Pending,
    /// A complete message is available via [`RxSession::take_message`].
    Done,
    /// A timing violation occurred; the frame is discarded.
    Aborted,
}

/// Owned RX session state. One instance lives for the duration of a
/// single inbound frame, from the first falling edge through END or
/// ABORT (spec.md: "single-instance... the codec is single-threaded at
/// the frame level").
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxSession {
    data: [u8; MAX_LEN],
    byte: u8,
    bit: u8,
    eom: bool,
    ack: bool,
    first: bool,
    anchor_us: u64,
    state: RxState,
    local_addr: LogicalAddress,
}

impl RxSession {
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            data: [0; MAX_LEN],
            byte: 0,
            bit: 0,
            eom: false,
            ack: false,
            first: false,
            anchor_us: 0,
            state: RxState::Abort,
            local_addr: LogicalAddress::BROADCAST,
        }
    }

    /// Arm the session for a new frame, addressed to `local_addr`.
    /// Enables the falling-edge interrupt to catch the start bit.
    pub fn begin(&mut self, local_addr: LogicalAddress, line: &mut impl CecLine) {
        self.data = [0; MAX_LEN];
        self.byte = 0;
        self.bit = 0;
        self.eom = false;
        self.ack = false;
        self.first = false;
        self.anchor_us = 0;
        self.state = RxState::StartLow;
        self.local_addr = local_addr;
        line.enable_edge_irq(EdgeMask::FALLING);
    }

    #[must_use]
    pub const fn state(&self) -> RxState {
        self.state
    }

    /// Extract the assembled message. Only meaningful once
    /// [`RxSession::on_edge`] has returned [`RxProgress::Done`].
    #[must_use]
    pub fn take_message(&self) -> Option<Message> {
        matches!(self.state, RxState::End).then(|| Message::from_raw(self.data, self.byte))
    }

    /// Feed one edge observed on the line. Must be called with the
    /// timestamp of the edge itself (`line.now_us()` sampled at the
    /// moment the interrupt fired).
    pub fn on_edge(&mut self, edge: Edge, line: &mut impl CecLine) -> RxProgress {
        let now = line.now_us();
        match (self.state, edge) {
            (RxState::StartLow, Edge::Falling) => {
                self.anchor_us = now;
                self.state = RxState::StartHigh;
                line.enable_edge_irq(EdgeMask::RISING);
                RxProgress::Pending
            }
            (RxState::StartHigh, Edge::Rising) => {
                let dur = now - self.anchor_us;
                if in_window(dur, START_LOW_MIN, START_LOW_MAX) {
                    self.first = true;
                    self.byte = 0;
                    self.bit = 0;
                    self.state = RxState::DataLow;
                    line.enable_edge_irq(EdgeMask::FALLING);
                    RxProgress::Pending
                } else {
                    self.abort(line)
                }
            }
            (RxState::DataLow, Edge::Falling) | (RxState::EomLow, Edge::Falling) => {
                let period = now - self.anchor_us;
                let (lo, hi) = if self.first {
                    (BIT_RX_FIRST_MIN, BIT_RX_FIRST_MAX)
                } else {
                    (BIT_RX_MIN, BIT_RX_MAX)
                };
                if in_window(period, lo, hi) {
                    self.anchor_us = now;
                    self.first = false;
                    self.state = if self.state == RxState::EomLow {
                        RxState::EomHigh
                    } else {
                        RxState::DataHigh
                    };
                    line.enable_edge_irq(EdgeMask::RISING);
                    RxProgress::Pending
                } else {
                    self.abort(line)
                }
            }
            (RxState::DataHigh, Edge::Rising) | (RxState::EomHigh, Edge::Rising) => {
                let Some(bit_val) = Self::classify(now - self.anchor_us) else {
                    return self.abort(line);
                };
                if self.state == RxState::EomHigh {
                    self.eom = bit_val;
                    self.state = RxState::AckLow;
                } else {
                    self.data[self.byte as usize] = (self.data[self.byte as usize] << 1)
                        | u8::from(bit_val);
                    self.bit += 1;
                    if self.bit > 7 {
                        self.byte += 1;
                        self.bit = 0;
                        self.state = RxState::EomLow;
                    } else {
                        self.state = RxState::DataLow;
                    }
                }
                line.enable_edge_irq(EdgeMask::FALLING);
                RxProgress::Pending
            }
            (RxState::AckLow, Edge::Falling) => {
                self.anchor_us = now;
                let dest = LogicalAddress::new(self.data[0]);
                if dest == self.local_addr && !dest.is_broadcast() {
                    line.set_output_low();
                    line.schedule_at(now + 1500, AlarmToken::AckRelease);
                    self.ack = true;
                }
                self.state = RxState::AckHigh;
                line.enable_edge_irq(EdgeMask::RISING);
                RxProgress::Pending
            }
            (RxState::AckHigh, Edge::Rising) => {
                if Self::classify(now - self.anchor_us).is_some() {
                    if self.eom {
                        self.state = RxState::End;
                        line.disable_edge_irq();
                        RxProgress::Done
                    } else {
                        self.state = RxState::DataLow;
                        line.enable_edge_irq(EdgeMask::FALLING);
                        RxProgress::Pending
                    }
                } else {
                    self.abort(line)
                }
            }
            _ => self.abort(line),
        }
    }

    /// Classify a low-phase duration as logical 1 (`Some(true)`), 0
    /// (`Some(false)`), or a timing violation (`None`).
    fn classify(low_us: u64) -> Option<bool> {
        if in_window(low_us, DATA_LOW_MIN, DATA_LOW_MAX) {
            Some(true)
        } else if in_window(low_us, DATA_LOW_LONG_MIN, DATA_LOW_LONG_MAX) {
            Some(false)
        } else {
            None
        }
    }

    fn abort(&mut self, line: &mut impl CecLine) -> RxProgress {
        self.state = RxState::Abort;
        line.disable_edge_irq();
        RxProgress::Aborted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeLine;

    fn send_start(line: &mut FakeLine, rx: &mut RxSession) {
        line.advance_us(3700);
        assert_eq!(rx.on_edge(Edge::Falling, line), RxProgress::Pending);
        line.advance_us(3700);
        assert_eq!(rx.on_edge(Edge::Rising, line), RxProgress::Pending);
    }

    fn send_byte(line: &mut FakeLine, rx: &mut RxSession, byte: u8, eom: bool, first: bool) {
        for i in 0..8u8 {
            let bit = (byte >> (7 - i)) & 1 == 1;
            let low = if bit { 600 } else { 1500 };
            let period = if first && i == 0 { 4500 } else { 2400 };
            line.advance_us(period - low);
            assert_eq!(rx.on_edge(Edge::Falling, line), RxProgress::Pending);
            line.advance_us(low);
            assert_eq!(rx.on_edge(Edge::Rising, line), RxProgress::Pending);
        }
        // EOM bit
        let eom_low = if eom { 600 } else { 1500 };
        line.advance_us(2400 - eom_low);
        assert_eq!(rx.on_edge(Edge::Falling, line), RxProgress::Pending);
        line.advance_us(eom_low);
        assert_eq!(rx.on_edge(Edge::Rising, line), RxProgress::Pending);
    }

    fn send_ack_not_us(line: &mut FakeLine, rx: &mut RxSession, last: bool) -> RxProgress {
        line.advance_us(1800);
        assert_eq!(rx.on_edge(Edge::Falling, line), RxProgress::Pending);
        line.advance_us(600);
        let progress = rx.on_edge(Edge::Rising, line);
        if last {
            assert_eq!(progress, RxProgress::Done);
        } else {
            assert_eq!(progress, RxProgress::Pending);
        }
        progress
    }

    #[test]
    fn decodes_a_single_byte_polling_message() {
        let mut line = FakeLine::new();
        let mut rx = RxSession::idle();
        rx.begin(LogicalAddress::new(0x4), &mut line);
        send_start(&mut line, &mut rx);
        send_byte(&mut line, &mut rx, 0x44, true, true);
        let done = send_ack_not_us(&mut line, &mut rx, true);
        assert_eq!(done, RxProgress::Done);
        let msg = rx.take_message().unwrap();
        assert_eq!(msg.as_bytes(), &[0x44]);
    }

    #[test]
    fn decodes_a_two_byte_directed_message() {
        let mut line = FakeLine::new();
        let mut rx = RxSession::idle();
        rx.begin(LogicalAddress::new(0x4), &mut line);
        send_start(&mut line, &mut rx);
        send_byte(&mut line, &mut rx, 0x04, false, true);
        send_ack_not_us(&mut line, &mut rx, false);
        send_byte(&mut line, &mut rx, 0x46, true, false);
        let done = send_ack_not_us(&mut line, &mut rx, true);
        assert_eq!(done, RxProgress::Done);
        let msg = rx.take_message().unwrap();
        assert_eq!(msg.as_bytes(), &[0x04, 0x46]);
    }

    #[test]
    fn asserts_ack_when_addressed_to_us() {
        let mut line = FakeLine::new();
        let mut rx = RxSession::idle();
        rx.begin(LogicalAddress::new(0x4), &mut line);
        send_start(&mut line, &mut rx);
        send_byte(&mut line, &mut rx, 0x04, true, true);
        // ACK bit falling edge: sender's short release pulse
        line.advance_us(1800);
        assert_eq!(rx.on_edge(Edge::Falling, &mut line), RxProgress::Pending);
        assert!(line.output_low_calls() >= 1);
        assert!(line.scheduled_alarm().is_some());
    }

    #[test]
    fn aborts_on_out_of_window_start_pulse() {
        let mut line = FakeLine::new();
        let mut rx = RxSession::idle();
        rx.begin(LogicalAddress::new(0x4), &mut line);
        line.advance_us(100);
        rx.on_edge(Edge::Falling, &mut line);
        line.advance_us(1000); // too short for a start bit
        let outcome = rx.on_edge(Edge::Rising, &mut line);
        assert_eq!(outcome, RxProgress::Aborted);
        assert_eq!(rx.state(), RxState::Abort);
    }
}
