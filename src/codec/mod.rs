//! Frame codec: two cooperating state machines translating between
//! byte-oriented [`crate::message::Message`]s and the CEC wire format
//! (spec.md §4.2).

pub mod rx;
pub mod timing;
pub mod tx;

pub use rx::{RxProgress, RxSession, RxState};
pub use tx::{IdleMonitor, TxProgress, TxSession};

use crate::line::CecLine;
use crate::message::Message;

/// The codec's "Send operation" (spec.md §4.2 steps 1-5, minus the
/// statistics bookkeeping, which the caller owns): wait for bus
/// idleness, then drive a [`TxSession`] to completion by busy-waiting
/// `line.now_us()` up to each scheduled alarm in turn, the same way
/// [`IdleMonitor::wait_idle`] busy-waits on idle samples. Both are
/// bounded-duration waits for a deadline that is guaranteed to arrive,
/// not unbounded blocking — appropriate for a bit-banged line where the
/// engine task has nothing better to do until the frame is on the wire.
pub fn send(message: &Message, line: &mut impl CecLine) -> bool {
    line.disable_edge_irq();
    IdleMonitor::new().wait_idle(line);

    let mut tx = TxSession::idle();
    tx.begin(message, line);
    loop {
        while line.now_us() < tx.next_alarm_us() {}
        if let TxProgress::Done { acked } = tx.on_alarm(line) {
            return acked;
        }
    }
}
