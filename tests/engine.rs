//! End-to-end scenarios against a fake `CecLine`/`DdcProbe`, driving the
//! protocol engine exactly the way the embedded task loop would (one
//! inbound frame, fully dispatched, per call).

use std::cell::Cell;

use cec_core::ddc::DdcProbe;
use cec_core::engine::opcode::op;
use cec_core::hid::{KeyEvent, KeyProducer, KeyQueue};
use cec_core::line::{AlarmToken, CecLine, EdgeMask, Level};
use cec_core::{Config, LogicalAddress, Message, PhysicalAddress, ProtocolEngine};

/// Real hardware's clock is free-running; this fake ticks on every read
/// so the busy-wait loops inside `cec_core::codec` make real progress
/// instead of spinning on a clock that never advances (see
/// `src/test_support.rs` for the same technique used by the crate's own
/// unit tests).
const AUTO_TICK_US: u64 = 1;

struct FakeLine {
    now_us: Cell<u64>,
    level: Level,
}

impl FakeLine {
    fn new() -> Self {
        Self {
            now_us: Cell::new(0),
            level: Level::High,
        }
    }
}

impl CecLine for FakeLine {
    fn set_output_low(&mut self) {
        self.level = Level::Low;
    }

    fn release(&mut self) {
        self.level = Level::High;
    }

    fn read_level(&self) -> Level {
        self.level
    }

    fn enable_edge_irq(&mut self, _mask: EdgeMask) {}

    fn disable_edge_irq(&mut self) {}

    fn now_us(&self) -> u64 {
        let now = self.now_us.get();
        self.now_us.set(now + AUTO_TICK_US);
        now
    }

    fn schedule_at(&mut self, _at_us: u64, _token: AlarmToken) {}
}

struct FakeDdc(Option<PhysicalAddress>);

impl DdcProbe for FakeDdc {
    fn query_physical_address(&mut self) -> Option<PhysicalAddress> {
        self.0
    }
}

/// A line whose ACK outcome is scripted per outbound message, to drive
/// the address-claim probe sequence through specific occupied/free
/// candidates (spec.md §8 scenario 2). The only `read_level` call a
/// `send()` ever makes while actually transmitting is the single ACK
/// sample after EOM (spec.md §4.2); every other `read_level` call
/// happens before the start bit is driven, during the bus-idleness
/// check, and always sees a free bus. Tracking "has the start bit for
/// this message been driven yet" is therefore enough to tell the two
/// apart without coupling to an internal call count.
struct ScriptedAckLine {
    now_us: Cell<u64>,
    in_flight: Cell<bool>,
    acks: std::cell::RefCell<std::collections::VecDeque<bool>>,
}

impl ScriptedAckLine {
    fn new(acks: &[bool]) -> Self {
        Self {
            now_us: Cell::new(0),
            in_flight: Cell::new(false),
            acks: std::cell::RefCell::new(acks.iter().copied().collect()),
        }
    }
}

impl CecLine for ScriptedAckLine {
    fn set_output_low(&mut self) {
        self.in_flight.set(true);
    }

    fn release(&mut self) {}

    fn read_level(&self) -> Level {
        if self.in_flight.get() {
            self.in_flight.set(false);
            let acked = self.acks.borrow_mut().pop_front().unwrap_or(false);
            return if acked { Level::Low } else { Level::High };
        }
        Level::High
    }

    fn enable_edge_irq(&mut self, _mask: EdgeMask) {}

    fn disable_edge_irq(&mut self) {}

    fn now_us(&self) -> u64 {
        let now = self.now_us.get();
        self.now_us.set(now + AUTO_TICK_US);
        now
    }

    fn schedule_at(&mut self, _at_us: u64, _token: AlarmToken) {}
}

fn started_engine(paddr: PhysicalAddress) -> (ProtocolEngine<'static>, FakeLine) {
    let queue: &'static mut KeyQueue = Box::leak(Box::new(heapless::spsc::Queue::new()));
    let (producer, _consumer) = queue.split();
    let mut config = Config::defaults();
    config.physical_address = paddr;
    let mut engine = ProtocolEngine::new(config, KeyProducer::new(producer));
    let mut line = FakeLine::new();
    let mut ddc = FakeDdc(None);
    engine.start(&mut line, &mut ddc, |_ms| {});
    (engine, line)
}

/// Scenario 1 (spec.md §8): bus empty, first candidate un-acked.
#[test]
fn address_claim_on_an_empty_bus_adopts_the_first_candidate() {
    let (engine, _line) = started_engine(PhysicalAddress::new(0x1000));
    assert_eq!(engine.laddr(), LogicalAddress::new(0x4));
    let stats = engine.stats();
    assert_eq!(stats.tx_noack_frames, 1);
    assert_eq!(stats.tx_frames, 0);
    assert_eq!(stats.rx_frames, 0);
}

/// Scenario 2 (spec.md §8): candidate 0x4 is occupied (acked), 0x8 is
/// free (not acked); the engine adopts 0x8.
#[test]
fn address_claim_falls_through_an_occupied_candidate_to_the_next_free_one() {
    let queue: &'static mut KeyQueue = Box::leak(Box::new(heapless::spsc::Queue::new()));
    let (producer, _consumer) = queue.split();
    let mut config = Config::defaults();
    config.physical_address = PhysicalAddress::new(0x1000);
    let mut engine = ProtocolEngine::new(config, KeyProducer::new(producer));
    let mut line = ScriptedAckLine::new(&[true, false]);
    let mut ddc = FakeDdc(None);
    engine.start(&mut line, &mut ddc, |_ms| {});

    assert_eq!(engine.laddr(), LogicalAddress::new(0x8));
    let stats = engine.stats();
    assert_eq!(stats.tx_noack_frames, 1);
    assert_eq!(stats.tx_frames, 1);
    assert_eq!(stats.rx_frames, 0);
}

/// Scenario 3: Give OSD Name, directed, replies with the literal name.
#[test]
fn give_osd_name_replies_with_pico_cec() {
    let (mut engine, mut line) = started_engine(PhysicalAddress::new(0x1000));
    let mut ddc = FakeDdc(None);
    let request = Message::new(LogicalAddress::TV, engine.laddr(), &[op::GIVE_OSD_NAME]);
    let before = engine.stats();
    engine.handle_message(&request, &mut line, &mut ddc);
    let after = engine.stats();
    assert_eq!(after.tx_frames + after.tx_noack_frames, before.tx_frames + before.tx_noack_frames + 1);
}

/// Scenario 4: an unrecognised directed opcode triggers Feature Abort.
#[test]
fn unknown_directed_opcode_triggers_feature_abort() {
    let (mut engine, mut line) = started_engine(PhysicalAddress::new(0x1000));
    let mut ddc = FakeDdc(None);
    let request = Message::new(LogicalAddress::TV, engine.laddr(), &[0xDD]);
    let before = engine.stats();
    engine.handle_message(&request, &mut line, &mut ddc);
    let after = engine.stats();
    assert_eq!(after.tx_frames + after.tx_noack_frames, before.tx_frames + before.tx_noack_frames + 1);
}

/// Scenario 5: a remote digit press enqueues the mapped HID key; the
/// matching release enqueues the "no key" sentinel.
#[test]
fn remote_digit_five_enqueues_the_mapped_key_then_release() {
    let queue: &'static mut KeyQueue = Box::leak(Box::new(heapless::spsc::Queue::new()));
    let (producer, mut consumer) = queue.split();
    let config = Config::defaults();
    assert_eq!(config.keymap_type, cec_core::config::keymap::KeymapType::Kodi);
    let mut engine = ProtocolEngine::new(config, KeyProducer::new(producer));
    let mut line = FakeLine::new();
    let mut ddc = FakeDdc(None);
    engine.start(&mut line, &mut ddc, |_ms| {});

    let press = Message::new(LogicalAddress::TV, engine.laddr(), &[op::USER_CONTROL_PRESSED, 0x25]);
    engine.handle_message(&press, &mut line, &mut ddc);
    assert_eq!(consumer.dequeue(), Some(KeyEvent::Pressed(cec_core::hid::key::N5)));

    let release = Message::new(LogicalAddress::TV, engine.laddr(), &[op::USER_CONTROL_RELEASED]);
    engine.handle_message(&release, &mut line, &mut ddc);
    assert_eq!(consumer.dequeue(), Some(KeyEvent::Release));
}

/// Scenario 6: the TV broadcasts Report Physical Address; the engine
/// re-resolves its physical address, re-claims a logical address, and
/// (since the fake DDC still returns a known address) re-broadcasts its
/// own Report Physical Address.
#[test]
fn tv_broadcast_report_physical_address_triggers_a_reclaim_and_rebroadcast() {
    let (mut engine, mut line) = started_engine(PhysicalAddress::new(0x2010));
    let mut ddc = FakeDdc(Some(PhysicalAddress::new(0x2010)));
    let before = engine.stats();
    let msg = Message::new(
        LogicalAddress::TV,
        LogicalAddress::BROADCAST,
        &[op::REPORT_PHYSICAL_ADDRESS, 0x20, 0x00, 0x00],
    );
    engine.handle_message(&msg, &mut line, &mut ddc);
    let after = engine.stats();
    // At least the reclaim's candidate poll(s) plus the rebroadcast went out.
    assert!(after.tx_frames + after.tx_noack_frames > before.tx_frames + before.tx_noack_frames);
    assert_eq!(engine.paddr(), PhysicalAddress::new(0x2010));
}
