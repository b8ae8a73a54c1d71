//! Protocol engine: the startup sequence, opcode dispatch, and the
//! observable state (`paddr`, `laddr`, `audio_status`, statistics, key
//! output) spec.md §4.4 describes.

pub mod opcode;

use crate::addr::{ClaimOutcome, LogicalAddress, PhysicalAddress};
use crate::codec;
use crate::config::Config;
use crate::ddc::DdcProbe;
use crate::hid::{KeyEvent, KeyProducer};
use crate::line::CecLine;
use crate::message::Message;
use crate::stats::{Statistics, StatsSnapshot};
use opcode::{op, AbortReason};

const VENDOR_ID: [u8; 3] = [0x00, 0x10, 0xFA];
const OSD_NAME: &[u8; 8] = b"Pico-CEC";
const CEC_VERSION_1_3A: u8 = 0x04;
const AUDIO_STATUS_FIXED_VOLUME: u8 = 0x32;

/// Minimum spacing between logical-address re-claims triggered by an
/// inbound broadcast Report Physical Address (spec.md §9 Open Question
/// (a): "rate-limit re-claims").
pub const RECLAIM_MIN_INTERVAL_US: u64 = 2_000_000;

/// Owns the running protocol state and dispatches inbound messages.
/// Generic over nothing: hardware access is always passed in per call,
/// since the engine itself holds no line/DDC handle (spec.md §9: the
/// engine's suspension points are the codec's, not this type's).
pub struct ProtocolEngine<'q> {
    config: Config,
    stats: Statistics,
    paddr: PhysicalAddress,
    laddr: LogicalAddress,
    audio_status: u8,
    last_reclaim_us: Option<u64>,
    keys: KeyProducer<'q>,
}

impl<'q> ProtocolEngine<'q> {
    #[must_use]
    pub fn new(config: Config, keys: KeyProducer<'q>) -> Self {
        Self {
            config,
            stats: Statistics::new(),
            paddr: PhysicalAddress::UNKNOWN,
            laddr: LogicalAddress::BROADCAST,
            audio_status: 0,
            last_reclaim_us: None,
            keys,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn paddr(&self) -> PhysicalAddress {
        self.paddr
    }

    #[must_use]
    pub fn laddr(&self) -> LogicalAddress {
        self.laddr
    }

    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Startup sequence steps 2-4 (spec.md §4.4): configuration load
    /// (step 1) already happened via [`Config::load`] before
    /// construction. Sleeping for `edid_delay_ms` is delegated to
    /// `delay_ms` since scheduling is out of scope for this crate
    /// (spec.md §1).
    pub fn start(
        &mut self,
        line: &mut impl CecLine,
        ddc: &mut impl DdcProbe,
        mut delay_ms: impl FnMut(u32),
    ) -> ClaimOutcome {
        delay_ms(self.config.edid_delay_ms);
        self.resolve_physical_address(ddc);
        self.claim_logical_address(line)
    }

    fn resolve_physical_address(&mut self, ddc: &mut impl DdcProbe) {
        self.paddr = if self.config.physical_address.is_unknown() {
            ddc.query_physical_address().unwrap_or(PhysicalAddress::UNKNOWN)
        } else {
            self.config.physical_address
        };
    }

    /// Iterate the candidate list, polling each in turn (spec.md §4.4
    /// step 4). An un-acked poll means the address is free.
    fn claim_logical_address(&mut self, line: &mut impl CecLine) -> ClaimOutcome {
        let mut outcome = ClaimOutcome::Unregistered;
        for &candidate in &LogicalAddress::PLAYBACK_CANDIDATES {
            let probe = Message::polling(candidate);
            let acked = codec::send(&probe, line);
            self.stats.record_tx_frame(acked);
            #[cfg(feature = "defmt")]
            defmt::debug!("poll {=u8:x}: {}", candidate.get(), if acked { "taken" } else { "free" });
            if !acked {
                outcome = ClaimOutcome::Claimed(candidate);
                break;
            }
        }
        self.laddr = outcome.address();
        #[cfg(feature = "defmt")]
        defmt::info!("claimed logical address {=u8:x}", self.laddr.get());
        outcome
    }

    /// Feed the outcome of one RX attempt into the engine: statistics
    /// bookkeeping (spec.md §4.2 steps 3-4) plus, on a completed frame,
    /// opcode dispatch (spec.md §4.4).
    pub fn on_rx_progress(
        &mut self,
        progress: codec::RxProgress,
        rx: &codec::RxSession,
        line: &mut impl CecLine,
        ddc: &mut impl DdcProbe,
    ) {
        match progress {
            codec::RxProgress::Done => {
                self.stats.record_rx_frame();
                if let Some(msg) = rx.take_message() {
                    #[cfg(feature = "defmt")]
                    defmt::debug!("rx {=[u8]:x}", msg.as_bytes());
                    self.handle_message(&msg, line, ddc);
                }
            }
            codec::RxProgress::Aborted => {
                #[cfg(feature = "defmt")]
                defmt::warn!("rx frame aborted on a bit-timing violation");
                self.stats.record_rx_abort();
            }
            codec::RxProgress::Pending => {}
        }
    }

    fn send_reply(&mut self, line: &mut impl CecLine, msg: &Message) {
        let acked = codec::send(msg, line);
        self.stats.record_tx_frame(acked);
        #[cfg(feature = "defmt")]
        defmt::debug!("tx {=[u8]:x} acked={}", msg.as_bytes(), acked);
    }

    fn feature_abort(&mut self, line: &mut impl CecLine, to: LogicalAddress, opcode: u8, reason: AbortReason) {
        #[cfg(feature = "defmt")]
        defmt::warn!(
            "feature abort {=u8:x} ({}): {}",
            opcode,
            opcode::opcode_name(opcode).unwrap_or("unknown"),
            opcode::abort_reason_name(reason),
        );
        let msg = Message::new(self.laddr, to, &[op::FEATURE_ABORT, opcode, reason.get()]);
        self.send_reply(line, &msg);
    }

    fn broadcast_physical_address(&mut self, line: &mut impl CecLine) {
        let bytes = self.paddr.bytes();
        let reply = Message::new(
            self.laddr,
            LogicalAddress::BROADCAST,
            &[op::REPORT_PHYSICAL_ADDRESS, bytes[0], bytes[1], self.config.device_type.get()],
        );
        self.send_reply(line, &reply);
    }

    /// Re-resolve the physical address and re-claim a logical address,
    /// rate-limited so a cascade of broadcast Report Physical Address
    /// messages (common when several devices power on together) does
    /// not retrigger the claim poll on every one of them.
    fn maybe_reclaim(&mut self, line: &mut impl CecLine, ddc: &mut impl DdcProbe) {
        let now = line.now_us();
        if let Some(last) = self.last_reclaim_us {
            if now.saturating_sub(last) < RECLAIM_MIN_INTERVAL_US {
                return;
            }
        }
        self.last_reclaim_us = Some(now);
        self.resolve_physical_address(ddc);
        self.claim_logical_address(line);
        if !self.paddr.is_unknown() {
            self.broadcast_physical_address(line);
        }
    }

    /// Dispatch one complete inbound message (spec.md §4.4). Polling
    /// messages carry no opcode and are ignored: the ACK already
    /// happened at the codec layer.
    pub fn handle_message(&mut self, msg: &Message, line: &mut impl CecLine, ddc: &mut impl DdcProbe) {
        let Some(opcode) = msg.opcode() else {
            return;
        };
        let initiator = msg.initiator();
        let destination = msg.destination();
        let directed = !self.laddr.is_broadcast() && destination == self.laddr;
        let broadcast_from_tv = initiator == LogicalAddress::TV && msg.is_broadcast();

        match opcode {
            op::IMAGE_VIEW_ON | op::TEXT_VIEW_ON | op::STANDBY => {}

            op::SYSTEM_AUDIO_MODE_REQUEST => {
                if directed {
                    let reply = Message::new(self.laddr, initiator, &[op::SET_SYSTEM_AUDIO_MODE, self.audio_status]);
                    self.send_reply(line, &reply);
                }
            }
            op::GIVE_AUDIO_STATUS => {
                if directed {
                    let reply =
                        Message::new(self.laddr, initiator, &[op::REPORT_AUDIO_STATUS, AUDIO_STATUS_FIXED_VOLUME]);
                    self.send_reply(line, &reply);
                }
            }
            op::SET_SYSTEM_AUDIO_MODE => {
                if let Some(&status) = msg.operands().first() {
                    self.audio_status = status;
                }
            }
            op::GIVE_SYSTEM_AUDIO_MODE_STATUS => {
                if directed {
                    let reply =
                        Message::new(self.laddr, initiator, &[op::SYSTEM_AUDIO_MODE_STATUS, self.audio_status]);
                    self.send_reply(line, &reply);
                }
            }

            op::ROUTING_CHANGE => {
                self.resolve_physical_address(ddc);
                let reply = Message::new(self.laddr, LogicalAddress::TV, &[op::IMAGE_VIEW_ON]);
                self.send_reply(line, &reply);
            }

            op::REPORT_PHYSICAL_ADDRESS => {
                if broadcast_from_tv {
                    self.maybe_reclaim(line, ddc);
                }
            }

            op::REQUEST_ACTIVE_SOURCE | op::SET_STREAM_PATH => {
                if !self.paddr.is_unknown() {
                    let bytes = self.paddr.bytes();
                    let reply =
                        Message::new(self.laddr, LogicalAddress::BROADCAST, &[op::ACTIVE_SOURCE, bytes[0], bytes[1]]);
                    self.send_reply(line, &reply);
                }
            }

            op::DEVICE_VENDOR_ID => {
                if broadcast_from_tv {
                    let reply = Message::new(
                        self.laddr,
                        LogicalAddress::BROADCAST,
                        &[op::DEVICE_VENDOR_ID, VENDOR_ID[0], VENDOR_ID[1], VENDOR_ID[2]],
                    );
                    self.send_reply(line, &reply);
                }
            }
            op::GIVE_DEVICE_VENDOR_ID => {
                if directed {
                    let reply = Message::new(
                        self.laddr,
                        LogicalAddress::BROADCAST,
                        &[op::DEVICE_VENDOR_ID, VENDOR_ID[0], VENDOR_ID[1], VENDOR_ID[2]],
                    );
                    self.send_reply(line, &reply);
                }
            }

            op::GIVE_DEVICE_POWER_STATUS => {
                if directed {
                    let reply = Message::new(self.laddr, initiator, &[op::REPORT_POWER_STATUS, 0x00]);
                    self.send_reply(line, &reply);
                }
                // Chromecast quirk: some units query power status
                // addressed to the TV's logical address even when this
                // device, not the TV, holds the CEC bus; without this
                // extra reply those units withhold volume keys.
                if self.config.chromecast_quirk && destination == LogicalAddress::TV {
                    let quirk_reply = Message::new(LogicalAddress::TV, initiator, &[op::REPORT_POWER_STATUS, 0x00]);
                    self.send_reply(line, &quirk_reply);
                }
            }

            op::GET_CEC_VERSION => {
                if directed {
                    let reply = Message::new(self.laddr, initiator, &[op::CEC_VERSION, CEC_VERSION_1_3A]);
                    self.send_reply(line, &reply);
                }
            }

            op::GIVE_OSD_NAME => {
                if directed {
                    let mut operands = [0u8; 1 + OSD_NAME.len()];
                    operands[0] = op::SET_OSD_NAME;
                    operands[1..].copy_from_slice(OSD_NAME);
                    let reply = Message::new(self.laddr, initiator, &operands);
                    self.send_reply(line, &reply);
                }
            }

            op::GIVE_PHYSICAL_ADDRESS => {
                if directed && !self.paddr.is_unknown() {
                    self.broadcast_physical_address(line);
                }
            }

            op::USER_CONTROL_PRESSED => {
                if let Some(&code) = msg.operands().first() {
                    if let Some(entry) = self.config.keymap.get(code as usize) {
                        if entry.key != 0 {
                            self.keys.push(KeyEvent::Pressed(entry.key));
                        }
                    }
                }
            }
            op::USER_CONTROL_RELEASED => {
                self.keys.push(KeyEvent::Release);
            }

            op::ABORT => {
                if directed {
                    self.feature_abort(line, initiator, opcode, AbortReason::Refused);
                }
            }

            op::FEATURE_ABORT
            | op::GET_MENU_LANGUAGE
            | op::ACTIVE_SOURCE
            | op::SYSTEM_AUDIO_MODE_STATUS
            | op::MENU_STATUS
            | op::REPORT_POWER_STATUS
            | op::INACTIVE_SOURCE
            | op::CEC_VERSION
            | op::VENDOR_COMMAND_WITH_ID => {}

            _ => {
                if directed {
                    self.feature_abort(line, initiator, opcode, AbortReason::Unrecognized);
                }
            }
        }
    }
}
