//! HDMI-CEC link layer and protocol engine for a CEC-to-USB-HID keyboard
//! bridge.
//!
//! This crate is the hard part of a CEC-to-HID bridge: the bit-level
//! transmit/receive state machine ([`codec`]) driven by edge interrupts
//! and microsecond alarms on a single shared open-drain line, logical
//! address arbitration, the per-opcode protocol engine ([`engine`]) that
//! also enforces bus politeness (acks, feature-aborts, broadcast
//! replies), and the persistent configuration store ([`config`]) the
//! engine consults. The LED indicator, USB HID producer, command-line
//! console, EDID/DDC reader and flash geometry are external
//! collaborators, reached only through the [`ddc::DdcProbe`] and
//! [`flash::FlashStorage`] traits and the [`hid`] key-event queue; board
//! bring-up and task scheduling live outside this crate entirely.
#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg), feature(doc_auto_cfg))]

#[cfg(test)]
extern crate std;

pub mod addr;
pub mod codec;
pub mod config;
pub mod ddc;
pub mod engine;
pub mod flash;
pub mod hid;
pub mod line;
pub mod message;
pub mod stats;

#[cfg(test)]
mod test_support;

pub use addr::{ClaimOutcome, DeviceType, LogicalAddress, PhysicalAddress};
pub use config::Config;
pub use engine::ProtocolEngine;
pub use message::Message;
