//! USB HID keyboard usage IDs and the bounded key-event output channel.
//!
//! The USB HID producer itself is an external collaborator (spec.md
//! §1); this module only defines the numeric key codes the keymap maps
//! into and the lock-free queue the protocol engine pushes them onto.

/// Standard USB HID keyboard usage IDs (HID Usage Tables, Keyboard/Keypad
/// page), named the way the original firmware's `tusb`-derived
/// `HID_KEY_*` constants were, since the keymap presets below are
/// transcribed directly from that table.
pub mod key {
    pub const NONE: u8 = 0x00;
    pub const A: u8 = 0x04;
    pub const C: u8 = 0x06;
    pub const F: u8 = 0x09;
    pub const I: u8 = 0x0C;
    pub const L: u8 = 0x0F;
    pub const P: u8 = 0x13;
    pub const R: u8 = 0x15;
    pub const X: u8 = 0x1B;
    pub const N1: u8 = 0x1E;
    pub const N2: u8 = 0x1F;
    pub const N3: u8 = 0x20;
    pub const N4: u8 = 0x21;
    pub const N5: u8 = 0x22;
    pub const N6: u8 = 0x23;
    pub const N7: u8 = 0x24;
    pub const N8: u8 = 0x25;
    pub const N9: u8 = 0x26;
    pub const N0: u8 = 0x27;
    pub const ENTER: u8 = 0x28;
    pub const BACKSPACE: u8 = 0x2A;
    pub const SPACE: u8 = 0x2C;
    pub const F1: u8 = 0x3A;
    pub const F12: u8 = 0x45;
    pub const ARROW_RIGHT: u8 = 0x4F;
    pub const ARROW_LEFT: u8 = 0x50;
    pub const ARROW_DOWN: u8 = 0x51;
    pub const ARROW_UP: u8 = 0x52;
}

/// One entry posted to the HID producer. `Release` corresponds to the
/// "no key" sentinel (HID key `0`) spec.md §4.4 describes for
/// User Control Released.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyEvent {
    Pressed(u8),
    Release,
}

impl KeyEvent {
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Pressed(code) => code,
            Self::Release => key::NONE,
        }
    }
}

/// Capacity of the key output channel. Spec.md §4.5 requires `>= 16`.
pub const QUEUE_CAPACITY: usize = 16;

/// Bounded FIFO of HID key events, producer (protocol engine) to
/// consumer (external HID task). A full queue drops the new event
/// rather than blocking the codec (spec.md §4.5, §7): the remote will
/// repeat the button press.
pub type KeyQueue = heapless::spsc::Queue<KeyEvent, QUEUE_CAPACITY>;

/// Producer half of the key queue, held by the protocol engine.
pub struct KeyProducer<'a>(heapless::spsc::Producer<'a, KeyEvent, QUEUE_CAPACITY>);

impl<'a> KeyProducer<'a> {
    #[must_use]
    pub fn new(producer: heapless::spsc::Producer<'a, KeyEvent, QUEUE_CAPACITY>) -> Self {
        Self(producer)
    }

    /// Enqueue one event, dropping it silently if the queue is full.
    pub fn push(&mut self, event: KeyEvent) {
        let _ = self.0.enqueue(event);
    }
}
