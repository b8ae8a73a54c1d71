//! CEC User Control code → HID key mapping: the keymap table, its
//! presets, and the canonical name table used to finalise it.

use crate::hid::key;

/// Number of addressable User Control codes (spec.md §3: "0-254").
pub const KEYMAP_LEN: usize = 255;

/// One keymap slot. `key == 0` means unmapped; a mapped slot always
/// carries a `name` once [`crate::config::Config`] has run its
/// finalisation pass (spec.md §4.3 step 6, §3 invariant).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeymapEntry {
    pub key: u8,
    pub name: Option<&'static str>,
}

/// Built-in keymap presets. `Custom` leaves the table exactly as loaded
/// from flash/defaults, matching `cec_config_set_keymap`'s behaviour
/// when no recognised preset matches (it returns without touching the
/// keymap).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeymapType {
    Custom,
    #[default]
    Kodi,
    MiSTer,
}

impl KeymapType {
    #[must_use]
    pub const fn get(self) -> u8 {
        match self {
            Self::Custom => 0,
            Self::Kodi => 1,
            Self::MiSTer => 2,
        }
    }

    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Kodi,
            2 => Self::MiSTer,
            _ => Self::Custom,
        }
    }
}

/// Fill every slot of `keymap` from the preset's key table. `Custom`
/// leaves `keymap` untouched.
pub fn apply_preset(keymap_type: KeymapType, keymap: &mut [KeymapEntry; KEYMAP_LEN]) {
    let table: fn(u8) -> u8 = match keymap_type {
        KeymapType::Custom => return,
        KeymapType::Kodi => kodi_key,
        KeymapType::MiSTer => mister_key,
    };
    for (code, slot) in keymap.iter_mut().enumerate() {
        slot.key = table(code as u8);
    }
}

/// For every mapped slot, fill in the canonical display name. Unmapped
/// slots (`key == 0`) are left at `None` (spec.md §4.3 step 6).
pub fn finalise_names(keymap: &mut [KeymapEntry; KEYMAP_LEN]) {
    for (code, slot) in keymap.iter_mut().enumerate() {
        slot.name = if slot.key != 0 {
            user_control_name(code as u8)
        } else {
            None
        };
    }
}

/// The Kodi preset: directional + digits + media transport mapped to
/// matching HID keys (spec.md §4.3, full table).
const fn kodi_key(code: u8) -> u8 {
    match code {
        0x00 => key::ENTER,
        0x01 => key::ARROW_UP,
        0x02 => key::ARROW_DOWN,
        0x03 => key::ARROW_LEFT,
        0x04 => key::ARROW_RIGHT,
        0x0a => key::C,
        0x0d => key::BACKSPACE,
        0x20 => key::N0,
        0x21 => key::N1,
        0x22 => key::N2,
        0x23 => key::N3,
        0x24 => key::N4,
        0x25 => key::N5,
        0x26 => key::N6,
        0x27 => key::N7,
        0x28 => key::N8,
        0x29 => key::N9,
        0x35 => key::I,
        0x44 => key::P,
        0x45 => key::X,
        0x46 => key::SPACE,
        0x48 => key::R,
        0x49 => key::F,
        0x51 => key::L,
        _ => key::NONE,
    }
}

/// The MiSTer preset: directional + digits keep their natural keys;
/// `Select` maps to Enter for menu confirmation; every other labelled
/// code folds to F12, the MiSTer menu hotkey.
const fn mister_key(code: u8) -> u8 {
    match code {
        0x00 => key::ENTER,
        0x01 => key::ARROW_UP,
        0x02 => key::ARROW_DOWN,
        0x03 => key::ARROW_LEFT,
        0x04 => key::ARROW_RIGHT,
        0x20 => key::N0,
        0x21 => key::N1,
        0x22 => key::N2,
        0x23 => key::N3,
        0x24 => key::N4,
        0x25 => key::N5,
        0x26 => key::N6,
        0x27 => key::N7,
        0x28 => key::N8,
        0x29 => key::N9,
        0x05 | 0x06 | 0x07 | 0x08 | 0x0a | 0x0d | 0x35 | 0x41 | 0x42 | 0x44 | 0x45 | 0x46 | 0x48
        | 0x49 | 0x51 | 0x71 | 0x72 | 0x73 | 0x74 | 0x75 => key::F12,
        _ => key::NONE,
    }
}

/// Canonical CEC User Control Code name table (HDMI-CEC Table 23).
/// Incomplete by design: codes the standard doesn't assign a name this
/// system cares about resolve to `None`.
#[must_use]
pub const fn user_control_name(code: u8) -> Option<&'static str> {
    match code {
        0x00 => Some("Select"),
        0x01 => Some("Up"),
        0x02 => Some("Down"),
        0x03 => Some("Left"),
        0x04 => Some("Right"),
        0x05 => Some("Right-Up"),
        0x06 => Some("Right-Down"),
        0x07 => Some("Left-Up"),
        0x08 => Some("Left-Down"),
        0x0a => Some("Options"),
        0x0d => Some("Exit"),
        0x20 => Some("0"),
        0x21 => Some("1"),
        0x22 => Some("2"),
        0x23 => Some("3"),
        0x24 => Some("4"),
        0x25 => Some("5"),
        0x26 => Some("6"),
        0x27 => Some("7"),
        0x28 => Some("8"),
        0x29 => Some("9"),
        0x35 => Some("Display Information"),
        0x41 => Some("Volume Up"),
        0x42 => Some("Volume Down"),
        0x44 => Some("Play"),
        0x45 => Some("Stop"),
        0x46 => Some("Pause"),
        0x48 => Some("Rewind"),
        0x49 => Some("Fast Forward"),
        0x51 => Some("Sub Picture"),
        0x71 => Some("F1 (Blue)"),
        0x72 => Some("F2 (Red)"),
        0x73 => Some("F3 (Green)"),
        0x74 => Some("F4 (Yellow)"),
        0x75 => Some("F5"),
        _ => None,
    }
}
