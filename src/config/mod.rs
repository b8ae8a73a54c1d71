//! Configuration store: defaults, the versioned on-flash record, and the
//! keymap presets that fill it in (spec.md §4.3).

pub mod keymap;
pub mod record;

use crate::addr::{DeviceType, LogicalAddress, PhysicalAddress};
use crate::flash::{FlashError, FlashStorage};
use keymap::{KeymapEntry, KeymapType, KEYMAP_LEN};
use record::{DecodedBody, RECORD_LEN};

const DEFAULT_EDID_DELAY_MS: u32 = 5000;

/// Failure saving the configuration (spec.md §4.3: "fails... if the
/// record would not fit in the reserved region").
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SaveError {
    TooLarge,
    Hardware,
}

impl From<FlashError> for SaveError {
    fn from(err: FlashError) -> Self {
        match err {
            FlashError::TooLarge => Self::TooLarge,
            FlashError::Hardware => Self::Hardware,
        }
    }
}

/// In-memory configuration (spec.md §3 "Configuration" table).
///
/// `logical_address` is reserved: it round-trips through the flash
/// record but the address-claim algorithm in
/// [`crate::engine::ProtocolEngine`] always (re)probes the candidate
/// list rather than trusting a stored value (spec.md §3 invariant).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub edid_delay_ms: u32,
    pub physical_address: PhysicalAddress,
    pub logical_address: LogicalAddress,
    pub device_type: DeviceType,
    pub keymap_type: KeymapType,
    pub keymap: [KeymapEntry; KEYMAP_LEN],
    /// Gates the Chromecast power-status quirk (spec.md §9 REDESIGN FLAG
    /// b). Not part of the on-flash record: this is a compile-time
    /// behavioural switch, not user-configurable state.
    pub chromecast_quirk: bool,
}

impl Config {
    /// Compile-time defaults (spec.md §4.3 load step 1).
    #[must_use]
    pub fn defaults() -> Self {
        let mut keymap = [KeymapEntry::default(); KEYMAP_LEN];
        keymap::apply_preset(KeymapType::default(), &mut keymap);
        keymap::finalise_names(&mut keymap);
        Self {
            edid_delay_ms: DEFAULT_EDID_DELAY_MS,
            physical_address: PhysicalAddress::UNKNOWN,
            logical_address: LogicalAddress::BROADCAST,
            device_type: DeviceType::Playback,
            keymap_type: KeymapType::default(),
            keymap,
            chromecast_quirk: true,
        }
    }

    /// Run the full load sequence (spec.md §4.3 steps 1-6): defaults,
    /// flash overlay (with version-1 migration if applicable), preset
    /// fill, and name finalisation.
    #[must_use]
    pub fn load(flash: &impl FlashStorage) -> Self {
        let mut config = Self::defaults();

        let mut buf = [0u8; RECORD_LEN];
        let to_read = buf.len().min(flash.capacity());
        flash.read(0, &mut buf[..to_read]);

        match record::decode(&buf[..to_read]) {
            Ok(body) => config.apply_decoded(&body),
            Err(_err) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("nvs record rejected ({}), falling back to defaults", _err);
            }
        }

        if config.keymap_type != KeymapType::Custom {
            keymap::apply_preset(config.keymap_type, &mut config.keymap);
        }
        keymap::finalise_names(&mut config.keymap);
        config
    }

    fn apply_decoded(&mut self, body: &DecodedBody) {
        self.edid_delay_ms = body.edid_delay_ms;
        self.physical_address = PhysicalAddress::new(body.physical_address);
        self.logical_address = LogicalAddress::new(body.logical_address);
        self.device_type = body.device_type;
        self.keymap_type = body.keymap_type;
        for (slot, &key) in self.keymap.iter_mut().zip(body.keymap_keys.iter()) {
            slot.key = key;
        }
    }

    /// Serialise the current configuration as a version-2 record and
    /// write it to `flash` (spec.md §4.3 save sequence): erase the
    /// covering sectors, program the record, under the caller's
    /// interrupts-disabled discipline (spec.md §5: the caller, not this
    /// method, owns that window since it spans erase *and* program).
    pub fn save(&self, flash: &mut impl FlashStorage) -> Result<(), SaveError> {
        if RECORD_LEN > flash.capacity() {
            #[cfg(feature = "defmt")]
            defmt::warn!("nvs save rejected: record does not fit the reserved region");
            return Err(SaveError::TooLarge);
        }
        let body = DecodedBody {
            edid_delay_ms: self.edid_delay_ms,
            physical_address: self.physical_address.get(),
            logical_address: self.logical_address.get(),
            device_type: self.device_type,
            keymap_type: self.keymap_type,
            keymap_keys: record::keys_only(&self.keymap),
        };
        let mut buf = [0u8; RECORD_LEN];
        record::encode(&body, &mut buf);

        let erase_len = flash.sectors_for(RECORD_LEN) * flash.sector_size();
        flash.erase(0, erase_len)?;
        flash.program(0, &buf)?;
        Ok(())
    }
}
