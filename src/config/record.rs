//! At-rest wire format for the configuration record (spec.md §4.3, §6).
//!
//! Two body layouts are defined. Version 1 predates `logical_address`,
//! `device_type` and `keymap_type`; version 2 adds them. Encoding always
//! writes the current version; decoding accepts either and migrates
//! version 1 in place.

use crc::{Crc, CRC_32_ISO_HDLC};

use crate::addr::DeviceType;
use crate::config::keymap::{KeymapEntry, KeymapType, KEYMAP_LEN};

const CRC: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

pub const VERSION_1: u8 = 1;
pub const VERSION_2: u8 = 2;
pub const CURRENT_VERSION: u8 = VERSION_2;

const HEADER_LEN: usize = 1 + 4; // version + length
const HEADER_CRC_LEN: usize = 4;
const BODY_V1_LEN: usize = 4 + 2 + KEYMAP_LEN;
// edid_delay_ms(4) + physical_address(2) + logical_address(1) +
// device_type(1) + keymap_type(4) + keymap(255) = 267 bytes (spec.md §6).
const BODY_V2_LEN: usize = 4 + 2 + 1 + 1 + 4 + KEYMAP_LEN;
const BODY_CRC_LEN: usize = 4;

/// Size of an encoded version-2 record: every [`crate::config::Config`]
/// this crate writes out uses this length.
pub const RECORD_LEN: usize = HEADER_LEN + HEADER_CRC_LEN + BODY_V2_LEN + BODY_CRC_LEN;

/// The fields a record load/migrate pass produces. Keymap *names* are
/// not part of the wire format (spec.md §4.3 step 6 finalises them
/// afterwards from the canonical table); only `key` bytes round-trip.
#[derive(Debug, Clone)]
pub struct DecodedBody {
    pub edid_delay_ms: u32,
    pub physical_address: u16,
    pub logical_address: u8,
    pub device_type: DeviceType,
    pub keymap_type: KeymapType,
    pub keymap_keys: [u8; KEYMAP_LEN],
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Region too short to even hold a header.
    Truncated,
    /// Header CRC mismatch — flash never written, or corrupt.
    HeaderCrcMismatch,
    /// Body CRC mismatch for the version the header claims.
    BodyCrcMismatch,
    /// Header names a known version but the wrong body length for it.
    LengthMismatch,
    /// Header names a version this crate does not understand.
    UnknownVersion(u8),
}

/// Encode `body` as a current-version record into `out`, returning the
/// number of bytes written (always [`RECORD_LEN`]).
///
/// # Panics
///
/// Panics if `out` is shorter than [`RECORD_LEN`].
pub fn encode(body: &DecodedBody, out: &mut [u8]) -> usize {
    assert!(out.len() >= RECORD_LEN);
    out[0] = CURRENT_VERSION;
    out[1..5].copy_from_slice(&(BODY_V2_LEN as u32).to_le_bytes());
    let header_crc = CRC.checksum(&out[0..HEADER_LEN]);
    out[HEADER_LEN..HEADER_LEN + HEADER_CRC_LEN].copy_from_slice(&header_crc.to_le_bytes());

    let body_start = HEADER_LEN + HEADER_CRC_LEN;
    let body_end = body_start + BODY_V2_LEN;
    write_body_v2(body, &mut out[body_start..body_end]);
    let body_crc = CRC.checksum(&out[body_start..body_end]);
    out[body_end..body_end + BODY_CRC_LEN].copy_from_slice(&body_crc.to_le_bytes());

    RECORD_LEN
}

/// Decode a record from `bytes`, verifying header and body CRCs and
/// migrating a version-1 body if present (spec.md §4.3 load steps 2-4).
pub fn decode(bytes: &[u8]) -> Result<DecodedBody, DecodeError> {
    if bytes.len() < HEADER_LEN + HEADER_CRC_LEN {
        return Err(DecodeError::Truncated);
    }
    let version = bytes[0];
    let length = read_u32(bytes, 1) as usize;
    let stored_header_crc = read_u32(bytes, HEADER_LEN);
    if CRC.checksum(&bytes[0..HEADER_LEN]) != stored_header_crc {
        return Err(DecodeError::HeaderCrcMismatch);
    }

    let body_start = HEADER_LEN + HEADER_CRC_LEN;
    let body_end = body_start + length;
    if bytes.len() < body_end + BODY_CRC_LEN {
        return Err(DecodeError::Truncated);
    }
    let stored_body_crc = read_u32(bytes, body_end);
    if CRC.checksum(&bytes[body_start..body_end]) != stored_body_crc {
        return Err(DecodeError::BodyCrcMismatch);
    }

    match version {
        VERSION_1 if length == BODY_V1_LEN => Ok(migrate_v1(&bytes[body_start..body_end])),
        VERSION_2 if length == BODY_V2_LEN => Ok(read_body_v2(&bytes[body_start..body_end])),
        VERSION_1 | VERSION_2 => Err(DecodeError::LengthMismatch),
        other => Err(DecodeError::UnknownVersion(other)),
    }
}

/// Version-1 bodies have no `logical_address`/`device_type`/
/// `keymap_type`; migration sets the logical address unregistered, the
/// device type to the compile-time default, and the keymap type to the
/// default preset (spec.md §4.3 step 3) — the preset fill itself
/// happens afterwards in [`crate::config::Config::load`].
fn migrate_v1(body: &[u8]) -> DecodedBody {
    let edid_delay_ms = read_u32(body, 0);
    let physical_address = read_u16(body, 4);
    let mut keymap_keys = [0u8; KEYMAP_LEN];
    keymap_keys.copy_from_slice(&body[6..6 + KEYMAP_LEN]);
    DecodedBody {
        edid_delay_ms,
        physical_address,
        logical_address: 0x0F,
        device_type: DeviceType::Playback,
        keymap_type: KeymapType::default(),
        keymap_keys,
    }
}

fn write_body_v2(body: &DecodedBody, out: &mut [u8]) {
    out[0..4].copy_from_slice(&body.edid_delay_ms.to_le_bytes());
    out[4..6].copy_from_slice(&body.physical_address.to_le_bytes());
    out[6] = body.logical_address;
    out[7] = body.device_type.get();
    out[8..12].copy_from_slice(&u32::from(body.keymap_type.get()).to_le_bytes());
    out[12..12 + KEYMAP_LEN].copy_from_slice(&body.keymap_keys);
}

fn read_body_v2(body: &[u8]) -> DecodedBody {
    let edid_delay_ms = read_u32(body, 0);
    let physical_address = read_u16(body, 4);
    let logical_address = body[6];
    // legacy bug compensation: a stored TV device type is silently
    // rewritten to Playback (spec.md §4.3 step 4).
    let device_type = match DeviceType::try_from(body[7]) {
        Ok(DeviceType::Tv) | Err(_) => DeviceType::Playback,
        Ok(other) => other,
    };
    let keymap_type = KeymapType::from_u8(read_u32(body, 8) as u8);
    let mut keymap_keys = [0u8; KEYMAP_LEN];
    keymap_keys.copy_from_slice(&body[12..12 + KEYMAP_LEN]);
    DecodedBody {
        edid_delay_ms,
        physical_address,
        logical_address,
        device_type,
        keymap_type,
        keymap_keys,
    }
}

/// Read a little-endian `u32` at `offset`, by literal byte indexing
/// rather than a fallible `try_into` — every call site's offset is
/// already bounds-checked by the caller (record length/CRC checks), so
/// this never panics but also never pretends to be fallible.
#[inline]
fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Read a little-endian `u16` at `offset`; see [`read_u32`].
#[inline]
fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

/// Pack `keymap`'s key bytes into `DecodedBody.keymap_keys`, dropping
/// the (flash-absent) display names.
#[must_use]
pub fn keys_only(keymap: &[KeymapEntry; KEYMAP_LEN]) -> [u8; KEYMAP_LEN] {
    let mut out = [0u8; KEYMAP_LEN];
    for (slot, entry) in out.iter_mut().zip(keymap.iter()) {
        *slot = entry.key;
    }
    out
}
