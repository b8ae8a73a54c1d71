//! CEC opcodes the protocol engine understands (spec.md §4.4), plus the
//! debug name tables from `hdmi-cec.c`'s `cec_message[]` /
//! `cec_feature_abort_reason[]`, carried here only for `defmt` logging.

/// Opcode byte values (CEC-standard numeric assignments, spec.md §6).
pub mod op {
    pub const FEATURE_ABORT: u8 = 0x00;
    pub const IMAGE_VIEW_ON: u8 = 0x04;
    pub const TEXT_VIEW_ON: u8 = 0x0d;
    pub const STANDBY: u8 = 0x36;
    pub const USER_CONTROL_PRESSED: u8 = 0x44;
    pub const USER_CONTROL_RELEASED: u8 = 0x45;
    pub const GIVE_OSD_NAME: u8 = 0x46;
    pub const SET_OSD_NAME: u8 = 0x47;
    pub const SYSTEM_AUDIO_MODE_REQUEST: u8 = 0x70;
    pub const GIVE_AUDIO_STATUS: u8 = 0x71;
    pub const SET_SYSTEM_AUDIO_MODE: u8 = 0x72;
    pub const GIVE_SYSTEM_AUDIO_MODE_STATUS: u8 = 0x7d;
    pub const SYSTEM_AUDIO_MODE_STATUS: u8 = 0x7e;
    pub const REPORT_AUDIO_STATUS: u8 = 0x7a;
    pub const ROUTING_CHANGE: u8 = 0x80;
    pub const GET_MENU_LANGUAGE: u8 = 0x81;
    pub const ACTIVE_SOURCE: u8 = 0x82;
    pub const GIVE_PHYSICAL_ADDRESS: u8 = 0x83;
    pub const REPORT_PHYSICAL_ADDRESS: u8 = 0x84;
    pub const REQUEST_ACTIVE_SOURCE: u8 = 0x85;
    pub const SET_STREAM_PATH: u8 = 0x86;
    pub const DEVICE_VENDOR_ID: u8 = 0x87;
    pub const GIVE_DEVICE_VENDOR_ID: u8 = 0x8c;
    pub const MENU_STATUS: u8 = 0x8e;
    pub const GIVE_DEVICE_POWER_STATUS: u8 = 0x8f;
    pub const REPORT_POWER_STATUS: u8 = 0x90;
    pub const INACTIVE_SOURCE: u8 = 0x9d;
    pub const CEC_VERSION: u8 = 0x9e;
    pub const GET_CEC_VERSION: u8 = 0x9f;
    pub const VENDOR_COMMAND_WITH_ID: u8 = 0xa0;
    pub const ABORT: u8 = 0xff;
}

/// Feature Abort reason codes (CEC Table 29).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum AbortReason {
    Unrecognized = 0,
    IncorrectMode = 1,
    NoSource = 2,
    Invalid = 3,
    Refused = 4,
    Undetermined = 5,
}

impl AbortReason {
    #[must_use]
    pub const fn get(self) -> u8 {
        self as u8
    }
}

/// Debug name for an opcode, for `defmt` trace logging only.
#[must_use]
pub const fn opcode_name(opcode: u8) -> Option<&'static str> {
    match opcode {
        op::FEATURE_ABORT => Some("Feature Abort"),
        op::IMAGE_VIEW_ON => Some("Image View On"),
        op::TEXT_VIEW_ON => Some("Text View On"),
        op::STANDBY => Some("Standby"),
        op::USER_CONTROL_PRESSED => Some("User Control Pressed"),
        op::USER_CONTROL_RELEASED => Some("User Control Released"),
        op::GIVE_OSD_NAME => Some("Give OSD Name"),
        op::SET_OSD_NAME => Some("Set OSD Name"),
        op::SYSTEM_AUDIO_MODE_REQUEST => Some("System Audio Mode Request"),
        op::GIVE_AUDIO_STATUS => Some("Give Audio Status"),
        op::SET_SYSTEM_AUDIO_MODE => Some("Set System Audio Mode"),
        op::GIVE_SYSTEM_AUDIO_MODE_STATUS => Some("Give System Audio Mode Status"),
        op::SYSTEM_AUDIO_MODE_STATUS => Some("System Audio Mode Status"),
        op::REPORT_AUDIO_STATUS => Some("Report Audio Status"),
        op::ROUTING_CHANGE => Some("Routing Change"),
        op::GET_MENU_LANGUAGE => Some("Get Menu Language"),
        op::ACTIVE_SOURCE => Some("Active Source"),
        op::GIVE_PHYSICAL_ADDRESS => Some("Give Physical Address"),
        op::REPORT_PHYSICAL_ADDRESS => Some("Report Physical Address"),
        op::REQUEST_ACTIVE_SOURCE => Some("Request Active Source"),
        op::SET_STREAM_PATH => Some("Set Stream Path"),
        op::DEVICE_VENDOR_ID => Some("Device Vendor ID"),
        op::GIVE_DEVICE_VENDOR_ID => Some("Give Device Vendor ID"),
        op::MENU_STATUS => Some("Menu Status"),
        op::GIVE_DEVICE_POWER_STATUS => Some("Give Device Power Status"),
        op::REPORT_POWER_STATUS => Some("Report Power Status"),
        op::INACTIVE_SOURCE => Some("Inactive Source"),
        op::CEC_VERSION => Some("CEC Version"),
        op::GET_CEC_VERSION => Some("Get CEC Version"),
        op::VENDOR_COMMAND_WITH_ID => Some("Vendor Command With ID"),
        op::ABORT => Some("Abort"),
        _ => None,
    }
}

/// Debug name for a Feature Abort reason, for `defmt` trace logging only.
#[must_use]
pub const fn abort_reason_name(reason: AbortReason) -> &'static str {
    match reason {
        AbortReason::Unrecognized => "Unrecognized opcode",
        AbortReason::IncorrectMode => "Not in correct mode to respond",
        AbortReason::NoSource => "Cannot provide source",
        AbortReason::Invalid => "Invalid operand",
        AbortReason::Refused => "Refused",
        AbortReason::Undetermined => "Undetermined",
    }
}
