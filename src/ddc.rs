//! Engine-to-DDC interface (spec.md §6): resolving the physical address
//! over the shared DDC/EDID bus is delegated to an external
//! collaborator, since the DDC transport itself is out of scope for
//! this crate (spec.md §1).

use crate::addr::PhysicalAddress;

/// Queries the HDMI physical address from the EDID the sink exposes
/// over DDC. Implementations own the actual I2C/DDC transport.
pub trait DdcProbe {
    /// Resolve the physical address, or `None` if the probe failed
    /// (spec.md §4.4 step 3: "on failure the running address remains
    /// 0").
    fn query_physical_address(&mut self) -> Option<PhysicalAddress>;
}
