//! HID report types.

use serde::{Deserialize, Serialize};

/// The kind of report the host hands to, or receives from, the device.
///
/// Discriminants match the HID subsystem's numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum ReportType {
    Input = 0,
    Output = 1,
    Feature = 2,
}
