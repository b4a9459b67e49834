//! HID subsystem seams.
//!
//! Two traits meet here:
//!
//! - [`HidDeviceProvider`] is what the HID subsystem calls *into*: the
//!   capability set {provide descriptor, provide identity fields, accept
//!   report} that every virtual device implements.
//! - [`HidHost`] is the HID subsystem as seen *from* a device: attach and
//!   detach, the base handling path for host reports, and the entry point for
//!   injected input reports.

use foohid_core::{DeviceId, HidError, ReportType, SharedNumber, SharedString};

/// Property snapshot published to the HID subsystem when a device attaches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceProperties {
    pub product: Option<String>,
    pub serial_number: Option<String>,
    pub vendor_id: Option<u32>,
    pub product_id: Option<u32>,
    pub descriptor_len: usize,
    /// Value of the `HIDDefaultBehavior` hint, absent for generic devices.
    pub default_behavior: Option<&'static str>,
}

/// Capability set the HID subsystem calls into.
///
/// The `new_*` queries return a value the caller owns: strings and numbers
/// come back with one extra reference, the descriptor as a fresh copy.
pub trait HidDeviceProvider: Send + Sync {
    fn new_report_descriptor(&self) -> Result<Vec<u8>, HidError>;
    fn new_product_string(&self) -> Option<SharedString>;
    fn new_serial_number_string(&self) -> Option<SharedString>;
    fn new_vendor_id_number(&self) -> Option<SharedNumber>;
    fn new_product_id_number(&self) -> Option<SharedNumber>;

    /// The host wrote an output or feature report to the device.
    fn set_report(&self, report: &[u8], report_type: ReportType) -> Result<(), HidError>;
}

/// The OS HID subsystem.
#[cfg_attr(test, mockall::automock)]
pub trait HidHost: Send + Sync {
    /// Registers a device with the input stack.
    fn attach(
        &self,
        device: DeviceId,
        properties: &DeviceProperties,
        descriptor: &[u8],
    ) -> Result<(), HidError>;

    /// Removes a device from the input stack.
    fn detach(&self, device: DeviceId);

    /// Base handling path for a report the host wrote to the device.
    fn base_set_report(
        &self,
        device: DeviceId,
        report: &[u8],
        report_type: ReportType,
    ) -> Result<(), HidError>;

    /// Delivers an input report produced by the device.
    fn handle_report(&self, device: DeviceId, report: &[u8]) -> Result<(), HidError>;
}
