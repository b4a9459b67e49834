//! Report Descriptor Store.
//!
//! Holds the caller-provided HID report descriptor.  The bytes are opaque:
//! foohid never parses them, its only obligation is byte-exact, length-exact
//! delivery of whatever it was given.
//!
//! # Copy-on-query
//!
//! The HID subsystem asks for the descriptor whenever it (re)builds its view
//! of the device.  Each query returns a *fresh* buffer so that a caller that
//! mutates its copy can never corrupt the stored original.  The copy is
//! allocated with [`Vec::try_reserve_exact`], which lets an allocation
//! failure surface as [`HidError::NoResources`] instead of aborting.

use crate::error::HidError;

/// An immutable, owned HID report descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDescriptor {
    bytes: Box<[u8]>,
}

impl ReportDescriptor {
    /// Takes ownership of `bytes` as the descriptor.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into().into_boxed_slice(),
        }
    }

    /// Descriptor length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns a fresh copy of the descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`HidError::NoResources`] if the copy cannot be allocated.
    pub fn copy_out(&self) -> Result<Vec<u8>, HidError> {
        let mut copy = Vec::new();
        copy.try_reserve_exact(self.bytes.len())
            .map_err(|_| HidError::NoResources {
                requested: self.bytes.len(),
            })?;
        copy.extend_from_slice(&self.bytes);
        Ok(copy)
    }
}

/// Sample report descriptors used by the default configuration and tests.
pub mod samples {
    /// FIDO U2F HID authenticator: one 64-byte input report and one 64-byte
    /// output report, no report IDs.
    pub const U2F: &[u8] = &[
        0x06, 0xd0, 0xf1, // USAGE_PAGE (FIDO Alliance)
        0x09, 0x01, //       USAGE (U2F HID Authenticator Device)
        0xa1, 0x01, //       COLLECTION (Application)
        0x09, 0x20, //         USAGE (Input Report Data)
        0x15, 0x00, //         LOGICAL_MINIMUM (0)
        0x26, 0xff, 0x00, //   LOGICAL_MAXIMUM (255)
        0x75, 0x08, //         REPORT_SIZE (8)
        0x95, 0x40, //         REPORT_COUNT (64)
        0x81, 0x02, //         INPUT (Data, Var, Abs)
        0x09, 0x21, //         USAGE (Output Report Data)
        0x15, 0x00, //         LOGICAL_MINIMUM (0)
        0x26, 0xff, 0x00, //   LOGICAL_MAXIMUM (255)
        0x75, 0x08, //         REPORT_SIZE (8)
        0x95, 0x40, //         REPORT_COUNT (64)
        0x91, 0x02, //         OUTPUT (Data, Var, Abs)
        0xc0, //             END_COLLECTION
    ];

    /// Three-button relative mouse with X/Y axes.
    pub const MOUSE: &[u8] = &[
        0x05, 0x01, // USAGE_PAGE (Generic Desktop)
        0x09, 0x02, // USAGE (Mouse)
        0xa1, 0x01, // COLLECTION (Application)
        0x09, 0x01, //   USAGE (Pointer)
        0xa1, 0x00, //   COLLECTION (Physical)
        0x05, 0x09, //     USAGE_PAGE (Button)
        0x19, 0x01, //     USAGE_MINIMUM (Button 1)
        0x29, 0x03, //     USAGE_MAXIMUM (Button 3)
        0x15, 0x00, //     LOGICAL_MINIMUM (0)
        0x25, 0x01, //     LOGICAL_MAXIMUM (1)
        0x95, 0x03, //     REPORT_COUNT (3)
        0x75, 0x01, //     REPORT_SIZE (1)
        0x81, 0x02, //     INPUT (Data, Var, Abs)
        0x95, 0x01, //     REPORT_COUNT (1)
        0x75, 0x05, //     REPORT_SIZE (5)
        0x81, 0x03, //     INPUT (Cnst, Var, Abs)
        0x05, 0x01, //     USAGE_PAGE (Generic Desktop)
        0x09, 0x30, //     USAGE (X)
        0x09, 0x31, //     USAGE (Y)
        0x15, 0x81, //     LOGICAL_MINIMUM (-127)
        0x25, 0x7f, //     LOGICAL_MAXIMUM (127)
        0x75, 0x08, //     REPORT_SIZE (8)
        0x95, 0x02, //     REPORT_COUNT (2)
        0x81, 0x06, //     INPUT (Data, Var, Rel)
        0xc0, //         END_COLLECTION
        0xc0, //       END_COLLECTION
    ];

    /// Boot-protocol keyboard with a 5-bit LED output report.
    pub const KEYBOARD: &[u8] = &[
        0x05, 0x01, // USAGE_PAGE (Generic Desktop)
        0x09, 0x06, // USAGE (Keyboard)
        0xa1, 0x01, // COLLECTION (Application)
        0x05, 0x07, //   USAGE_PAGE (Keyboard)
        0x19, 0xe0, //   USAGE_MINIMUM (Left Control)
        0x29, 0xe7, //   USAGE_MAXIMUM (Right GUI)
        0x15, 0x00, //   LOGICAL_MINIMUM (0)
        0x25, 0x01, //   LOGICAL_MAXIMUM (1)
        0x75, 0x01, //   REPORT_SIZE (1)
        0x95, 0x08, //   REPORT_COUNT (8)
        0x81, 0x02, //   INPUT (Data, Var, Abs)
        0x95, 0x01, //   REPORT_COUNT (1)
        0x75, 0x08, //   REPORT_SIZE (8)
        0x81, 0x01, //   INPUT (Cnst)
        0x95, 0x06, //   REPORT_COUNT (6)
        0x75, 0x08, //   REPORT_SIZE (8)
        0x15, 0x00, //   LOGICAL_MINIMUM (0)
        0x25, 0x65, //   LOGICAL_MAXIMUM (101)
        0x05, 0x07, //   USAGE_PAGE (Keyboard)
        0x19, 0x00, //   USAGE_MINIMUM (0)
        0x29, 0x65, //   USAGE_MAXIMUM (101)
        0x81, 0x00, //   INPUT (Data, Array)
        0x05, 0x08, //   USAGE_PAGE (LEDs)
        0x19, 0x01, //   USAGE_MINIMUM (Num Lock)
        0x29, 0x05, //   USAGE_MAXIMUM (Kana)
        0x95, 0x05, //   REPORT_COUNT (5)
        0x75, 0x01, //   REPORT_SIZE (1)
        0x91, 0x02, //   OUTPUT (Data, Var, Abs)
        0x95, 0x01, //   REPORT_COUNT (1)
        0x75, 0x03, //   REPORT_SIZE (3)
        0x91, 0x03, //   OUTPUT (Cnst, Var, Abs)
        0xc0, //       END_COLLECTION
    ];

    /// Looks up a sample by its configuration name.
    pub fn by_name(name: &str) -> Option<&'static [u8]> {
        match name.to_ascii_lowercase().as_str() {
            "u2f" => Some(U2F),
            "mouse" => Some(MOUSE),
            "keyboard" => Some(KEYBOARD),
            _ => None,
        }
    }
}
