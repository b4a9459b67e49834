//! Device Identity: display name, serial number, vendor ID, product ID.
//!
//! Each field is a separately reference-counted value.  Storing a value
//! retains it; replacing it releases the old one; the `new_*` queries hand
//! the caller an additional reference, while the `*_peek` accessors borrow
//! without touching the count.
//!
//! # Reference counting (for beginners)
//!
//! The HID subsystem expects to *own* the strings and numbers it receives:
//! it keeps them as long as it likes and releases them when done.  An
//! [`Arc`] models exactly that contract.  `Arc::clone` is the "retain"
//! (strong count + 1) and dropping an `Arc` is the "release" (strong count
//! − 1).  Because the device keeps its own `Arc`, a caller releasing every
//! reference it was handed can never free the value out from under the
//! device.
//!
//! Identity is written once, before the device is registered with the HID
//! subsystem, and is read-only afterwards; it needs no lock.

use std::sync::Arc;

/// A retained identity string.
pub type SharedString = Arc<str>;

/// A retained 32-bit identity number.
pub type SharedNumber = Arc<u32>;

/// The identity fields of a virtual device.
///
/// All fields start unset.  Queries on an unset field return `None`.
#[derive(Debug, Default, Clone)]
pub struct DeviceIdentity {
    name: Option<SharedString>,
    serial_number: Option<SharedString>,
    vendor_id: Option<SharedNumber>,
    product_id: Option<SharedNumber>,
}

impl DeviceIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retains `name` as the device name, releasing any previous value.
    pub fn set_name(&mut self, name: impl Into<SharedString>) {
        self.name = Some(name.into());
    }

    /// Retains `serial` as the serial number string, releasing any previous value.
    pub fn set_serial_number(&mut self, serial: impl Into<SharedString>) {
        self.serial_number = Some(serial.into());
    }

    /// Boxes `id` as the vendor ID, releasing any previous value.
    pub fn set_vendor_id(&mut self, id: u32) {
        self.vendor_id = Some(Arc::new(id));
    }

    /// Boxes `id` as the product ID, releasing any previous value.
    pub fn set_product_id(&mut self, id: u32) {
        self.product_id = Some(Arc::new(id));
    }

    /// Borrows the name without retaining it.
    pub fn name_peek(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Borrows the serial number without retaining it.
    pub fn serial_number_peek(&self) -> Option<&str> {
        self.serial_number.as_deref()
    }

    pub fn vendor_id_peek(&self) -> Option<u32> {
        self.vendor_id.as_deref().copied()
    }

    pub fn product_id_peek(&self) -> Option<u32> {
        self.product_id.as_deref().copied()
    }

    /// Returns a new reference to the name.  The caller owns the reference.
    pub fn new_name(&self) -> Option<SharedString> {
        self.name.clone()
    }

    /// Returns a new reference to the serial number string.
    pub fn new_serial_number(&self) -> Option<SharedString> {
        self.serial_number.clone()
    }

    /// Returns a new reference to the vendor ID number.
    pub fn new_vendor_id(&self) -> Option<SharedNumber> {
        self.vendor_id.clone()
    }

    /// Returns a new reference to the product ID number.
    pub fn new_product_id(&self) -> Option<SharedNumber> {
        self.product_id.clone()
    }

    /// Releases every held value.  Safe on a partially populated identity.
    pub fn clear(&mut self) {
        self.name = None;
        self.serial_number = None;
        self.vendor_id = None;
        self.product_id = None;
    }
}
