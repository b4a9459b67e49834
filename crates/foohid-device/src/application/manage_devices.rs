//! DeviceFactory: creation, destruction, and lookup of devices by name.
//!
//! The factory is the privileged service's view of foohid.  Each service call
//! maps onto one method:
//!
//! | Call      | Method                      |
//! |-----------|-----------------------------|
//! | `Create`  | [`DeviceFactory::create`]   |
//! | `Destroy` | [`DeviceFactory::destroy`]  |
//! | `Send`    | [`DeviceFactory::send`]     |
//! | `List`    | [`DeviceFactory::list`]     |
//!
//! # Creation order
//!
//! ```text
//! name / channel already known?  → AlreadyExists (soft, existing device untouched)
//! channel name too long?         → BadArgument   (nothing attached or registered)
//! initialize + set_*             → start()       (attach to HID subsystem)
//!                                → open_control_channel()
//! ```
//!
//! If the channel registration fails the device stays attached and listed,
//! without peer connectivity, and the failure is still returned.

use std::collections::HashMap;
use std::sync::Arc;

use foohid_core::{
    decode_call, ChannelName, CreateDeviceRequest, HidError, ServiceCall, ServiceReply,
};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::application::control::ControlNamespace;
use crate::application::device::VirtualHidDevice;
use crate::application::hid_host::HidHost;

/// Registry of live devices keyed by display name.
pub struct DeviceFactory {
    host: Arc<dyn HidHost>,
    namespace: Arc<dyn ControlNamespace>,
    devices: Mutex<HashMap<String, Arc<VirtualHidDevice>>>,
}

impl DeviceFactory {
    pub fn new(host: Arc<dyn HidHost>, namespace: Arc<dyn ControlNamespace>) -> Self {
        Self {
            host,
            namespace,
            devices: Mutex::new(HashMap::new()),
        }
    }

    /// Builds, attaches, and publishes one device.
    ///
    /// # Errors
    ///
    /// - [`HidError::AlreadyExists`] (soft) if the name or channel is taken.
    /// - [`HidError::BadArgument`] if the channel name is too long or the
    ///   descriptor is empty.
    /// - The HID subsystem's attach error; the device is discarded.
    /// - [`HidError::RegistrationFailure`]; the device is kept without a channel.
    pub fn create(&self, request: CreateDeviceRequest) -> Result<Arc<VirtualHidDevice>, HidError> {
        let mut devices = self.devices.lock();

        if devices.contains_key(&request.name) {
            warn!(name = %request.name, "device already exists");
            return Err(HidError::AlreadyExists(request.name));
        }
        if devices
            .values()
            .any(|d| d.channel_name() == Some(request.channel_name.as_str()))
        {
            warn!(channel = %request.channel_name, "control channel already in use");
            return Err(HidError::AlreadyExists(request.channel_name));
        }
        ChannelName::new(request.channel_name.as_str())?;
        if request.descriptor.is_empty() {
            return Err(HidError::BadArgument("empty report descriptor".to_string()));
        }

        let mut device = VirtualHidDevice::initialize(request.role, Arc::clone(&self.host));
        device.set_descriptor(request.descriptor);
        device.set_name(request.name.as_str());
        device.set_serial_number(request.serial_number.as_str());
        device.set_vendor_id(request.vendor_id);
        device.set_product_id(request.product_id);
        device.start()?;

        let channel = device.open_control_channel(Arc::clone(&self.namespace), &request.channel_name);
        let device = Arc::new(device);
        devices.insert(request.name.clone(), Arc::clone(&device));

        match channel {
            Ok(id) => {
                info!(name = %request.name, channel = %request.channel_name, %id, "device created");
                Ok(device)
            }
            Err(e) => {
                warn!(
                    name = %request.name,
                    "device created without control channel: {e}"
                );
                Err(e)
            }
        }
    }

    /// Stops and removes the device named `name`.
    pub fn destroy(&self, name: &str) -> Result<(), HidError> {
        let device = self
            .devices
            .lock()
            .remove(name)
            .ok_or_else(|| HidError::NotFound(name.to_string()))?;
        device.stop();
        info!(name, "device destroyed");
        Ok(())
    }

    /// Injects an input report into the device named `name`.
    pub fn send(&self, name: &str, report: &[u8]) -> Result<(), HidError> {
        let device = self.get(name).ok_or_else(|| HidError::NotFound(name.to_string()))?;
        device.handle_input_report(report)
    }

    /// Names of all live devices, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.devices.lock().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn get(&self, name: &str) -> Option<Arc<VirtualHidDevice>> {
        self.devices.lock().get(name).cloned()
    }

    pub fn handle_call(&self, call: ServiceCall) -> Result<ServiceReply, HidError> {
        match call {
            ServiceCall::Create(request) => self.create(request).map(|_| ServiceReply::Done),
            ServiceCall::Destroy { name } => self.destroy(&name).map(|_| ServiceReply::Done),
            ServiceCall::Send { name, report } => {
                self.send(&name, &report).map(|_| ServiceReply::Done)
            }
            ServiceCall::List => Ok(ServiceReply::Devices(self.list())),
        }
    }

    /// Decodes a selector-prefixed service call and handles it.
    ///
    /// Malformed input is reported as [`HidError::BadArgument`].
    pub fn handle_raw(&self, bytes: &[u8]) -> Result<ServiceReply, HidError> {
        let call = decode_call(bytes).map_err(|e| HidError::BadArgument(e.to_string()))?;
        self.handle_call(call)
    }

    /// Stops and drops every device.
    pub fn shutdown(&self) {
        let drained: Vec<_> = self.devices.lock().drain().collect();
        for (name, device) in drained {
            device.stop();
            info!(name = %name, "device stopped at shutdown");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
