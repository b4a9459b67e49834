//! VirtualHidDevice: the Device Object.
//!
//! # Lifecycle
//!
//! ```text
//! initialize(role, host)
//!   → set_descriptor / set_name / set_serial_number / set_vendor_id / set_product_id
//!   → start()                    attach to the HID subsystem
//!   → open_control_channel()     publish the control channel
//!   … peers connect and disconnect, host reports flow …
//!   → stop()                     deregister the channel, detach
//!   → teardown() / Drop          release identity and descriptor
//! ```
//!
//! Configuration (`set_*`, `start`, `open_control_channel`) happens through
//! `&mut self` before the device is shared.  Once published behind an `Arc`
//! the identity and descriptor are read-only; only the endpoint's connection
//! state changes, and it carries its own lock.
//!
//! Every resource is an owned `Option`, so `teardown` releases whatever was
//! acquired and can run any number of times after any partial setup.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use foohid_core::{
    ChannelId, ConnectionState, DeviceId, DeviceIdentity, DeviceRole, HidError, ReportDescriptor,
    ReportType, SharedNumber, SharedString,
};
use tracing::{debug, info, warn};

use crate::application::control::{ControlNamespace, InboundSink};
use crate::application::endpoint::ControlEndpoint;
use crate::application::hid_host::{DeviceProperties, HidDeviceProvider, HidHost};

/// Routes datagrams a peer sends into the HID subsystem as input reports.
struct HostInbound {
    device: DeviceId,
    host: Arc<dyn HidHost>,
}

impl InboundSink for HostInbound {
    fn deliver(&self, datagram: &[u8]) -> Result<(), HidError> {
        submit_input_report(self.host.as_ref(), self.device, datagram)
    }
}

/// Single entry point for input reports, whether they come from a caller or
/// from a peer datagram.
fn submit_input_report(host: &dyn HidHost, device: DeviceId, report: &[u8]) -> Result<(), HidError> {
    if report.is_empty() {
        return Err(HidError::BadArgument("empty input report".to_string()));
    }
    host.handle_report(device, report)
}

/// A virtual HID device backed by a control channel.
pub struct VirtualHidDevice {
    id: DeviceId,
    role: DeviceRole,
    host: Arc<dyn HidHost>,
    descriptor: Option<ReportDescriptor>,
    identity: DeviceIdentity,
    endpoint: Option<ControlEndpoint>,
    attached: AtomicBool,
}

impl VirtualHidDevice {
    /// Prepares an empty device with the given role hint.
    ///
    /// There is no base object that can fail to initialise, so this cannot
    /// fail.
    pub fn initialize(role: DeviceRole, host: Arc<dyn HidHost>) -> Self {
        let id = DeviceId::new();
        debug!(device = %id, ?role, "device initialised");
        Self {
            id,
            role,
            host,
            descriptor: None,
            identity: DeviceIdentity::new(),
            endpoint: None,
            attached: AtomicBool::new(false),
        }
    }

    // ── Configuration ─────────────────────────────────────────────────────────

    /// Stores an owned copy of `bytes` as the report descriptor.
    pub fn set_descriptor(&mut self, bytes: impl Into<Vec<u8>>) {
        let descriptor = ReportDescriptor::new(bytes);
        debug!(device = %self.id, len = descriptor.len(), "descriptor set");
        self.descriptor = Some(descriptor);
    }

    pub fn set_name(&mut self, name: impl Into<SharedString>) {
        self.identity.set_name(name);
    }

    pub fn set_serial_number(&mut self, serial: impl Into<SharedString>) {
        self.identity.set_serial_number(serial);
    }

    pub fn set_vendor_id(&mut self, id: u32) {
        self.identity.set_vendor_id(id);
    }

    pub fn set_product_id(&mut self, id: u32) {
        self.identity.set_product_id(id);
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn role(&self) -> DeviceRole {
        self.role
    }

    /// Borrows the display name without retaining it.
    pub fn name(&self) -> Option<&str> {
        self.identity.name_peek()
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    pub fn channel_id(&self) -> Option<ChannelId> {
        self.endpoint.as_ref().and_then(ControlEndpoint::channel_id)
    }

    /// The registered control channel's name, if one is registered.
    pub fn channel_name(&self) -> Option<&str> {
        self.endpoint
            .as_ref()
            .filter(|ep| ep.is_registered())
            .map(|ep| ep.name().as_str())
    }

    /// `Disconnected` when no channel was ever registered.
    pub fn connection_state(&self) -> ConnectionState {
        self.endpoint
            .as_ref()
            .map(ControlEndpoint::state)
            .unwrap_or_default()
    }

    /// Property snapshot published to the HID subsystem.
    pub fn properties(&self) -> DeviceProperties {
        DeviceProperties {
            product: self.identity.name_peek().map(str::to_owned),
            serial_number: self.identity.serial_number_peek().map(str::to_owned),
            vendor_id: self.identity.vendor_id_peek(),
            product_id: self.identity.product_id_peek(),
            descriptor_len: self.descriptor.as_ref().map_or(0, ReportDescriptor::len),
            default_behavior: self.role.default_behavior(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Attaches the device to the HID subsystem.
    ///
    /// # Errors
    ///
    /// - [`HidError::BadArgument`] if no descriptor has been set.
    /// - [`HidError::NoResources`] if the descriptor copy cannot be allocated.
    /// - Whatever the HID subsystem reports for the attach itself.
    pub fn start(&self) -> Result<(), HidError> {
        let descriptor = self
            .descriptor
            .as_ref()
            .ok_or_else(|| HidError::BadArgument("no report descriptor set".to_string()))?;
        let copy = descriptor.copy_out()?;
        let properties = self.properties();

        self.host.attach(self.id, &properties, &copy)?;
        self.attached.store(true, Ordering::Release);
        info!(
            device = %self.id,
            name = properties.product.as_deref().unwrap_or("<unnamed>"),
            descriptor_len = copy.len(),
            "device attached to HID subsystem"
        );
        Ok(())
    }

    /// Publishes the device's control channel under `name`.
    ///
    /// # Errors
    ///
    /// - [`HidError::AlreadyExists`] if this device already has a channel.
    /// - [`HidError::BadArgument`] if `name` is too long.
    /// - [`HidError::RegistrationFailure`] if the namespace refuses it; the
    ///   device stays usable without peer connectivity.
    pub fn open_control_channel(
        &mut self,
        namespace: Arc<dyn ControlNamespace>,
        name: &str,
    ) -> Result<ChannelId, HidError> {
        if let Some(existing) = &self.endpoint {
            return Err(HidError::AlreadyExists(existing.name().to_string()));
        }

        let inbound = Arc::new(HostInbound {
            device: self.id,
            host: Arc::clone(&self.host),
        });
        let endpoint = ControlEndpoint::register(namespace, name, inbound)?;
        let id = endpoint
            .channel_id()
            .ok_or_else(|| HidError::RegistrationFailure(name.to_string()))?;
        self.endpoint = Some(endpoint);
        Ok(id)
    }

    /// Handles a report the host wrote to the device.
    ///
    /// The report is relayed to the connected peer (if any) as one datagram,
    /// then always passed to the base handling path.  A failed relay is
    /// logged and does not stop the base path.
    pub fn accept_host_report(&self, report: &[u8], report_type: ReportType) -> Result<(), HidError> {
        if let Some(endpoint) = &self.endpoint {
            match endpoint.enqueue(report) {
                Ok(true) => debug!(device = %self.id, len = report.len(), ?report_type, "host report relayed"),
                Ok(false) => {}
                Err(e) => warn!(device = %self.id, "failed to relay host report: {e}"),
            }
        }
        self.host.base_set_report(self.id, report, report_type)
    }

    /// Hands an input report from user space to the HID subsystem.
    pub fn handle_input_report(&self, report: &[u8]) -> Result<(), HidError> {
        submit_input_report(self.host.as_ref(), self.id, report)
    }

    /// Deregisters the control channel and detaches from the HID subsystem.
    ///
    /// Idempotent.  Connected peers see end-of-stream.
    pub fn stop(&self) {
        if let Some(endpoint) = &self.endpoint {
            if let Err(e) = endpoint.deregister() {
                warn!(device = %self.id, "control channel deregistration failed: {e}");
            }
        }
        if self.attached.swap(false, Ordering::AcqRel) {
            self.host.detach(self.id);
            info!(device = %self.id, "device detached from HID subsystem");
        }
    }

    /// Releases every resource the device holds.  Safe after partial setup
    /// and safe to call more than once.
    pub fn teardown(&mut self) {
        self.stop();
        let had_endpoint = self.endpoint.take().is_some();
        let had_descriptor = self.descriptor.take().is_some();
        self.identity.clear();
        if had_endpoint || had_descriptor {
            debug!(device = %self.id, "device torn down");
        }
    }
}

impl std::fmt::Debug for VirtualHidDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualHidDevice")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("name", &self.name())
            .field("attached", &self.is_attached())
            .field("state", &self.connection_state())
            .finish_non_exhaustive()
    }
}

impl Drop for VirtualHidDevice {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl HidDeviceProvider for VirtualHidDevice {
    fn new_report_descriptor(&self) -> Result<Vec<u8>, HidError> {
        self.descriptor
            .as_ref()
            .ok_or_else(|| HidError::BadArgument("no report descriptor set".to_string()))?
            .copy_out()
    }

    fn new_product_string(&self) -> Option<SharedString> {
        self.identity.new_name()
    }

    fn new_serial_number_string(&self) -> Option<SharedString> {
        self.identity.new_serial_number()
    }

    fn new_vendor_id_number(&self) -> Option<SharedNumber> {
        self.identity.new_vendor_id()
    }

    fn new_product_id_number(&self) -> Option<SharedNumber> {
        self.identity.new_product_id()
    }

    fn set_report(&self, report: &[u8], report_type: ReportType) -> Result<(), HidError> {
        self.accept_host_report(report, report_type)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::hid_host::MockHidHost;
    use crate::infrastructure::control_namespace::LocalControlNamespace;
    use foohid_core::domain::descriptor::samples;

    fn quiet_host() -> MockHidHost {
        let mut host = MockHidHost::new();
        host.expect_attach().returning(|_, _, _| Ok(()));
        host.expect_detach().return_const(());
        host.expect_base_set_report().returning(|_, _, _| Ok(()));
        host.expect_handle_report().returning(|_, _| Ok(()));
        host
    }

    fn u2f_device(host: MockHidHost) -> VirtualHidDevice {
        let mut device = VirtualHidDevice::initialize(DeviceRole::Generic, Arc::new(host));
        device.set_descriptor(samples::U2F);
        device.set_name("Foohid Virtual U2F");
        device.set_serial_number("SN 123456");
        device.set_vendor_id(2);
        device.set_product_id(3);
        device
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    #[test]
    fn test_descriptor_query_returns_independent_copy() {
        // Arrange
        let device = u2f_device(quiet_host());

        // Act
        let mut first = device.new_report_descriptor().unwrap();
        first[0] = 0xFF;
        let second = device.new_report_descriptor().unwrap();

        // Assert
        assert_eq!(second, samples::U2F);
    }

    #[test]
    fn test_descriptor_query_without_descriptor_is_bad_argument() {
        let device = VirtualHidDevice::initialize(DeviceRole::Generic, Arc::new(quiet_host()));
        assert!(matches!(
            device.new_report_descriptor(),
            Err(HidError::BadArgument(_))
        ));
    }

    #[test]
    fn test_identity_queries_retain_once_per_call() {
        // Arrange
        let device = u2f_device(quiet_host());
        let held = device.new_product_string().unwrap();
        let baseline = Arc::strong_count(&held);

        // Act
        let a = device.new_product_string().unwrap();
        let b = device.new_product_string().unwrap();

        // Assert
        assert_eq!(&*a, "Foohid Virtual U2F");
        assert_eq!(Arc::strong_count(&held), baseline + 2);
        drop(a);
        drop(b);
        assert_eq!(Arc::strong_count(&held), baseline);
        assert_eq!(device.name(), Some("Foohid Virtual U2F"));
    }

    #[test]
    fn test_numeric_identity_queries() {
        let device = u2f_device(quiet_host());
        assert_eq!(device.new_vendor_id_number().as_deref(), Some(&2));
        assert_eq!(device.new_product_id_number().as_deref(), Some(&3));
        assert_eq!(device.new_serial_number_string().as_deref(), Some("SN 123456"));
    }

    #[test]
    fn test_unset_identity_queries_return_none() {
        let device = VirtualHidDevice::initialize(DeviceRole::Generic, Arc::new(quiet_host()));
        assert!(device.new_product_string().is_none());
        assert!(device.new_serial_number_string().is_none());
        assert!(device.new_vendor_id_number().is_none());
        assert!(device.new_product_id_number().is_none());
    }

    #[test]
    fn test_properties_carry_role_hint() {
        let mut device = VirtualHidDevice::initialize(DeviceRole::Mouse, Arc::new(quiet_host()));
        device.set_descriptor(samples::MOUSE);

        let props = device.properties();

        assert_eq!(props.default_behavior, Some("Mouse"));
        assert_eq!(props.descriptor_len, samples::MOUSE.len());
        assert!(props.product.is_none());
    }

    // ── Start ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_start_attaches_with_exact_descriptor() {
        // Arrange
        let mut host = MockHidHost::new();
        host.expect_attach()
            .withf(|_, props, descriptor| {
                descriptor == samples::U2F
                    && props.product.as_deref() == Some("Foohid Virtual U2F")
                    && props.vendor_id == Some(2)
                    && props.default_behavior.is_none()
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        host.expect_detach().times(1).return_const(());
        let device = u2f_device(host);

        // Act
        let result = device.start();

        // Assert
        assert!(result.is_ok());
        assert!(device.is_attached());
    }

    #[test]
    fn test_start_without_descriptor_fails_and_never_attaches() {
        let mut host = MockHidHost::new();
        host.expect_attach().times(0);
        let device = VirtualHidDevice::initialize(DeviceRole::Generic, Arc::new(host));

        assert!(matches!(device.start(), Err(HidError::BadArgument(_))));
        assert!(!device.is_attached());
    }

    #[test]
    fn test_failed_attach_leaves_device_detached() {
        let mut host = MockHidHost::new();
        host.expect_attach()
            .returning(|_, _, _| Err(HidError::RegistrationFailure("refused".into())));
        host.expect_detach().times(0);
        let device = u2f_device(host);

        assert!(device.start().is_err());
        assert!(!device.is_attached());
    }

    // ── Host report forwarding ────────────────────────────────────────────────

    #[test]
    fn test_host_report_while_connected_relays_one_datagram() {
        // Arrange
        let mut host = MockHidHost::new();
        host.expect_base_set_report()
            .withf(|_, report, t| report.len() == 64 && *t == ReportType::Output)
            .times(1)
            .returning(|_, _, _| Ok(()));
        let namespace = LocalControlNamespace::new();
        let mut device = u2f_device(host);
        device
            .open_control_channel(namespace.clone(), "it.unbit.foohid.u2f")
            .unwrap();
        let mut peer = namespace.connect("it.unbit.foohid.u2f").unwrap();
        let mut report = vec![0u8; 64];
        report[0] = 0x05;

        // Act
        device.accept_host_report(&report, ReportType::Output).unwrap();

        // Assert
        assert_eq!(peer.try_recv(), Some(report));
        assert_eq!(peer.try_recv(), None);
    }

    #[test]
    fn test_host_report_while_disconnected_still_reaches_base_path() {
        // Arrange
        let mut host = MockHidHost::new();
        host.expect_base_set_report().times(1).returning(|_, _, _| Ok(()));
        let namespace = LocalControlNamespace::new();
        let mut device = u2f_device(host);
        device
            .open_control_channel(namespace.clone(), "it.unbit.foohid.u2f")
            .unwrap();

        // Act
        let result = device.accept_host_report(&[1, 2, 3], ReportType::Feature);

        // Assert
        assert!(result.is_ok());
        assert_eq!(device.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_host_report_without_channel_reaches_base_path() {
        let mut host = MockHidHost::new();
        host.expect_base_set_report().times(1).returning(|_, _, _| Ok(()));
        let device = u2f_device(host);

        assert!(device.set_report(&[7], ReportType::Output).is_ok());
    }

    // ── Inbound reports ───────────────────────────────────────────────────────

    #[test]
    fn test_empty_input_report_is_rejected() {
        let mut host = MockHidHost::new();
        host.expect_handle_report().times(0);
        let device = u2f_device(host);

        assert!(matches!(
            device.handle_input_report(&[]),
            Err(HidError::BadArgument(_))
        ));
    }

    #[test]
    fn test_peer_datagram_becomes_input_report() {
        // Arrange
        let mut host = MockHidHost::new();
        host.expect_handle_report()
            .withf(|_, report| report == [0xABu8, 0xCD])
            .times(1)
            .returning(|_, _| Ok(()));
        let namespace = LocalControlNamespace::new();
        let mut device = u2f_device(host);
        device
            .open_control_channel(namespace.clone(), "it.unbit.foohid.u2f")
            .unwrap();
        let peer = namespace.connect("it.unbit.foohid.u2f").unwrap();

        // Act
        let result = peer.send(&[0xAB, 0xCD]);

        // Assert
        assert!(result.is_ok());
    }

    #[test]
    fn test_empty_peer_datagram_is_rejected() {
        // Arrange
        let mut host = MockHidHost::new();
        host.expect_handle_report().times(0);
        let namespace = LocalControlNamespace::new();
        let mut device = u2f_device(host);
        device
            .open_control_channel(namespace.clone(), "it.unbit.foohid.u2f")
            .unwrap();
        let peer = namespace.connect("it.unbit.foohid.u2f").unwrap();

        // Act
        let result = peer.send(&[]);

        // Assert
        assert!(matches!(result, Err(HidError::BadArgument(_))));
    }

    // ── Control channel ───────────────────────────────────────────────────────

    #[test]
    fn test_second_control_channel_is_refused() {
        let namespace = LocalControlNamespace::new();
        let mut device = u2f_device(quiet_host());
        device.open_control_channel(namespace.clone(), "one").unwrap();

        let second = device.open_control_channel(namespace.clone(), "two");

        assert!(matches!(second, Err(HidError::AlreadyExists(_))));
        assert_eq!(namespace.channel_id("two"), None);
    }

    // ── Teardown ──────────────────────────────────────────────────────────────

    #[test]
    fn test_teardown_twice_detaches_once() {
        // Arrange
        let mut host = MockHidHost::new();
        host.expect_attach().returning(|_, _, _| Ok(()));
        host.expect_detach().times(1).return_const(());
        let namespace = LocalControlNamespace::new();
        let mut device = u2f_device(host);
        device.start().unwrap();
        device
            .open_control_channel(namespace.clone(), "it.unbit.foohid.u2f")
            .unwrap();

        // Act
        device.teardown();
        device.teardown();

        // Assert
        assert!(device.name().is_none());
        assert!(device.new_report_descriptor().is_err());
        assert_eq!(namespace.channel_id("it.unbit.foohid.u2f"), None);
    }

    #[test]
    fn test_teardown_after_partial_setup_is_safe() {
        let mut device = VirtualHidDevice::initialize(DeviceRole::Keyboard, Arc::new(MockHidHost::new()));
        device.set_name("half-built");
        device.teardown();
        assert!(device.name().is_none());
    }

    #[test]
    fn test_teardown_releases_identity_reference() {
        // Arrange
        let mut device = u2f_device(quiet_host());
        let held = device.new_serial_number_string().unwrap();
        let before = Arc::strong_count(&held);

        // Act
        device.teardown();

        // Assert
        assert_eq!(Arc::strong_count(&held), before - 1);
    }

    #[tokio::test]
    async fn test_stop_severs_connected_peer() {
        // Arrange
        let namespace = LocalControlNamespace::new();
        let mut device = u2f_device(quiet_host());
        device
            .open_control_channel(namespace.clone(), "it.unbit.foohid.u2f")
            .unwrap();
        let mut peer = namespace.connect("it.unbit.foohid.u2f").unwrap();

        // Act
        device.stop();

        // Assert
        assert_eq!(device.connection_state(), ConnectionState::Disconnected);
        assert_eq!(peer.recv().await, None);
    }
}
