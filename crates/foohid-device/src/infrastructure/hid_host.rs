//! In-memory HID subsystem.
//!
//! Records what a real input stack would act on: which devices are attached
//! (with the properties and descriptor they published), every report the host
//! wrote through the base path, and every input report a device produced.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use foohid_core::{DeviceId, HidError, ReportType};
use parking_lot::Mutex;
use tracing::debug;

use crate::application::hid_host::{DeviceProperties, HidHost};

/// What a device published when it attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedDevice {
    pub properties: DeviceProperties,
    pub descriptor: Vec<u8>,
}

#[derive(Default)]
pub struct InMemoryHidHost {
    attached: Mutex<HashMap<DeviceId, AttachedDevice>>,
    host_reports: Mutex<Vec<(DeviceId, ReportType, Vec<u8>)>>,
    input_reports: Mutex<Vec<(DeviceId, Vec<u8>)>>,
    fail_attach: AtomicBool,
}

impl InMemoryHidHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later `attach` fail with `RegistrationFailure`.
    pub fn set_fail_attach(&self, fail: bool) {
        self.fail_attach.store(fail, Ordering::SeqCst);
    }

    pub fn is_attached(&self, device: DeviceId) -> bool {
        self.attached.lock().contains_key(&device)
    }

    pub fn attached_count(&self) -> usize {
        self.attached.lock().len()
    }

    pub fn attached_device(&self, device: DeviceId) -> Option<AttachedDevice> {
        self.attached.lock().get(&device).cloned()
    }

    /// Reports the host wrote to `device`, in order.
    pub fn host_reports(&self, device: DeviceId) -> Vec<(ReportType, Vec<u8>)> {
        self.host_reports
            .lock()
            .iter()
            .filter(|(id, _, _)| *id == device)
            .map(|(_, t, r)| (*t, r.clone()))
            .collect()
    }

    /// Input reports `device` produced, in order.
    pub fn input_reports(&self, device: DeviceId) -> Vec<Vec<u8>> {
        self.input_reports
            .lock()
            .iter()
            .filter(|(id, _)| *id == device)
            .map(|(_, r)| r.clone())
            .collect()
    }
}

impl HidHost for InMemoryHidHost {
    fn attach(
        &self,
        device: DeviceId,
        properties: &DeviceProperties,
        descriptor: &[u8],
    ) -> Result<(), HidError> {
        if self.fail_attach.load(Ordering::SeqCst) {
            return Err(HidError::RegistrationFailure(format!(
                "HID subsystem refused device {device}"
            )));
        }
        let mut attached = self.attached.lock();
        if attached.contains_key(&device) {
            return Err(HidError::AlreadyExists(device.to_string()));
        }
        attached.insert(
            device,
            AttachedDevice {
                properties: properties.clone(),
                descriptor: descriptor.to_vec(),
            },
        );
        debug!(%device, "attached");
        Ok(())
    }

    fn detach(&self, device: DeviceId) {
        if self.attached.lock().remove(&device).is_some() {
            debug!(%device, "detached");
        }
    }

    fn base_set_report(
        &self,
        device: DeviceId,
        report: &[u8],
        report_type: ReportType,
    ) -> Result<(), HidError> {
        self.host_reports
            .lock()
            .push((device, report_type, report.to_vec()));
        Ok(())
    }

    fn handle_report(&self, device: DeviceId, report: &[u8]) -> Result<(), HidError> {
        if !self.is_attached(device) {
            return Err(HidError::NotFound(device.to_string()));
        }
        self.input_reports.lock().push((device, report.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_records_properties_and_descriptor() {
        // Arrange
        let host = InMemoryHidHost::new();
        let id = DeviceId::new();
        let props = DeviceProperties {
            product: Some("pad".into()),
            descriptor_len: 2,
            ..Default::default()
        };

        // Act
        host.attach(id, &props, &[0x05, 0x01]).unwrap();

        // Assert
        let recorded = host.attached_device(id).unwrap();
        assert_eq!(recorded.properties, props);
        assert_eq!(recorded.descriptor, vec![0x05, 0x01]);
    }

    #[test]
    fn test_attach_twice_is_already_exists() {
        let host = InMemoryHidHost::new();
        let id = DeviceId::new();
        host.attach(id, &DeviceProperties::default(), &[1]).unwrap();

        assert!(matches!(
            host.attach(id, &DeviceProperties::default(), &[1]),
            Err(HidError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_fail_attach_switch() {
        let host = InMemoryHidHost::new();
        host.set_fail_attach(true);

        let result = host.attach(DeviceId::new(), &DeviceProperties::default(), &[1]);

        assert!(matches!(result, Err(HidError::RegistrationFailure(_))));
        assert_eq!(host.attached_count(), 0);
    }

    #[test]
    fn test_input_report_for_detached_device_is_not_found() {
        let host = InMemoryHidHost::new();
        let id = DeviceId::new();
        host.attach(id, &DeviceProperties::default(), &[1]).unwrap();
        host.detach(id);

        assert!(matches!(host.handle_report(id, &[1]), Err(HidError::NotFound(_))));
        assert!(host.input_reports(id).is_empty());
    }

    #[test]
    fn test_host_reports_are_kept_per_device_in_order() {
        let host = InMemoryHidHost::new();
        let a = DeviceId::new();
        let b = DeviceId::new();

        host.base_set_report(a, &[1], ReportType::Output).unwrap();
        host.base_set_report(b, &[2], ReportType::Feature).unwrap();
        host.base_set_report(a, &[3], ReportType::Output).unwrap();

        assert_eq!(
            host.host_reports(a),
            vec![(ReportType::Output, vec![1]), (ReportType::Output, vec![3])]
        );
        assert_eq!(host.host_reports(b), vec![(ReportType::Feature, vec![2])]);
    }
}
