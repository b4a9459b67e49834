//! Integration tests for the device lifecycle.
//!
//! These tests drive `DeviceFactory` through its public API against the
//! in-process control namespace and HID subsystem, playing the user-space
//! peer with `PeerSocket`.  They cover:
//!
//! - The U2F scenario end to end: create, connect, relay a 64-byte host
//!   report, disconnect, and confirm nothing more is relayed.
//! - Several devices live at once, each connection reaching its own device.
//! - Teardown while a peer is connected, including a peer racing the teardown.
//!
//! ```text
//! DeviceFactory::create ──► VirtualHidDevice ──► ControlEndpoint
//!                                 │                    │
//!                          InMemoryHidHost      LocalControlNamespace ◄── PeerSocket
//! ```

use std::sync::{Arc, Barrier};
use std::thread;

use foohid_core::domain::descriptor::samples;
use foohid_core::{ConnectionState, CreateDeviceRequest, DeviceRole, HidError, ReportType};
use foohid_device::application::hid_host::HidDeviceProvider;
use foohid_device::application::manage_devices::DeviceFactory;
use foohid_device::infrastructure::control_namespace::LocalControlNamespace;
use foohid_device::infrastructure::hid_host::InMemoryHidHost;

const U2F_CHANNEL: &str = "it.unbit.foohid.u2f";

fn u2f_request() -> CreateDeviceRequest {
    CreateDeviceRequest {
        name: "Foohid Virtual U2F".to_string(),
        descriptor: samples::U2F.to_vec(),
        serial_number: "SN 123456".to_string(),
        vendor_id: 2,
        product_id: 3,
        channel_name: U2F_CHANNEL.to_string(),
        role: DeviceRole::Generic,
    }
}

fn setup() -> (DeviceFactory, Arc<InMemoryHidHost>, Arc<LocalControlNamespace>) {
    let host = Arc::new(InMemoryHidHost::new());
    let namespace = LocalControlNamespace::new();
    let factory = DeviceFactory::new(host.clone(), namespace.clone());
    (factory, host, namespace)
}

fn u2f_frame(first: u8) -> Vec<u8> {
    let mut frame = vec![0u8; 64];
    frame[0] = first;
    frame
}

// ── Scenario ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_u2f_scenario_relays_exactly_while_connected() {
    // Arrange
    let (factory, host, namespace) = setup();
    let device = factory.create(u2f_request()).unwrap();
    let attached = host.attached_device(device.id()).unwrap();
    assert_eq!(attached.descriptor, samples::U2F);
    assert_eq!(attached.properties.serial_number.as_deref(), Some("SN 123456"));

    // Act: peer connects and the host writes one frame.
    let mut peer = namespace.connect(U2F_CHANNEL).unwrap();
    assert_eq!(device.connection_state(), ConnectionState::Connected(peer.unit()));
    let frame = u2f_frame(0x05);
    device.accept_host_report(&frame, ReportType::Output).unwrap();

    // Assert: exactly one datagram, byte-identical.
    assert_eq!(peer.recv().await, Some(frame.clone()));
    assert_eq!(peer.try_recv(), None);

    // Act: peer goes away and the host writes again.
    drop(peer);
    device.accept_host_report(&u2f_frame(0x06), ReportType::Output).unwrap();

    // Assert
    assert_eq!(device.connection_state(), ConnectionState::Disconnected);
    assert_eq!(
        host.host_reports(device.id()),
        vec![(ReportType::Output, frame), (ReportType::Output, u2f_frame(0x06))]
    );
}

#[tokio::test]
async fn test_reconnect_after_disconnect_receives_new_reports_only() {
    // Arrange
    let (factory, _host, namespace) = setup();
    let device = factory.create(u2f_request()).unwrap();
    drop(namespace.connect(U2F_CHANNEL).unwrap());
    device.accept_host_report(&u2f_frame(0x01), ReportType::Output).unwrap();

    // Act
    let mut peer = namespace.connect(U2F_CHANNEL).unwrap();
    device.accept_host_report(&u2f_frame(0x02), ReportType::Output).unwrap();

    // Assert
    assert_eq!(peer.recv().await, Some(u2f_frame(0x02)));
    assert_eq!(peer.try_recv(), None);
}

#[test]
fn test_second_peer_is_refused_while_first_is_connected() {
    let (factory, _host, namespace) = setup();
    let device = factory.create(u2f_request()).unwrap();
    let first = namespace.connect(U2F_CHANNEL).unwrap();

    let second = namespace.connect(U2F_CHANNEL);

    assert!(matches!(second, Err(HidError::ChannelBusy(_))));
    assert_eq!(device.connection_state(), ConnectionState::Connected(first.unit()));
}

#[test]
fn test_peer_datagram_becomes_input_report() {
    // Arrange
    let (factory, host, namespace) = setup();
    let device = factory.create(u2f_request()).unwrap();
    let peer = namespace.connect(U2F_CHANNEL).unwrap();

    // Act
    peer.send(&[0x83, 0x00, 0x01]).unwrap();

    // Assert
    assert_eq!(host.input_reports(device.id()), vec![vec![0x83, 0x00, 0x01]]);
}

#[test]
fn test_empty_peer_datagram_is_refused_and_not_forwarded() {
    // Arrange
    let (factory, host, namespace) = setup();
    let device = factory.create(u2f_request()).unwrap();
    let peer = namespace.connect(U2F_CHANNEL).unwrap();

    // Act
    let result = peer.send(&[]);

    // Assert: same answer as the factory's own send path.
    assert!(matches!(result, Err(HidError::BadArgument(_))));
    assert!(matches!(
        factory.send("Foohid Virtual U2F", &[]),
        Err(HidError::BadArgument(_))
    ));
    assert!(host.input_reports(device.id()).is_empty());
}

// ── Multiple devices ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_each_channel_reaches_its_own_device() {
    // Arrange
    let (factory, _host, namespace) = setup();
    let mut devices = Vec::new();
    for i in 0..3u8 {
        let mut request = u2f_request();
        request.name = format!("device-{i}");
        request.channel_name = format!("it.unbit.foohid.dev{i}");
        devices.push(factory.create(request).unwrap());
    }
    let mut peers: Vec<_> = (0..3)
        .map(|i| namespace.connect(&format!("it.unbit.foohid.dev{i}")).unwrap())
        .collect();

    // Act: only the middle device sees a host report.
    devices[1].accept_host_report(&[0xB1], ReportType::Output).unwrap();

    // Assert
    assert!(devices.iter().all(|d| d.connection_state().is_connected()));
    assert_eq!(peers[1].recv().await, Some(vec![0xB1]));
    assert_eq!(peers[0].try_recv(), None);
    assert_eq!(peers[2].try_recv(), None);
}

#[test]
fn test_disconnecting_one_device_leaves_others_connected() {
    let (factory, _host, namespace) = setup();
    let mut other = u2f_request();
    other.name = "other".to_string();
    other.channel_name = "it.unbit.foohid.other".to_string();
    let a = factory.create(u2f_request()).unwrap();
    let b = factory.create(other).unwrap();
    let peer_a = namespace.connect(U2F_CHANNEL).unwrap();
    let _peer_b = namespace.connect("it.unbit.foohid.other").unwrap();

    drop(peer_a);

    assert_eq!(a.connection_state(), ConnectionState::Disconnected);
    assert!(b.connection_state().is_connected());
}

// ── Teardown ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_destroy_with_connected_peer_ends_its_stream() {
    // Arrange
    let (factory, host, namespace) = setup();
    let device = factory.create(u2f_request()).unwrap();
    let mut peer = namespace.connect(U2F_CHANNEL).unwrap();

    // Act
    factory.destroy("Foohid Virtual U2F").unwrap();

    // Assert
    assert_eq!(peer.recv().await, None);
    assert_eq!(device.connection_state(), ConnectionState::Disconnected);
    assert!(!host.is_attached(device.id()));
    assert_eq!(namespace.channel_id(U2F_CHANNEL), None);
}

#[test]
fn test_host_report_after_destroy_is_not_relayed() {
    let (factory, _host, namespace) = setup();
    let device = factory.create(u2f_request()).unwrap();
    let mut peer = namespace.connect(U2F_CHANNEL).unwrap();
    factory.destroy("Foohid Virtual U2F").unwrap();

    device.accept_host_report(&[1, 2, 3], ReportType::Output).unwrap();

    assert_eq!(peer.try_recv(), None);
}

#[test]
fn test_queries_survive_until_last_reference_drops() {
    // Arrange
    let (factory, _host, _namespace) = setup();
    let device = factory.create(u2f_request()).unwrap();

    // Act
    factory.destroy("Foohid Virtual U2F").unwrap();

    // Assert: a caller still holding the device can query it safely.
    assert_eq!(device.new_report_descriptor().unwrap(), samples::U2F);
    assert_eq!(device.new_product_string().as_deref(), Some("Foohid Virtual U2F"));
}

#[test]
fn test_connect_racing_destroy_never_leaves_device_connected() {
    for _ in 0..200 {
        // Arrange
        let (factory, _host, namespace) = setup();
        let device = factory.create(u2f_request()).unwrap();
        let barrier = Barrier::new(2);

        // Act: one thread connects while another destroys the device.
        let peer = thread::scope(|s| {
            let connecting = s.spawn(|| {
                barrier.wait();
                namespace.connect(U2F_CHANNEL)
            });
            s.spawn(|| {
                barrier.wait();
                factory.destroy("Foohid Virtual U2F").unwrap();
            });
            connecting.join().unwrap()
        });

        // Assert: whichever order the callbacks ran in, the channel is gone
        // and no peer is recorded as connected.
        assert_eq!(device.connection_state(), ConnectionState::Disconnected);
        assert_eq!(namespace.channel_id(U2F_CHANNEL), None);
        if let Ok(mut peer) = peer {
            assert!(matches!(peer.send(&[1]), Err(HidError::NotConnected(_))));
            assert_eq!(peer.try_recv(), None);
        }
    }
}
