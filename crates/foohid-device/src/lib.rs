//! foohid-device library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`,
//! benchmarks in `benches/`, and the binary entry point in `main.rs` share
//! the same module tree.
//!
//! # What does foohid-device do? (for beginners)
//!
//! This crate holds the *provider* side of foohid: the objects the operating
//! system's HID subsystem talks to when it believes a real mouse, keyboard,
//! or U2F token is plugged in.
//!
//! 1. The **Device Object** (`VirtualHidDevice`) answers descriptor and
//!    identity queries and accepts reports the host writes to the device.
//! 2. The **Control-Socket Endpoint** (`ControlEndpoint`) publishes a named
//!    control channel.  A user-space peer connects to it, receives every
//!    host report as one datagram, and can send datagrams back that become
//!    input reports.
//! 3. The **Device Factory** (`DeviceFactory`) creates, destroys, lists, and
//!    feeds devices by name in response to privileged service calls.
//!
//! The platform seams (HID subsystem, kernel control namespace) are traits
//! in `application`; `infrastructure` provides in-process implementations
//! used by the `foohid-service` binary and by the tests.

/// Application layer: device object, control endpoint, factory, and the
/// platform traits they depend on.
pub mod application;

/// Infrastructure layer: in-process platform implementations, the
/// demonstration peer, and configuration storage.
pub mod infrastructure;
