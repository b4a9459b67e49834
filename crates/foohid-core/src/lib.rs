//! # foohid-core
//!
//! Shared library for the foohid virtual HID provider containing the domain
//! values a virtual device is made of, the error taxonomy every layer reports
//! through, and the service-call protocol a privileged user-space process
//! uses to create, destroy, and feed devices.
//!
//! This crate has zero dependencies on OS APIs, async runtimes, or sockets.
//!
//! # Architecture overview (for beginners)
//!
//! foohid exposes a *virtual* Human Interface Device (a mouse, a keyboard, or
//! a generic device such as a U2F token) to the operating system's input
//! stack.  The OS believes a real device is plugged in; in reality every
//! report it sends to the device is relayed to a user-space program over a
//! private control channel, and that program can inject input reports back.
//!
//! This crate (`foohid-core`) is the shared foundation.  It defines:
//!
//! - **`domain`** – The values a device is built from: the opaque HID report
//!   descriptor, the identity strings and numbers, the role hint, the control
//!   channel name, and the connection state machine.
//!
//! - **`protocol`** – How a user-space process talks to the device factory:
//!   `Create`, `Destroy`, `Send`, and `List` service calls, encoded as a
//!   selector byte followed by a compact binary body.
//!
//! - **`error`** – [`HidError`], the taxonomy every operation returns.

pub mod domain;
pub mod error;
pub mod protocol;

pub use domain::channel::{ChannelId, ChannelName, MAX_CHANNEL_NAME_LEN};
pub use domain::connection::{ConnectionState, PeerUnit};
pub use domain::descriptor::ReportDescriptor;
pub use domain::identity::{DeviceIdentity, SharedNumber, SharedString};
pub use domain::report::ReportType;
pub use domain::role::DeviceRole;
pub use domain::DeviceId;
pub use error::HidError;
pub use protocol::codec::{decode_call, encode_call, ProtocolError};
pub use protocol::messages::{CreateDeviceRequest, ServiceCall, ServiceReply, ServiceSelector};
