//! Application layer for the virtual HID provider.
//!
//! # What is the "application" layer? (for beginners)
//!
//! The application layer sits between the pure domain values in
//! `foohid-core` and the platform adapters in `infrastructure`.  Code here:
//!
//! - **Orchestrates** domain values into live objects (a device that owns a
//!   descriptor, an identity, and a control channel).
//! - **Depends on abstractions** (`HidHost`, `ControlNamespace`) rather than
//!   on a concrete kernel, so every rule can be tested in-process.
//!
//! # Sub-modules
//!
//! - **`hid_host`** – The capability set the HID subsystem calls into
//!   (`HidDeviceProvider`) and the subsystem as seen from a device (`HidHost`).
//! - **`control`** – The kernel control namespace seam and the callback set a
//!   channel registration installs.
//! - **`endpoint`** – `ControlEndpoint`: one registered channel, its
//!   connection state, and report delivery to the connected peer.
//! - **`device`** – `VirtualHidDevice`: the Device Object.
//! - **`manage_devices`** – `DeviceFactory`: creation/destruction by name.

pub mod control;
pub mod device;
pub mod endpoint;
pub mod hid_host;
pub mod manage_devices;
