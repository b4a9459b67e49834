//! Infrastructure layer for the virtual HID provider.
//!
//! Contains the adapters that stand in for the operating system: the kernel
//! control namespace, the HID subsystem, the demonstration peer, and TOML
//! configuration storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `foohid_core`, but MUST NOT be imported by the `application` layer outside
//! of tests.
//!
//! # Sub-modules
//!
//! - **`control_namespace`** – `LocalControlNamespace`, an in-process control
//!   namespace.  Channels are keyed by their assigned `ChannelId`; peers get a
//!   `PeerSocket` whose datagrams arrive on a Tokio channel.
//!
//! - **`hid_host`** – `InMemoryHidHost`, which records attachments, host
//!   reports, and injected input reports per device.
//!
//! - **`peer`** – The demonstration peer: reads datagrams from a `PeerSocket`
//!   and prints them as hex, one line per datagram.
//!
//! - **`storage`** – Configuration file persistence.

pub mod control_namespace;
pub mod hid_host;
pub mod peer;
pub mod storage;
