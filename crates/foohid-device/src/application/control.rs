//! Kernel control namespace seam.
//!
//! A control channel is a named, connection-oriented datagram channel
//! published by a privileged component.  Registering a channel installs a
//! callback set ([`ControlHandler`]); the platform then invokes those
//! callbacks when peers connect, disconnect, send datagrams, or get/set
//! socket options.
//!
//! # Binding callbacks to their owner
//!
//! The handler passed to [`ControlNamespace::register`] is the per-registration
//! owner context.  Every callback for a channel resolves to the handler that
//! registered it, so any number of devices can publish channels at once
//! without a process-wide "current device" variable.
//!
//! Callbacks may arrive on any thread and concurrently with each other and
//! with teardown.  Implementations must not block.

use std::sync::Arc;

use foohid_core::{ChannelId, ChannelName, HidError, PeerUnit};

/// Callback set installed with a channel registration.
pub trait ControlHandler: Send + Sync {
    /// A peer opened the channel.
    ///
    /// Returning an error refuses the connection; the platform then never
    /// reports a disconnect for `unit`.
    fn on_connect(&self, unit: PeerUnit) -> Result<(), HidError>;

    /// A peer closed the channel, or the channel is being deregistered.
    fn on_disconnect(&self, unit: PeerUnit);

    /// A peer sent one datagram.
    fn on_send(&self, unit: PeerUnit, datagram: &[u8]) -> Result<(), HidError>;

    /// No options are defined; always succeeds with an empty value.
    fn on_getopt(&self, _unit: PeerUnit, _opt: i32) -> Result<Vec<u8>, HidError> {
        Ok(Vec::new())
    }

    /// No options are defined; always succeeds.
    fn on_setopt(&self, _unit: PeerUnit, _opt: i32, _data: &[u8]) -> Result<(), HidError> {
        Ok(())
    }
}

/// The kernel control namespace.
pub trait ControlNamespace: Send + Sync {
    /// Publishes `name` and installs `handler` as its callback set.
    ///
    /// # Errors
    ///
    /// Returns [`HidError::RegistrationFailure`] if the namespace refuses the
    /// registration (name collision, exhaustion).
    fn register(
        &self,
        name: &ChannelName,
        handler: Arc<dyn ControlHandler>,
    ) -> Result<ChannelId, HidError>;

    /// Delivers `datagram` to peer `unit` of channel `id` as exactly one datagram.
    fn enqueue(&self, id: ChannelId, unit: PeerUnit, datagram: &[u8]) -> Result<(), HidError>;

    /// Removes the channel.  Every connected peer is disconnected and its
    /// `on_disconnect` callback fires before this returns.
    fn deregister(&self, id: ChannelId) -> Result<(), HidError>;
}

/// Destination for datagrams a peer sends to the device.
pub trait InboundSink: Send + Sync {
    fn deliver(&self, datagram: &[u8]) -> Result<(), HidError>;
}
