//! ControlEndpoint: one registered control channel and its connected peer.
//!
//! The endpoint bridges a named channel in the kernel control namespace to
//! its owning device:
//!
//! - host reports the device wants relayed go out through [`ControlEndpoint::enqueue`]
//!   as exactly one datagram to the connected peer;
//! - datagrams the peer sends come in through the registration's `on_send`
//!   callback and are handed to the device's inbound path.
//!
//! # Concurrency
//!
//! The connection state is the only field written from several callback
//! contexts at once (connect, disconnect, enqueue, deregister).  It lives
//! behind a `parking_lot::Mutex` and every check-then-act on it (is a peer
//! connected? then deliver to that unit) happens under one guard, so a
//! report can never be enqueued to a unit whose disconnect has already been
//! observed.
//!
//! Lock order is *connection state → registration*.  `deregister` takes the
//! registration slot and releases it before the namespace runs the
//! disconnect callbacks, which take the connection state.
//!
//! A peer the namespace admitted just before the channel was withdrawn can
//! still see its connect callback run afterwards.  `deregister` marks the
//! link closed under the state lock before it reaches the namespace, and a
//! closed link refuses every later connect.

use std::sync::Arc;

use foohid_core::{ChannelId, ChannelName, ConnectionState, HidError, PeerUnit};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::application::control::{ControlHandler, ControlNamespace, InboundSink};

/// Connection state plus whether the channel has been withdrawn.
#[derive(Debug, Default)]
struct Link {
    connection: ConnectionState,
    closed: bool,
}

/// The callback set registered for one channel.
///
/// This is the per-registration owner context: the namespace holds it and
/// every callback for the channel lands here.
struct EndpointBinding {
    name: ChannelName,
    link: Mutex<Link>,
    inbound: Arc<dyn InboundSink>,
}

impl ControlHandler for EndpointBinding {
    fn on_connect(&self, unit: PeerUnit) -> Result<(), HidError> {
        let mut link = self.link.lock();
        if link.closed {
            debug!(channel = %self.name, %unit, "connect after deregistration refused");
            return Err(HidError::NotFound(self.name.to_string()));
        }
        let state = &mut link.connection;
        if let Some(current) = state.peer() {
            warn!(
                channel = %self.name,
                %unit,
                %current,
                "refusing second peer; only one connection per channel is supported"
            );
            return Err(HidError::ChannelBusy(self.name.to_string()));
        }
        state.connect(unit);
        info!(channel = %self.name, %unit, "peer connected");
        Ok(())
    }

    fn on_disconnect(&self, unit: PeerUnit) {
        let mut link = self.link.lock();
        let state = &mut link.connection;
        if state.peer() == Some(unit) {
            state.disconnect();
            info!(channel = %self.name, %unit, "peer disconnected");
        } else {
            debug!(channel = %self.name, %unit, "disconnect for inactive unit ignored");
        }
    }

    fn on_send(&self, unit: PeerUnit, datagram: &[u8]) -> Result<(), HidError> {
        debug!(channel = %self.name, %unit, len = datagram.len(), "datagram from peer");
        self.inbound.deliver(datagram)
    }
}

/// A control channel registered on behalf of one device.
pub struct ControlEndpoint {
    namespace: Arc<dyn ControlNamespace>,
    binding: Arc<EndpointBinding>,
    registration: Mutex<Option<ChannelId>>,
}

impl ControlEndpoint {
    /// Validates `name`, then registers it with `namespace`.
    ///
    /// # Errors
    ///
    /// - [`HidError::BadArgument`] if `name` does not fit the platform limit;
    ///   nothing is registered.
    /// - Whatever the namespace reports, typically
    ///   [`HidError::RegistrationFailure`].
    pub fn register(
        namespace: Arc<dyn ControlNamespace>,
        name: &str,
        inbound: Arc<dyn InboundSink>,
    ) -> Result<Self, HidError> {
        let name = ChannelName::new(name)?;
        let binding = Arc::new(EndpointBinding {
            name: name.clone(),
            link: Mutex::new(Link::default()),
            inbound,
        });

        let id = namespace
            .register(&name, Arc::clone(&binding) as Arc<dyn ControlHandler>)
            .map_err(|e| {
                warn!(channel = %name, "failed to register control channel: {e}");
                e
            })?;
        info!(channel = %name, id = %id, "control channel registered");

        Ok(Self {
            namespace,
            binding,
            registration: Mutex::new(Some(id)),
        })
    }

    pub fn name(&self) -> &ChannelName {
        &self.binding.name
    }

    /// The namespace-assigned identifier, or `None` once deregistered.
    pub fn channel_id(&self) -> Option<ChannelId> {
        *self.registration.lock()
    }

    pub fn is_registered(&self) -> bool {
        self.registration.lock().is_some()
    }

    pub fn state(&self) -> ConnectionState {
        self.binding.link.lock().connection
    }

    /// Delivers `datagram` to the connected peer.
    ///
    /// Returns `Ok(true)` if a datagram was enqueued and `Ok(false)` if there
    /// was no peer to deliver to (disconnected or already deregistered).
    ///
    /// # Errors
    ///
    /// Propagates the namespace's delivery failure.
    pub fn enqueue(&self, datagram: &[u8]) -> Result<bool, HidError> {
        let link = self.binding.link.lock();
        let Some(unit) = link.connection.peer() else {
            debug!(channel = %self.binding.name, "no peer connected; datagram dropped");
            return Ok(false);
        };
        let Some(id) = *self.registration.lock() else {
            debug!(channel = %self.binding.name, "channel deregistered; datagram dropped");
            return Ok(false);
        };
        self.namespace.enqueue(id, unit, datagram)?;
        Ok(true)
    }

    /// Removes the channel from the namespace.  Safe to call more than once;
    /// only the first call reaches the namespace.
    ///
    /// The connection state is `Disconnected` afterwards even if the namespace
    /// reported an error, and no later connect is accepted.
    pub fn deregister(&self) -> Result<(), HidError> {
        let taken = {
            let mut link = self.binding.link.lock();
            link.closed = true;
            self.registration.lock().take()
        };
        let Some(id) = taken else {
            return Ok(());
        };

        let result = self.namespace.deregister(id);
        if let Some(unit) = self.binding.link.lock().connection.disconnect() {
            debug!(channel = %self.binding.name, %unit, "peer severed by deregistration");
        }
        match &result {
            Ok(()) => info!(channel = %self.binding.name, id = %id, "control channel deregistered"),
            Err(e) => warn!(channel = %self.binding.name, id = %id, "deregistration failed: {e}"),
        }
        result
    }
}

impl Drop for ControlEndpoint {
    fn drop(&mut self) {
        let _ = self.deregister();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
