//! In-process kernel control namespace.
//!
//! `LocalControlNamespace` keeps one table keyed by the `ChannelId` it assigns
//! at registration.  Each entry holds the registration's own
//! [`ControlHandler`], so a connect on channel 3 always reaches the device
//! that registered channel 3, however many devices are live.
//!
//! Peers connect by name and receive a [`PeerSocket`].  Datagrams the device
//! enqueues arrive on the socket's unbounded Tokio channel, one `Vec<u8>` per
//! datagram.  Dropping the socket disconnects; deregistering the channel
//! disconnects every peer and their reads return `None` (end-of-stream).
//!
//! The table lock is never held while a handler callback runs.

use std::collections::HashMap;
use std::sync::Arc;

use foohid_core::{ChannelId, ChannelName, HidError, PeerUnit};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::application::control::{ControlHandler, ControlNamespace};

struct Registration {
    name: ChannelName,
    handler: Arc<dyn ControlHandler>,
    next_unit: u32,
    peers: HashMap<PeerUnit, mpsc::UnboundedSender<Vec<u8>>>,
}

#[derive(Default)]
struct Table {
    next_id: u32,
    channels: HashMap<ChannelId, Registration>,
}

impl Table {
    fn find(&self, name: &str) -> Option<ChannelId> {
        self.channels
            .iter()
            .find(|(_, reg)| reg.name.as_str() == name)
            .map(|(id, _)| *id)
    }
}

/// Control namespace living in the current process.
#[derive(Default)]
pub struct LocalControlNamespace {
    table: Mutex<Table>,
}

impl LocalControlNamespace {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Identifier currently assigned to the channel `name`.
    pub fn channel_id(&self, name: &str) -> Option<ChannelId> {
        self.table.lock().find(name)
    }

    /// Number of peers connected to channel `id`.
    pub fn peer_count(&self, id: ChannelId) -> usize {
        self.table
            .lock()
            .channels
            .get(&id)
            .map_or(0, |reg| reg.peers.len())
    }

    /// Opens the channel `name` as a user-space peer.
    ///
    /// # Errors
    ///
    /// - [`HidError::NotFound`] if no channel has that name.
    /// - [`HidError::ChannelBusy`] if the channel has run out of unit numbers.
    /// - Whatever the channel's connect callback returns (e.g.
    ///   [`HidError::ChannelBusy`]); the peer is then never considered
    ///   connected.
    pub fn connect(self: &Arc<Self>, name: &str) -> Result<PeerSocket, HidError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let (channel, unit, handler) = {
            let mut table = self.table.lock();
            let id = table
                .find(name)
                .ok_or_else(|| HidError::NotFound(name.to_string()))?;
            let reg = table
                .channels
                .get_mut(&id)
                .ok_or_else(|| HidError::NotFound(name.to_string()))?;
            reg.next_unit = reg
                .next_unit
                .checked_add(1)
                .ok_or_else(|| HidError::ChannelBusy(name.to_string()))?;
            let unit = PeerUnit(reg.next_unit);
            reg.peers.insert(unit, tx);
            (id, unit, Arc::clone(&reg.handler))
        };

        if let Err(e) = handler.on_connect(unit) {
            if let Some(reg) = self.table.lock().channels.get_mut(&channel) {
                reg.peers.remove(&unit);
            }
            debug!(channel = %channel, %unit, "connection refused: {e}");
            return Err(e);
        }

        debug!(channel = %channel, %unit, "peer socket opened");
        Ok(PeerSocket {
            namespace: Arc::clone(self),
            channel,
            unit,
            rx,
        })
    }

    /// Resolves the handler for a peer that is still connected.
    fn handler_for(&self, channel: ChannelId, unit: PeerUnit) -> Result<Arc<dyn ControlHandler>, HidError> {
        let table = self.table.lock();
        table
            .channels
            .get(&channel)
            .filter(|reg| reg.peers.contains_key(&unit))
            .map(|reg| Arc::clone(&reg.handler))
            .ok_or(HidError::NotConnected(unit.0))
    }

    fn disconnect(&self, channel: ChannelId, unit: PeerUnit) {
        let handler = {
            let mut table = self.table.lock();
            let Some(reg) = table.channels.get_mut(&channel) else {
                return;
            };
            if reg.peers.remove(&unit).is_none() {
                return;
            }
            Arc::clone(&reg.handler)
        };
        handler.on_disconnect(unit);
        debug!(channel = %channel, %unit, "peer socket closed");
    }
}

impl ControlNamespace for LocalControlNamespace {
    fn register(
        &self,
        name: &ChannelName,
        handler: Arc<dyn ControlHandler>,
    ) -> Result<ChannelId, HidError> {
        let mut table = self.table.lock();
        if table.find(name.as_str()).is_some() {
            return Err(HidError::RegistrationFailure(format!(
                "channel name {name} is already registered"
            )));
        }
        table.next_id = table
            .next_id
            .checked_add(1)
            .ok_or_else(|| HidError::RegistrationFailure("channel identifiers exhausted".to_string()))?;
        let id = ChannelId(table.next_id);
        table.channels.insert(
            id,
            Registration {
                name: name.clone(),
                handler,
                next_unit: 0,
                peers: HashMap::new(),
            },
        );
        info!(channel = %name, %id, "channel published");
        Ok(id)
    }

    fn enqueue(&self, id: ChannelId, unit: PeerUnit, datagram: &[u8]) -> Result<(), HidError> {
        let table = self.table.lock();
        let sender = table
            .channels
            .get(&id)
            .and_then(|reg| reg.peers.get(&unit))
            .ok_or(HidError::NotConnected(unit.0))?;
        sender
            .send(datagram.to_vec())
            .map_err(|_| HidError::NotConnected(unit.0))
    }

    fn deregister(&self, id: ChannelId) -> Result<(), HidError> {
        let reg = self
            .table
            .lock()
            .channels
            .remove(&id)
            .ok_or_else(|| HidError::NotFound(format!("channel {id}")))?;

        for unit in reg.peers.keys() {
            reg.handler.on_disconnect(*unit);
        }
        info!(channel = %reg.name, %id, peers = reg.peers.len(), "channel withdrawn");
        Ok(())
    }
}

/// User-space end of a control channel connection.
pub struct PeerSocket {
    namespace: Arc<LocalControlNamespace>,
    channel: ChannelId,
    unit: PeerUnit,
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl PeerSocket {
    pub fn unit(&self) -> PeerUnit {
        self.unit
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    /// Waits for the next datagram.  Returns `None` once the channel is gone.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.rx.recv().await
    }

    /// Returns a datagram if one is already queued.
    pub fn try_recv(&mut self) -> Option<Vec<u8>> {
        self.rx.try_recv().ok()
    }

    /// Sends one datagram to the device.
    pub fn send(&self, datagram: &[u8]) -> Result<(), HidError> {
        self.namespace
            .handler_for(self.channel, self.unit)?
            .on_send(self.unit, datagram)
    }

    pub fn get_option(&self, opt: i32) -> Result<Vec<u8>, HidError> {
        self.namespace
            .handler_for(self.channel, self.unit)?
            .on_getopt(self.unit, opt)
    }

    pub fn set_option(&self, opt: i32, value: &[u8]) -> Result<(), HidError> {
        self.namespace
            .handler_for(self.channel, self.unit)?
            .on_setopt(self.unit, opt, value)
    }
}

impl Drop for PeerSocket {
    fn drop(&mut self) {
        self.namespace.disconnect(self.channel, self.unit);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
