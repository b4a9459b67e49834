//! Connection state machine for a control channel.
//!
//! ```text
//!                 connect(unit)
//! Disconnected ─────────────────► Connected(unit)
//!      ▲                                │
//!      └──── disconnect / deregister ───┘
//! ```
//!
//! There is no terminal state while the device lives.  A disconnect while
//! already disconnected is a no-op.

use std::fmt;

/// The platform's identifier for one connected peer of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerUnit(pub u32);

impl fmt::Display for PeerUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a peer is attached to the channel, and which one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected(PeerUnit),
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected(_))
    }

    /// The connected peer, if any.
    pub fn peer(&self) -> Option<PeerUnit> {
        match self {
            ConnectionState::Connected(unit) => Some(*unit),
            ConnectionState::Disconnected => None,
        }
    }

    /// Applies a connect event.  Returns the previous peer if one was replaced.
    pub fn connect(&mut self, unit: PeerUnit) -> Option<PeerUnit> {
        let previous = self.peer();
        *self = ConnectionState::Connected(unit);
        previous
    }

    /// Applies a disconnect event.  Returns the peer that was detached, if any.
    pub fn disconnect(&mut self) -> Option<PeerUnit> {
        let previous = self.peer();
        *self = ConnectionState::Disconnected;
        previous
    }
}
