//! Error taxonomy shared by every foohid layer.
//!
//! Low-level platform failures (allocation, channel registration, socket
//! delivery) are translated into one of these kinds and returned to the
//! immediate caller.  Nothing in foohid panics to signal an error.

use thiserror::Error;

/// Errors returned by device, endpoint, and factory operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HidError {
    /// A caller-supplied argument is out of range (e.g. a channel name that
    /// exceeds the platform's fixed length limit).
    #[error("bad argument: {0}")]
    BadArgument(String),

    /// Copying descriptor or identity bytes for a query response failed.
    #[error("no resources: could not allocate {requested} bytes")]
    NoResources { requested: usize },

    /// A device or channel with this name is already registered.
    ///
    /// This is a soft failure: the existing object is left untouched.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The kernel control namespace refused the channel registration.
    #[error("channel registration failed: {0}")]
    RegistrationFailure(String),

    /// No device with this name is known to the factory.
    #[error("device not found: {0}")]
    NotFound(String),

    /// The platform has no connected peer for the requested unit.
    #[error("no peer connected on unit {0}")]
    NotConnected(u32),

    /// A peer is already connected; only one peer per channel is supported.
    #[error("channel {0} already has a connected peer")]
    ChannelBusy(String),
}

impl HidError {
    /// Returns `true` for failures that callers may log and continue past.
    ///
    /// Re-issuing a creation call for an existing device is the only soft
    /// failure; the demonstration peer reports it as "may be fine if created
    /// previously" and carries on.
    pub fn is_soft(&self) -> bool {
        matches!(self, HidError::AlreadyExists(_))
    }
}
