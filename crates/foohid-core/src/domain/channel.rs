//! Control channel naming.
//!
//! A control channel is published in the kernel control namespace under a
//! bounded-length name (conventionally reverse-DNS, e.g.
//! `it.unbit.foohid.u2f`).  The platform stores names in a fixed-size,
//! NUL-terminated buffer of [`MAX_CHANNEL_NAME_LEN`] bytes, so the longest
//! accepted name is one byte shorter than the limit.

use std::fmt;

use crate::error::HidError;

/// Size of the platform's name buffer, terminator included.
pub const MAX_CHANNEL_NAME_LEN: usize = 96;

/// A channel name that is known to fit the platform's name buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelName(String);

impl ChannelName {
    /// Validates `name` against the platform length limit.
    ///
    /// # Errors
    ///
    /// Returns [`HidError::BadArgument`] if `name` plus its terminator does not
    /// fit in [`MAX_CHANNEL_NAME_LEN`] bytes, or if `name` is empty or contains
    /// an interior NUL.
    pub fn new(name: impl Into<String>) -> Result<Self, HidError> {
        let name = name.into();
        if name.is_empty() {
            return Err(HidError::BadArgument("channel name is empty".to_string()));
        }
        if name.contains('\0') {
            return Err(HidError::BadArgument(
                "channel name contains a NUL byte".to_string(),
            ));
        }
        if name.len() + 1 > MAX_CHANNEL_NAME_LEN {
            return Err(HidError::BadArgument(format!(
                "channel name is {} bytes; limit is {} including terminator",
                name.len(),
                MAX_CHANNEL_NAME_LEN
            )));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier the control namespace assigns to a registered channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub u32);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
