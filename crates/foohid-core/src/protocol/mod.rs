//! Service-call protocol: message types and the binary codec.

pub mod codec;
pub mod messages;

pub use codec::{decode_call, encode_call, ProtocolError};
pub use messages::*;
