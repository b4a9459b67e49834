//! Binary codec for service calls.
//!
//! Wire format:
//! ```text
//! [selector:1][body:N]
//! ```
//! The body is the `bincode` encoding of the call's payload; `List` has an
//! empty body.  Trailing bytes after a complete body are rejected.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::messages::{CreateDeviceRequest, ServiceCall, ServiceSelector};

/// Errors that can occur while encoding or decoding a service call.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The buffer does not even contain a selector byte.
    #[error("empty service call")]
    Empty,

    /// The selector byte is not a recognized call.
    #[error("unknown service selector: {0}")]
    UnknownSelector(u8),

    /// The body could not be parsed for the given selector.
    #[error("malformed {selector:?} body: {reason}")]
    MalformedBody {
        selector: ServiceSelector,
        reason: String,
    },

    /// The payload could not be serialized.
    #[error("encode failed: {0}")]
    Encode(String),
}

#[derive(Serialize, Deserialize)]
struct DestroyBody {
    name: String,
}

#[derive(Serialize, Deserialize)]
struct SendBody {
    name: String,
    report: Vec<u8>,
}

/// Encodes a [`ServiceCall`] into its wire form.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if serialization fails.
pub fn encode_call(call: &ServiceCall) -> Result<Vec<u8>, ProtocolError> {
    let body = match call {
        ServiceCall::Create(req) => bincode::serialize(req),
        ServiceCall::Destroy { name } => bincode::serialize(&DestroyBody { name: name.clone() }),
        ServiceCall::Send { name, report } => bincode::serialize(&SendBody {
            name: name.clone(),
            report: report.clone(),
        }),
        ServiceCall::List => Ok(Vec::new()),
    }
    .map_err(|e| ProtocolError::Encode(e.to_string()))?;

    let mut buf = Vec::with_capacity(1 + body.len());
    buf.push(call.selector() as u8);
    buf.extend_from_slice(&body);
    Ok(buf)
}

/// Decodes one [`ServiceCall`] from `bytes`.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the selector is unknown or the body is
/// malformed for that selector.
pub fn decode_call(bytes: &[u8]) -> Result<ServiceCall, ProtocolError> {
    let (&raw_selector, body) = bytes.split_first().ok_or(ProtocolError::Empty)?;
    let selector =
        ServiceSelector::try_from(raw_selector).map_err(ProtocolError::UnknownSelector)?;

    match selector {
        ServiceSelector::Create => {
            let req: CreateDeviceRequest = decode_body(selector, body)?;
            Ok(ServiceCall::Create(req))
        }
        ServiceSelector::Destroy => {
            let DestroyBody { name } = decode_body(selector, body)?;
            Ok(ServiceCall::Destroy { name })
        }
        ServiceSelector::Send => {
            let SendBody { name, report } = decode_body(selector, body)?;
            Ok(ServiceCall::Send { name, report })
        }
        ServiceSelector::List => {
            if !body.is_empty() {
                return Err(ProtocolError::MalformedBody {
                    selector,
                    reason: format!("expected empty body, got {} bytes", body.len()),
                });
            }
            Ok(ServiceCall::List)
        }
    }
}

fn decode_body<T>(selector: ServiceSelector, body: &[u8]) -> Result<T, ProtocolError>
where
    T: for<'de> Deserialize<'de> + Serialize,
{
    let value: T = bincode::deserialize(body).map_err(|e| ProtocolError::MalformedBody {
        selector,
        reason: e.to_string(),
    })?;

    let consumed = bincode::serialized_size(&value).map_err(|e| ProtocolError::MalformedBody {
        selector,
        reason: e.to_string(),
    })? as usize;
    if consumed != body.len() {
        return Err(ProtocolError::MalformedBody {
            selector,
            reason: format!("{} trailing bytes", body.len() - consumed),
        });
    }
    Ok(value)
}
