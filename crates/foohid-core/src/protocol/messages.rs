//! Service-call message types.
//!
//! A privileged user-space process drives the device factory with four
//! calls, each identified by a numeric selector:
//!
//! | Selector | Call      | Effect                                            |
//! |----------|-----------|---------------------------------------------------|
//! | 0        | `Create`  | Build, register, and publish one virtual device   |
//! | 1        | `Destroy` | Stop and remove a device by name                  |
//! | 2        | `Send`    | Inject an input report into a device by name      |
//! | 3        | `List`    | Return the names of all live devices              |

use serde::{Deserialize, Serialize};

use crate::domain::role::DeviceRole;

/// Numeric selector that prefixes every encoded service call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ServiceSelector {
    Create = 0,
    Destroy = 1,
    Send = 2,
    List = 3,
}

impl TryFrom<u8> for ServiceSelector {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ServiceSelector::Create),
            1 => Ok(ServiceSelector::Destroy),
            2 => Ok(ServiceSelector::Send),
            3 => Ok(ServiceSelector::List),
            other => Err(other),
        }
    }
}

/// Inputs of the privileged creation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDeviceRequest {
    /// Unique display name; also the key the factory registers the device under.
    pub name: String,
    /// Opaque HID report descriptor bytes.
    pub descriptor: Vec<u8>,
    pub serial_number: String,
    pub vendor_id: u32,
    pub product_id: u32,
    /// Control channel name; must fit the platform name-length limit.
    pub channel_name: String,
    pub role: DeviceRole,
}

/// One decoded service call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceCall {
    Create(CreateDeviceRequest),
    Destroy { name: String },
    Send { name: String, report: Vec<u8> },
    List,
}

impl ServiceCall {
    pub fn selector(&self) -> ServiceSelector {
        match self {
            ServiceCall::Create(_) => ServiceSelector::Create,
            ServiceCall::Destroy { .. } => ServiceSelector::Destroy,
            ServiceCall::Send { .. } => ServiceSelector::Send,
            ServiceCall::List => ServiceSelector::List,
        }
    }
}

/// Successful outcome of a service call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceReply {
    Done,
    Devices(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_try_from_known_values() {
        assert_eq!(ServiceSelector::try_from(0), Ok(ServiceSelector::Create));
        assert_eq!(ServiceSelector::try_from(3), Ok(ServiceSelector::List));
    }

    #[test]
    fn test_selector_try_from_unknown_returns_raw_byte() {
        assert_eq!(ServiceSelector::try_from(9), Err(9));
    }

    #[test]
    fn test_call_selector_matches_variant() {
        let call = ServiceCall::Send {
            name: "dev".to_string(),
            report: vec![1, 2, 3],
        };
        assert_eq!(call.selector(), ServiceSelector::Send);
        assert_eq!(ServiceCall::List.selector() as u8, 3);
    }
}
