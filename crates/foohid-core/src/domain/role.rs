//! Device role hint.

use serde::{Deserialize, Serialize};

/// Which kind of device the OS should treat the virtual device as by default.
///
/// Fixed at construction.  The role only changes a hint property; it never
/// alters how reports are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceRole {
    #[default]
    Generic,
    Mouse,
    Keyboard,
}

impl DeviceRole {
    /// Value of the `HIDDefaultBehavior` hint, if the role sets one.
    pub fn default_behavior(self) -> Option<&'static str> {
        match self {
            DeviceRole::Generic => None,
            DeviceRole::Mouse => Some("Mouse"),
            DeviceRole::Keyboard => Some("Keyboard"),
        }
    }
}
