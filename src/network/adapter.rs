//! Core network types for adapter representation.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable, OS-assigned adapter identifier.
///
/// On Windows this is the adapter name (a GUID string such as
/// `{4D36E972-E325-11CE-BFC1-08002BE10318}`); on Linux it is the kernel
/// interface name. The value is opaque: two descriptors refer to the same
/// adapter if and only if their identifiers are equal, regardless of
/// friendly name or description.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdapterId(String);

impl AdapterId {
    /// Creates an identifier from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AdapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for AdapterId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AdapterId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for AdapterId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Interface type tag reported by the OS.
///
/// Mirrors the IANA `ifType` values the platform APIs expose. Codes without
/// a dedicated variant are preserved in [`InterfaceType::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterfaceType {
    /// Ethernet (`ethernetCsmacd`, 6).
    Ethernet,
    /// IEEE 802.11 wireless (71).
    Wireless,
    /// Software loopback (24).
    Loopback,
    /// Encapsulation tunnel (131).
    Tunnel,
    /// Point-to-point protocol (23).
    Ppp,
    /// Proprietary virtual/internal interface (53), used by TAP/TUN drivers.
    PropVirtual,
    /// The OS could not determine the type.
    Unknown,
    /// Any other type, preserving the original code.
    Other(u32),
}

impl InterfaceType {
    /// IANA `ifType` code for Ethernet.
    pub const ETHERNET_CODE: u32 = 6;
    /// IANA `ifType` code for PPP.
    pub const PPP_CODE: u32 = 23;
    /// IANA `ifType` code for software loopback.
    pub const LOOPBACK_CODE: u32 = 24;
    /// IANA `ifType` code for proprietary virtual interfaces.
    pub const PROP_VIRTUAL_CODE: u32 = 53;
    /// IANA `ifType` code for IEEE 802.11.
    pub const WIRELESS_CODE: u32 = 71;
    /// IANA `ifType` code for tunnels.
    pub const TUNNEL_CODE: u32 = 131;

    /// Maps an IANA `ifType` code to an interface type.
    ///
    /// `other(1)` is treated as [`InterfaceType::Unknown`].
    #[must_use]
    pub const fn from_code(code: u32) -> Self {
        match code {
            0 | 1 => Self::Unknown,
            Self::ETHERNET_CODE => Self::Ethernet,
            Self::PPP_CODE => Self::Ppp,
            Self::LOOPBACK_CODE => Self::Loopback,
            Self::PROP_VIRTUAL_CODE => Self::PropVirtual,
            Self::WIRELESS_CODE => Self::Wireless,
            Self::TUNNEL_CODE => Self::Tunnel,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ethernet => write!(f, "Ethernet"),
            Self::Wireless => write!(f, "Wireless"),
            Self::Loopback => write!(f, "Loopback"),
            Self::Tunnel => write!(f, "Tunnel"),
            Self::Ppp => write!(f, "PPP"),
            Self::PropVirtual => write!(f, "Proprietary virtual"),
            Self::Unknown => write!(f, "Unknown"),
            Self::Other(code) => write!(f, "Other({code})"),
        }
    }
}

/// Operational status of an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperStatus {
    /// The adapter can pass packets.
    Up,
    /// The adapter cannot pass packets.
    Down,
    /// Status not reported or not recognized.
    Unknown,
}

impl fmt::Display for OperStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "Up"),
            Self::Down => write!(f, "Down"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Metadata the OS reports for a single network adapter.
///
/// # Equality
///
/// Equality compares every field. Registry identity only uses [`Self::id`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterDescriptor {
    /// Stable OS-assigned identifier.
    pub id: AdapterId,
    /// Friendly name (e.g., "Ethernet", "Wi-Fi"). Empty when unavailable.
    pub name: String,
    /// Driver-supplied description. Empty when unavailable.
    pub description: String,
    /// Interface type tag.
    pub if_type: InterfaceType,
    /// Operational status.
    pub status: OperStatus,
    /// IPv4 binding interface index.
    ///
    /// `None` means IPv4 is not bound, which is how filter-layer
    /// pseudo-adapters show up.
    pub ipv4_index: Option<u32>,
}

impl AdapterDescriptor {
    /// Creates a descriptor that is up and has no IPv4 binding.
    ///
    /// Use the `with_*` builders to fill in the remaining metadata.
    #[must_use]
    pub fn new(id: impl Into<AdapterId>, name: impl Into<String>, if_type: InterfaceType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            if_type,
            status: OperStatus::Up,
            ipv4_index: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the operational status.
    #[must_use]
    pub const fn with_status(mut self, status: OperStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the IPv4 binding index.
    #[must_use]
    pub const fn with_ipv4_index(mut self, index: Option<u32>) -> Self {
        self.ipv4_index = index;
        self
    }

    /// Returns the description, or the name when the description is empty.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.description.is_empty() {
            &self.name
        } else {
            &self.description
        }
    }

    /// Returns true if IPv4 is bound to this adapter.
    #[must_use]
    pub const fn has_ipv4_binding(&self) -> bool {
        self.ipv4_index.is_some()
    }
}
