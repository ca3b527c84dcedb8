//! Network change events delivered by listeners.

use std::fmt;

/// Kind of OS notification that triggered a refresh.
///
/// Both kinds are handled identically: the adapter list is re-enumerated
/// and reconciled. The distinction is kept for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkEvent {
    /// A unicast address was added, removed or changed.
    AddressChanged,
    /// An interface appeared, disappeared or changed parameters.
    AvailabilityChanged,
}

impl fmt::Display for NetworkEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddressChanged => write!(f, "address changed"),
            Self::AvailabilityChanged => write!(f, "availability changed"),
        }
    }
}
