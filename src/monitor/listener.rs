//! Change listener trait for platform event notifications.
//!
//! This module provides the [`ChangeListener`] trait that abstracts
//! platform-specific notification mechanisms for adapter changes.

use super::{ApiError, NetworkEvent};
use tokio_stream::Stream;

/// Trait for platform-specific network change notification APIs.
///
/// Implementations wrap platform APIs like Windows `NotifyIpInterfaceChange`
/// and turn their callbacks into an async event stream.
///
/// # One-time Semantics
///
/// The `into_stream` method consumes `self`. If the underlying API fails,
/// callers fall back to polling rather than recreating the listener.
///
/// # Stream Items
///
/// - `Ok(event)` - Something changed; the caller re-enumerates adapters
/// - `Err(ApiError)` - The listener failed; the caller degrades to polling-only
///
/// Dropping the stream unregisters every OS callback it owns.
pub trait ChangeListener: Send {
    /// The stream type returned by `into_stream`.
    type Stream: Stream<Item = Result<NetworkEvent, ApiError>> + Send + Unpin;

    /// Registers with the OS and converts this listener into an event stream.
    fn into_stream(self) -> Self::Stream;
}
