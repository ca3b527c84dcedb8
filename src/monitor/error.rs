//! Error types for the monitor layer.

use crate::network::FetchError;
use thiserror::Error;

/// Error type for change listeners.
///
/// Represents failures in platform-specific event notification APIs.
/// The notifier recovers from these by falling back to polling.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Windows API call failed.
    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    WindowsApi(#[from] windows::core::Error),

    /// The listener stopped unexpectedly.
    ///
    /// The event stream terminated without a shutdown request.
    #[error("Listener stopped unexpectedly")]
    Stopped,
}

/// Error type for monitor operations.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Re-enumerating adapters failed.
    #[error("Failed to fetch adapters: {0}")]
    Fetch(#[from] FetchError),

    /// The change listener failed.
    ///
    /// The notifier continues in polling-only mode.
    #[error("Change listener failed: {0}")]
    ListenerFailed(#[source] ApiError),

    /// The notifier task panicked or was cancelled.
    #[error("Notifier task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
