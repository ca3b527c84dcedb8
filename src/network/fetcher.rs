//! Adapter enumeration trait and error types.

use std::path::PathBuf;

use super::AdapterDescriptor;
use thiserror::Error;

/// Error type for adapter enumeration.
///
/// Describes what went wrong without dictating recovery strategy.
/// [`FetchError::is_transient`] tells the snapshot provider which
/// failures are worth retrying.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Windows API call failed.
    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    WindowsApi(#[from] windows::core::Error),

    /// Reading an interface attribute failed.
    #[error("Failed to read '{}': {source}", path.display())]
    Io {
        /// Attribute path that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The network stack was reconfigured mid-call; retrying should succeed.
    #[error("Transient enumeration failure: {message}")]
    Transient {
        /// Description of the transient condition.
        message: String,
    },

    /// Permission denied to access network information.
    #[error("Permission denied: {context}")]
    PermissionDenied {
        /// Additional context about what permission was denied.
        context: String,
    },

    /// Platform-specific error with a generic message.
    #[error("Platform error: {message}")]
    Platform {
        /// Error message describing the platform-specific failure.
        message: String,
    },
}

impl FetchError {
    /// Creates a [`FetchError::Transient`].
    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    /// Returns true if the failure is expected to clear on retry.
    ///
    /// On Windows, `GetAdaptersAddresses` reports "the pipe is being closed"
    /// style errors while the stack is reconfigured (for example when IPv4 is
    /// disabled on an adapter during enumeration).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transient { .. } => true,
            #[cfg(windows)]
            Self::WindowsApi(error) => is_transient_win32(error),
            Self::Io { .. } | Self::PermissionDenied { .. } | Self::Platform { .. } => false,
        }
    }
}

#[cfg(windows)]
fn is_transient_win32(error: &windows::core::Error) -> bool {
    use windows::Win32::Foundation::{
        ERROR_BROKEN_PIPE, ERROR_NO_DATA, ERROR_PIPE_NOT_CONNECTED, WIN32_ERROR,
    };

    [ERROR_NO_DATA, ERROR_BROKEN_PIPE, ERROR_PIPE_NOT_CONNECTED]
        .into_iter()
        .any(|code: WIN32_ERROR| error.code() == code.to_hresult())
}

/// Trait for enumerating the network adapters visible to the OS.
///
/// # Design
///
/// - All external dependencies should implement this trait
/// - Enables dependency injection for testing with mock implementations
/// - Platform-specific implementations provided in [`super::platform`]
///
/// # Example
///
/// ```ignore
/// use nicwatch::network::{AdapterDescriptor, AdapterFetcher, FetchError};
///
/// struct MockFetcher {
///     snapshots: Vec<Vec<AdapterDescriptor>>,
///     call_count: std::sync::atomic::AtomicUsize,
/// }
///
/// impl AdapterFetcher for MockFetcher {
///     fn fetch(&self) -> Result<Vec<AdapterDescriptor>, FetchError> {
///         let idx = self.call_count.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
///         Ok(self.snapshots.get(idx).cloned().unwrap_or_default())
///     }
/// }
/// ```
pub trait AdapterFetcher: Send + Sync {
    /// Fetches the current set of network adapters.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when:
    /// - Platform API calls fail (e.g., `FetchError::WindowsApi` on Windows)
    /// - The stack is mid-reconfiguration (`FetchError::Transient`, or a
    ///   platform error for which [`FetchError::is_transient`] holds)
    /// - Insufficient permissions to access network information (`FetchError::PermissionDenied`)
    /// - Other platform-specific failures (`FetchError::Platform`)
    ///
    /// # Implementation Notes
    ///
    /// - Implementations should return ALL adapters; filtering is done by the caller
    /// - Metadata that cannot be read is reported as empty, never as an error
    /// - This is a synchronous operation
    fn fetch(&self) -> Result<Vec<AdapterDescriptor>, FetchError>;
}

impl<T: AdapterFetcher + ?Sized> AdapterFetcher for &T {
    fn fetch(&self) -> Result<Vec<AdapterDescriptor>, FetchError> {
        (*self).fetch()
    }
}

impl<T: AdapterFetcher + ?Sized> AdapterFetcher for std::sync::Arc<T> {
    fn fetch(&self) -> Result<Vec<AdapterDescriptor>, FetchError> {
        self.as_ref().fetch()
    }
}
