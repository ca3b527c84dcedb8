//! Platform-specific adapter fetcher implementations.
//!
//! This module provides conditional compilation for platform-specific
//! implementations of the [`AdapterFetcher`](super::AdapterFetcher) trait.
//!
//! # Platform Support
//!
//! - **Windows**: Uses `GetAdaptersAddresses` API via the `windows` crate.
//! - **Linux**: Reads `/sys/class/net` and `/proc/sys/net/ipv4/conf`.
//! - **Other**: [`UnsupportedFetcher`] reports a platform error.

#[cfg(windows)]
mod windows;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(windows)]
pub use windows::WindowsFetcher;

#[cfg(target_os = "linux")]
pub use linux::SysfsFetcher;

// Re-export platform-specific fetcher as PlatformFetcher for convenience
#[cfg(windows)]
pub use windows::WindowsFetcher as PlatformFetcher;

#[cfg(target_os = "linux")]
pub use linux::SysfsFetcher as PlatformFetcher;

#[cfg(not(any(windows, target_os = "linux")))]
pub use unsupported::UnsupportedFetcher as PlatformFetcher;

#[cfg(not(any(windows, target_os = "linux")))]
pub use unsupported::UnsupportedFetcher;

#[cfg(not(any(windows, target_os = "linux")))]
mod unsupported {
    use crate::network::{AdapterDescriptor, AdapterFetcher, FetchError};

    /// Fetcher for platforms without an enumeration backend.
    #[derive(Debug, Clone, Default)]
    pub struct UnsupportedFetcher;

    impl UnsupportedFetcher {
        /// Creates the fetcher.
        #[must_use]
        pub const fn new() -> Self {
            Self
        }
    }

    impl AdapterFetcher for UnsupportedFetcher {
        fn fetch(&self) -> Result<Vec<AdapterDescriptor>, FetchError> {
            Err(FetchError::Platform {
                message: "adapter enumeration is not supported on this platform".to_string(),
            })
        }
    }
}
