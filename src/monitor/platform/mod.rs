//! Platform-specific change listener implementations.
//!
//! # Platform Support
//!
//! - **Windows**: `NotifyUnicastIpAddressChange` and `NotifyIpInterfaceChange`
//!   via the `windows` crate.
//! - **Other**: no listener; the notifier runs polling-only.

#[cfg(windows)]
mod windows;

#[cfg(windows)]
pub use windows::{WindowsChangeListener, WindowsChangeStream};

// Re-export platform-specific listener as PlatformListener for convenience
#[cfg(windows)]
pub use windows::WindowsChangeListener as PlatformListener;
