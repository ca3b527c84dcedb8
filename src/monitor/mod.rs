//! Monitor layer for reacting to network configuration changes.
//!
//! This module provides types and functions for:
//! - Representing change notifications ([`NetworkEvent`])
//! - Platform notification APIs ([`ChangeListener`], [`platform`])
//! - Driving refreshes from events and polling ([`ChangeNotifier`], [`RefreshTarget`])
//! - Error handling ([`MonitorError`], [`ApiError`])

mod error;
mod event;
mod listener;
mod notifier;
pub mod platform;

pub use error::{ApiError, MonitorError};
pub use event::NetworkEvent;
pub use listener::ChangeListener;
pub use notifier::{ChangeNotifier, RefreshTarget};
