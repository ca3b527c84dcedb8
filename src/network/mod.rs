//! Network layer for enumerating and classifying adapters.
//!
//! This module provides types and traits for:
//! - Representing adapter metadata ([`AdapterDescriptor`], [`AdapterId`])
//! - Interface type and status tags ([`InterfaceType`], [`OperStatus`])
//! - Fetching adapters from the OS ([`AdapterFetcher`], [`platform`])
//! - Classifying adapters ([`classify`])
//! - Producing filtered, ordered snapshots with retry ([`SnapshotProvider`])

mod adapter;
pub mod classify;
mod fetcher;
pub mod platform;
mod snapshot;

pub use adapter::{AdapterDescriptor, AdapterId, InterfaceType, OperStatus};
pub use fetcher::{AdapterFetcher, FetchError};
pub use snapshot::{MAX_ATTEMPTS, SnapshotProvider};
