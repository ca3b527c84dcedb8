//! nicwatch: live, classified inventory of network adapters
//!
//! A library for enumerating the host's network adapters, classifying
//! physical hardware apart from virtual, filter and VPN pseudo-adapters, and
//! keeping a reconciled registry of per-adapter hardware objects up to date
//! as the OS reports changes.

pub mod config;
pub mod group;
pub mod hardware;
pub mod monitor;
pub mod network;
pub mod registry;
