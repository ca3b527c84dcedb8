//! Seam to the per-adapter sensor subsystem.
//!
//! The registry never computes sensor values. It asks a [`HardwareFactory`]
//! for one [`AdapterHardware`] object per tracked adapter, reads its sensors
//! for reporting, and closes it when the adapter disappears.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;

use crate::network::AdapterDescriptor;

/// A single sensor reading exposed by adapter hardware.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sensor {
    /// Display name, e.g. "Upload Speed".
    pub name: String,
    /// Current value, `None` when not yet sampled.
    pub value: Option<f64>,
    /// Unit suffix, e.g. "B/s". May be empty.
    pub unit: String,
}

impl Sensor {
    /// Creates a sensor reading.
    pub fn new(name: impl Into<String>, value: Option<f64>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            unit: unit.into(),
        }
    }
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(value) if self.unit.is_empty() => write!(f, "{}: {value}", self.name),
            Some(value) => write!(f, "{}: {value} {}", self.name, self.unit),
            None => write!(f, "{}: -", self.name),
        }
    }
}

/// Live hardware object bound to one adapter.
pub trait AdapterHardware: Send + Sync {
    /// Current sensor readings.
    fn sensors(&self) -> Vec<Sensor>;

    /// Releases resources. Called exactly once, after eviction.
    fn close(&self);
}

/// Creates hardware objects for newly seen adapters.
pub trait HardwareFactory: Send + Sync {
    /// The hardware type produced.
    type Hardware: AdapterHardware;

    /// Builds the hardware object for `descriptor`.
    fn create(
        &self,
        descriptor: &AdapterDescriptor,
        settings: Arc<dyn SettingsStore>,
    ) -> Self::Hardware;
}

/// Key/value settings persistence shared by all adapter hardware.
pub trait SettingsStore: Send + Sync {
    /// Returns the stored value for `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`.
    fn set(&self, key: &str, value: &str);
}

/// In-memory [`SettingsStore`]. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySettings {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }
}

/// Hardware stand-in that tracks an adapter without sampling it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassiveHardware {
    descriptor: AdapterDescriptor,
}

impl PassiveHardware {
    /// The descriptor this hardware was created for.
    #[must_use]
    pub const fn descriptor(&self) -> &AdapterDescriptor {
        &self.descriptor
    }
}

impl AdapterHardware for PassiveHardware {
    fn sensors(&self) -> Vec<Sensor> {
        Vec::new()
    }

    fn close(&self) {
        tracing::trace!(adapter = %self.descriptor.id, "Closed passive hardware");
    }
}

/// Factory for [`PassiveHardware`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PassiveFactory;

impl HardwareFactory for PassiveFactory {
    type Hardware = PassiveHardware;

    fn create(
        &self,
        descriptor: &AdapterDescriptor,
        _settings: Arc<dyn SettingsStore>,
    ) -> PassiveHardware {
        PassiveHardware {
            descriptor: descriptor.clone(),
        }
    }
}
