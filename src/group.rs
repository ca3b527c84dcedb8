//! Facade tying enumeration, classification and the registry together.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::hardware::{AdapterHardware, HardwareFactory, SettingsStore};
use crate::monitor::{MonitorError, RefreshTarget};
use crate::network::classify::PhysicalPolicy;
use crate::network::{AdapterFetcher, FetchError, SnapshotProvider};
use crate::registry::{AdapterObserver, AdapterRegistry, AdapterSet, ReconcileReport};

/// The monitored group of network adapters.
///
/// Owns a [`SnapshotProvider`] and an [`AdapterRegistry`]; each
/// [`refresh`](Self::refresh) takes a snapshot and reconciles it.
pub struct NetworkGroup<F, P, H: AdapterHardware + 'static> {
    provider: SnapshotProvider<F, P>,
    registry: AdapterRegistry<H>,
    physical_only: bool,
}

impl<F, P, H> NetworkGroup<F, P, H>
where
    F: AdapterFetcher,
    P: PhysicalPolicy,
    H: AdapterHardware + 'static,
{
    /// Creates the group and performs the first refresh.
    ///
    /// A failed first refresh is logged; the group starts empty and picks
    /// adapters up on the next refresh.
    pub fn new(
        provider: SnapshotProvider<F, P>,
        factory: Arc<dyn HardwareFactory<Hardware = H>>,
        settings: Arc<dyn SettingsStore>,
        physical_only: bool,
    ) -> Self {
        Self::with_observers(provider, factory, settings, physical_only, Vec::new())
    }

    /// Like [`new`](Self::new), registering observers before the first refresh
    /// so they see the initial additions.
    pub fn with_observers(
        provider: SnapshotProvider<F, P>,
        factory: Arc<dyn HardwareFactory<Hardware = H>>,
        settings: Arc<dyn SettingsStore>,
        physical_only: bool,
        observers: Vec<Arc<dyn AdapterObserver<H>>>,
    ) -> Self {
        let group = Self::assemble(provider, factory, settings, physical_only, observers);
        if let Err(error) = group.refresh() {
            tracing::error!(error = %error, "Initial adapter enumeration failed");
        }
        group
    }

    /// Like [`with_observers`](Self::with_observers), but a failed first
    /// refresh is returned instead of logged.
    ///
    /// # Errors
    ///
    /// Returns the fetch error of the initial refresh.
    pub fn try_new(
        provider: SnapshotProvider<F, P>,
        factory: Arc<dyn HardwareFactory<Hardware = H>>,
        settings: Arc<dyn SettingsStore>,
        physical_only: bool,
        observers: Vec<Arc<dyn AdapterObserver<H>>>,
    ) -> Result<Self, FetchError> {
        let group = Self::assemble(provider, factory, settings, physical_only, observers);
        group.refresh()?;
        Ok(group)
    }

    fn assemble(
        provider: SnapshotProvider<F, P>,
        factory: Arc<dyn HardwareFactory<Hardware = H>>,
        settings: Arc<dyn SettingsStore>,
        physical_only: bool,
        observers: Vec<Arc<dyn AdapterObserver<H>>>,
    ) -> Self {
        let registry = observers
            .into_iter()
            .fold(AdapterRegistry::new(factory, settings), AdapterRegistry::with_observer);
        Self {
            provider,
            registry,
            physical_only,
        }
    }

    /// Takes a fresh snapshot and reconciles the registry against it.
    ///
    /// If every attempt hit a transient failure the returned report is
    /// `skipped` and nothing changed.
    ///
    /// # Errors
    ///
    /// Returns the fetch error for non-transient failures. State is untouched.
    pub fn refresh(&self) -> Result<ReconcileReport<H>, FetchError> {
        let snapshot = self.provider.snapshot(self.physical_only)?;
        Ok(self.registry.reconcile(snapshot))
    }

    /// The currently tracked adapters.
    pub fn adapters(&self) -> Arc<AdapterSet<H>> {
        self.registry.adapters()
    }

    /// The underlying registry.
    pub const fn registry(&self) -> &AdapterRegistry<H> {
        &self.registry
    }

    /// Whether only physical adapters are tracked.
    pub const fn physical_only(&self) -> bool {
        self.physical_only
    }

    /// Multi-line plain-text report of every tracked adapter.
    pub fn report(&self) -> String {
        let adapters = self.adapters();
        let mut out = String::new();

        let _ = writeln!(
            out,
            "Network adapters: {} tracked ({}, policy {})",
            adapters.len(),
            if self.physical_only { "physical only" } else { "all eligible" },
            self.provider.policy().name(),
        );

        for adapter in adapters.iter() {
            let descriptor = adapter.descriptor();
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", descriptor.display_name());
            let _ = writeln!(out, "  Id:     {}", descriptor.id);
            let _ = writeln!(out, "  Status: {}", descriptor.status);
            let _ = writeln!(out, "  Type:   {}", descriptor.if_type);
            for sensor in adapter.hardware().sensors() {
                let _ = writeln!(out, "  {sensor}");
            }
        }

        out
    }

    /// Releases every tracked adapter. Returns how many were released.
    pub fn close(&self) -> usize {
        self.registry.clear()
    }
}

impl<F, P, H> RefreshTarget for NetworkGroup<F, P, H>
where
    F: AdapterFetcher + 'static,
    P: PhysicalPolicy + 'static,
    H: AdapterHardware + 'static,
{
    fn refresh(&self) -> Result<(), MonitorError> {
        let report = Self::refresh(self)?;
        if report.skipped {
            tracing::debug!("Adapter snapshot unavailable, will retry on next trigger");
        }
        Ok(())
    }
}

impl<F, P, H: AdapterHardware + 'static> std::fmt::Debug for NetworkGroup<F, P, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkGroup")
            .field("physical_only", &self.physical_only)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "group_tests.rs"]
mod tests;
